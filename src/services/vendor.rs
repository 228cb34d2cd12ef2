//! Vendor service
//!
//! CRUD over sourcing vendors. Vendor names are unique ignoring case,
//! phone numbers are normalized to their last ten digits, and deleting a
//! vendor detaches it from any wishlist items that referenced it.

use crate::db::repositories::{
    is_unique_violation, VendorRepository, WishlistRepository,
};
use crate::models::{EntityType, Vendor};
use crate::services::tag::{TagService, TagServiceError};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Error types for vendor service operations
#[derive(Debug, thiserror::Error)]
pub enum VendorServiceError {
    /// Vendor not found
    #[error("Vendor not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Vendor name already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Error from the tag subsystem
    #[error(transparent)]
    Tag(#[from] TagServiceError),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Fields accepted when registering a vendor
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVendorInput {
    pub name: String,
    pub website_url: Option<String>,
    pub whatsapp_link: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub catalog_urls: Vec<String>,
    pub lead_time_days: Option<i64>,
    pub moq_units: Option<i64>,
    pub payment_terms: Option<String>,
    pub rating: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVendorInput {
    pub name: Option<String>,
    pub website_url: Option<String>,
    pub whatsapp_link: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub catalog_urls: Option<Vec<String>>,
    pub lead_time_days: Option<i64>,
    pub moq_units: Option<i64>,
    pub payment_terms: Option<String>,
    pub rating: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
}

/// Vendor service
pub struct VendorService {
    repo: Arc<dyn VendorRepository>,
    wishlist: Arc<dyn WishlistRepository>,
    tags: Arc<TagService>,
}

impl VendorService {
    /// Create a new vendor service
    pub fn new(
        repo: Arc<dyn VendorRepository>,
        wishlist: Arc<dyn WishlistRepository>,
        tags: Arc<TagService>,
    ) -> Self {
        Self {
            repo,
            wishlist,
            tags,
        }
    }

    fn check_rating(rating: Option<i64>) -> Result<(), VendorServiceError> {
        if let Some(rating) = rating {
            if !(1..=5).contains(&rating) {
                return Err(VendorServiceError::ValidationError(
                    "rating must be between 1 and 5".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Register a vendor
    pub async fn create(&self, input: CreateVendorInput) -> Result<Vendor, VendorServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(VendorServiceError::ValidationError(
                "Vendor name cannot be empty".to_string(),
            ));
        }
        Self::check_rating(input.rating)?;

        if self
            .repo
            .get_by_name(&name)
            .await
            .context("Failed to check vendor name")?
            .is_some()
        {
            return Err(VendorServiceError::Conflict(format!(
                "Vendor already exists: {}",
                name
            )));
        }

        let tags = self.tags.resolve_tag_list(&input.tags).await?;

        let mut vendor = Vendor::new(name);
        vendor.website_url = input.website_url;
        vendor.whatsapp_link = input.whatsapp_link;
        vendor.email = input.email;
        vendor.phone = normalize_phone(input.phone.as_deref())?;
        vendor.city = input.city;
        vendor.country = input.country;
        vendor.catalog_urls = input.catalog_urls;
        vendor.lead_time_days = input.lead_time_days;
        vendor.moq_units = input.moq_units;
        vendor.payment_terms = input.payment_terms;
        vendor.rating = input.rating;
        vendor.tags = tags.clone();
        vendor.notes = input.notes;

        let created = match self.repo.create(&vendor).await {
            Ok(created) => created,
            // The nocase unique index catches races past the pre-check
            Err(err) if is_unique_violation(&err) => {
                return Err(VendorServiceError::Conflict(format!(
                    "Vendor already exists: {}",
                    vendor.name
                )))
            }
            Err(err) => return Err(err.into()),
        };

        self.tags
            .sync_index(EntityType::Vendor, &created.vendor_id, &[], &tags)
            .await?;

        Ok(created)
    }

    /// Get a vendor by id
    pub async fn get(&self, vendor_id: &str) -> Result<Vendor, VendorServiceError> {
        self.repo
            .get(vendor_id)
            .await
            .context("Failed to get vendor")?
            .ok_or_else(|| VendorServiceError::NotFound(vendor_id.to_string()))
    }

    /// List all vendors, most recently updated first
    pub async fn list(&self) -> Result<Vec<Vendor>, VendorServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list vendors")
            .map_err(Into::into)
    }

    /// Update a vendor
    pub async fn update(
        &self,
        vendor_id: &str,
        input: UpdateVendorInput,
    ) -> Result<Vendor, VendorServiceError> {
        let mut vendor = self.get(vendor_id).await?;
        let prev_tags = vendor.tags.clone();

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(VendorServiceError::ValidationError(
                    "Vendor name cannot be empty".to_string(),
                ));
            }
            if let Some(other) = self
                .repo
                .get_by_name(&name)
                .await
                .context("Failed to check vendor name")?
            {
                if other.vendor_id != vendor.vendor_id {
                    return Err(VendorServiceError::Conflict(format!(
                        "Vendor already exists: {}",
                        name
                    )));
                }
            }
            vendor.name = name;
        }
        if input.website_url.is_some() {
            vendor.website_url = input.website_url;
        }
        if input.whatsapp_link.is_some() {
            vendor.whatsapp_link = input.whatsapp_link;
        }
        if input.email.is_some() {
            vendor.email = input.email;
        }
        if input.phone.is_some() {
            vendor.phone = normalize_phone(input.phone.as_deref())?;
        }
        if input.city.is_some() {
            vendor.city = input.city;
        }
        if input.country.is_some() {
            vendor.country = input.country;
        }
        if let Some(catalog_urls) = input.catalog_urls {
            vendor.catalog_urls = catalog_urls;
        }
        if input.lead_time_days.is_some() {
            vendor.lead_time_days = input.lead_time_days;
        }
        if input.moq_units.is_some() {
            vendor.moq_units = input.moq_units;
        }
        if input.payment_terms.is_some() {
            vendor.payment_terms = input.payment_terms;
        }
        if input.rating.is_some() {
            Self::check_rating(input.rating)?;
            vendor.rating = input.rating;
        }
        if let Some(raw_tags) = input.tags {
            vendor.tags = self.tags.resolve_tag_list(&raw_tags).await?;
        }
        if input.notes.is_some() {
            vendor.notes = input.notes;
        }

        let updated = self
            .repo
            .update(&vendor)
            .await
            .context("Failed to update vendor")?;

        self.tags
            .sync_index(
                EntityType::Vendor,
                &updated.vendor_id,
                &prev_tags,
                &updated.tags,
            )
            .await?;

        Ok(updated)
    }

    /// Delete a vendor, detaching it from wishlist items and dropping its
    /// tag assignments
    pub async fn delete(&self, vendor_id: &str) -> Result<(), VendorServiceError> {
        let deleted = self
            .repo
            .delete(vendor_id)
            .await
            .context("Failed to delete vendor")?;
        if !deleted {
            return Err(VendorServiceError::NotFound(vendor_id.to_string()));
        }
        self.wishlist
            .detach_vendor(vendor_id)
            .await
            .context("Failed to detach vendor from wishlist")?;
        self.tags.clear_entity(EntityType::Vendor, vendor_id).await?;
        Ok(())
    }
}

/// Normalize a phone number to its last ten digits.
///
/// Empty or absent input stays absent; input with fewer than ten digits
/// is rejected.
fn normalize_phone(phone: Option<&str>) -> Result<Option<String>, VendorServiceError> {
    let Some(phone) = phone else {
        return Ok(None);
    };
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() && phone.trim().is_empty() {
        return Ok(None);
    }
    if digits.len() < 10 {
        return Err(VendorServiceError::ValidationError(
            "Phone number must contain at least 10 digits".to_string(),
        ));
    }
    Ok(Some(digits[digits.len() - 10..].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxTagIndexRepository, SqlxTagRepository, SqlxVendorRepository, SqlxWishlistRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::WishlistItem;
    use sqlx::SqlitePool;

    async fn setup_test_service() -> (SqlitePool, Arc<TagService>, VendorService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let tags = Arc::new(TagService::new(
            SqlxTagRepository::boxed(pool.clone()),
            SqlxTagIndexRepository::boxed(pool.clone()),
        ));
        let service = VendorService::new(
            SqlxVendorRepository::boxed(pool.clone()),
            SqlxWishlistRepository::boxed(pool.clone()),
            tags.clone(),
        );
        (pool, tags, service)
    }

    fn sample_input(name: &str) -> CreateVendorInput {
        CreateVendorInput {
            name: name.to_string(),
            website_url: None,
            whatsapp_link: None,
            email: None,
            phone: Some("+91 98765-43210".to_string()),
            city: Some("Jaipur".to_string()),
            country: Some("IN".to_string()),
            catalog_urls: vec![],
            lead_time_days: Some(14),
            moq_units: Some(50),
            payment_terms: None,
            rating: Some(4),
            tags: vec!["Kundan".to_string()],
            notes: None,
        }
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(
            normalize_phone(Some("+91 98765-43210")).unwrap(),
            Some("9876543210".to_string())
        );
        assert_eq!(normalize_phone(None).unwrap(), None);
        assert_eq!(normalize_phone(Some("   ")).unwrap(), None);
        assert!(normalize_phone(Some("12345")).is_err());
    }

    #[tokio::test]
    async fn test_create_normalizes_phone_and_indexes_tags() {
        let (_pool, tags, service) = setup_test_service().await;

        let vendor = service
            .create(sample_input("Gem Source"))
            .await
            .expect("Create failed");

        assert_eq!(vendor.phone, Some("9876543210".to_string()));
        assert_eq!(vendor.tags, vec!["kundan".to_string()]);
        let summary = tags.get("kundan").await.expect("Get tag failed");
        assert_eq!(summary.usage_count, 1);
    }

    #[tokio::test]
    async fn test_create_name_unique_ignoring_case() {
        let (_pool, _tags, service) = setup_test_service().await;

        service
            .create(sample_input("Gem Source"))
            .await
            .expect("Create failed");
        let err = service
            .create(sample_input("GEM SOURCE"))
            .await
            .expect_err("Duplicate name should conflict");
        assert!(matches!(err, VendorServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_name_collision() {
        let (_pool, _tags, service) = setup_test_service().await;

        service
            .create(sample_input("Gem Source"))
            .await
            .expect("Create failed");
        let second = service
            .create(sample_input("Bead Bazaar"))
            .await
            .expect("Create failed");

        let err = service
            .update(
                &second.vendor_id,
                UpdateVendorInput {
                    name: Some("gem source".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect_err("Name collision should conflict");
        assert!(matches!(err, VendorServiceError::Conflict(_)));

        // Renaming to a different casing of its own name is fine
        let renamed = service
            .update(
                &second.vendor_id,
                UpdateVendorInput {
                    name: Some("BEAD BAZAAR".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("Self-rename should succeed");
        assert_eq!(renamed.name, "BEAD BAZAAR");
    }

    #[tokio::test]
    async fn test_create_validates_rating() {
        let (_pool, _tags, service) = setup_test_service().await;

        let mut input = sample_input("Gem Source");
        input.rating = Some(9);
        let err = service.create(input).await.expect_err("Should reject rating");
        assert!(matches!(err, VendorServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_delete_detaches_wishlist_items() {
        let (pool, tags, service) = setup_test_service().await;

        let vendor = service
            .create(sample_input("Gem Source"))
            .await
            .expect("Create failed");

        let wishlist = SqlxWishlistRepository::new(pool);
        let mut item = WishlistItem::new("Choker".to_string());
        item.vendor_id = Some(vendor.vendor_id.clone());
        let item = wishlist.create(&item).await.expect("Create item failed");

        service.delete(&vendor.vendor_id).await.expect("Delete failed");

        let detached = wishlist
            .get(&item.wish_id)
            .await
            .expect("Get item failed")
            .expect("Item should remain");
        assert_eq!(detached.vendor_id, None);

        let summary = tags.get("kundan").await.expect("Get tag failed");
        assert_eq!(summary.usage_count, 0);
    }
}

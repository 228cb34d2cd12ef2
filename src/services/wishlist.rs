//! Wishlist service
//!
//! CRUD and pipeline operations for wishlist items. Links to vendors,
//! master products, and competitors are validated before they are stored,
//! and `price_actual` only exists while an item is procured.

use crate::db::repositories::{
    CompetitorRepository, MasterProductRepository, VendorRepository, WishlistRepository,
};
use crate::models::{EntityType, WishlistItem, WishlistPriority, WishlistStatus};
use crate::services::tag::{TagService, TagServiceError};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Error types for wishlist service operations
#[derive(Debug, thiserror::Error)]
pub enum WishlistServiceError {
    /// Wishlist item or a linked entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from the tag subsystem
    #[error(transparent)]
    Tag(#[from] TagServiceError),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Fields accepted when adding a wishlist item
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWishlistInput {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub reference_urls: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub source_platforms: Vec<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
    pub vendor_id: Option<String>,
    pub master_product_id: Option<String>,
    #[serde(default)]
    pub status: WishlistStatus,
    pub price_target: Option<f64>,
    pub price_actual: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: WishlistPriority,
    pub notes: Option<String>,
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWishlistInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reference_urls: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub source_platforms: Option<Vec<String>>,
    pub price_target: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub priority: Option<WishlistPriority>,
    pub notes: Option<String>,
}

/// Filters for listing wishlist items
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WishlistFilter {
    pub status: Option<WishlistStatus>,
    pub priority: Option<WishlistPriority>,
    pub vendor_id: Option<String>,
    pub master_product_id: Option<String>,
    pub competitor: Option<String>,
    pub tag: Option<String>,
}

/// Wishlist titles are capped to keep dashboard rows readable
const MAX_TITLE_LEN: usize = 120;

/// Wishlist service
pub struct WishlistService {
    repo: Arc<dyn WishlistRepository>,
    vendors: Arc<dyn VendorRepository>,
    products: Arc<dyn MasterProductRepository>,
    competitors: Arc<dyn CompetitorRepository>,
    tags: Arc<TagService>,
}

impl WishlistService {
    /// Create a new wishlist service
    pub fn new(
        repo: Arc<dyn WishlistRepository>,
        vendors: Arc<dyn VendorRepository>,
        products: Arc<dyn MasterProductRepository>,
        competitors: Arc<dyn CompetitorRepository>,
        tags: Arc<TagService>,
    ) -> Self {
        Self {
            repo,
            vendors,
            products,
            competitors,
            tags,
        }
    }

    async fn check_vendor_link(&self, vendor_id: &str) -> Result<(), WishlistServiceError> {
        if self
            .vendors
            .get(vendor_id)
            .await
            .context("Failed to check vendor link")?
            .is_none()
        {
            return Err(WishlistServiceError::NotFound(format!(
                "Vendor not found: {}",
                vendor_id
            )));
        }
        Ok(())
    }

    async fn check_product_link(&self, product_id: &str) -> Result<(), WishlistServiceError> {
        if self
            .products
            .get(product_id)
            .await
            .context("Failed to check master product link")?
            .is_none()
        {
            return Err(WishlistServiceError::NotFound(format!(
                "Master product not found: {}",
                product_id
            )));
        }
        Ok(())
    }

    async fn check_competitor_link(&self, business_name: &str) -> Result<(), WishlistServiceError> {
        if self
            .competitors
            .get(business_name)
            .await
            .context("Failed to check competitor link")?
            .is_none()
        {
            return Err(WishlistServiceError::NotFound(format!(
                "Competitor not found: {}",
                business_name
            )));
        }
        Ok(())
    }

    /// Add a wishlist item
    pub async fn create(
        &self,
        input: CreateWishlistInput,
    ) -> Result<WishlistItem, WishlistServiceError> {
        let title = check_title(&input.title)?;

        if let Some(vendor_id) = &input.vendor_id {
            self.check_vendor_link(vendor_id).await?;
        }
        if let Some(product_id) = &input.master_product_id {
            self.check_product_link(product_id).await?;
        }
        for business_name in &input.competitors {
            self.check_competitor_link(business_name).await?;
        }

        let tags = self.tags.resolve_tag_list(&input.tags).await?;

        let mut item = WishlistItem::new(title);
        item.description = input.description;
        item.reference_urls = input.reference_urls;
        item.images = input.images;
        item.source_platforms = input.source_platforms;
        item.competitors = input.competitors;
        item.vendor_id = input.vendor_id;
        item.master_product_id = input.master_product_id;
        item.status = input.status;
        item.price_target = input.price_target;
        // price_actual only makes sense for procured items
        item.price_actual = if input.status == WishlistStatus::Procured {
            input.price_actual
        } else {
            None
        };
        item.tags = tags.clone();
        item.priority = input.priority;
        item.notes = input.notes;

        let created = self
            .repo
            .create(&item)
            .await
            .context("Failed to create wishlist item")?;

        self.tags
            .sync_index(EntityType::Wishlist, &created.wish_id, &[], &tags)
            .await?;

        Ok(created)
    }

    /// Get a wishlist item by id
    pub async fn get(&self, wish_id: &str) -> Result<WishlistItem, WishlistServiceError> {
        self.repo
            .get(wish_id)
            .await
            .context("Failed to get wishlist item")?
            .ok_or_else(|| {
                WishlistServiceError::NotFound(format!("Wishlist item not found: {}", wish_id))
            })
    }

    /// List wishlist items, newest first, with optional filters
    pub async fn list(
        &self,
        filter: &WishlistFilter,
    ) -> Result<Vec<WishlistItem>, WishlistServiceError> {
        let items = self
            .repo
            .list()
            .await
            .context("Failed to list wishlist items")?;

        Ok(items
            .into_iter()
            .filter(|item| {
                filter.status.map_or(true, |s| item.status == s)
                    && filter.priority.map_or(true, |p| item.priority == p)
                    && filter
                        .vendor_id
                        .as_ref()
                        .map_or(true, |v| item.vendor_id.as_ref() == Some(v))
                    && filter
                        .master_product_id
                        .as_ref()
                        .map_or(true, |m| item.master_product_id.as_ref() == Some(m))
                    && filter
                        .competitor
                        .as_ref()
                        .map_or(true, |c| item.competitors.contains(c))
                    && filter.tag.as_ref().map_or(true, |t| item.tags.contains(t))
            })
            .collect())
    }

    /// Update a wishlist item's descriptive fields
    pub async fn update(
        &self,
        wish_id: &str,
        input: UpdateWishlistInput,
    ) -> Result<WishlistItem, WishlistServiceError> {
        let mut item = self.get(wish_id).await?;
        let prev_tags = item.tags.clone();

        if let Some(title) = input.title {
            item.title = check_title(&title)?;
        }
        if input.description.is_some() {
            item.description = input.description;
        }
        if let Some(reference_urls) = input.reference_urls {
            item.reference_urls = reference_urls;
        }
        if let Some(images) = input.images {
            item.images = images;
        }
        if let Some(source_platforms) = input.source_platforms {
            item.source_platforms = source_platforms;
        }
        if input.price_target.is_some() {
            item.price_target = input.price_target;
        }
        if let Some(raw_tags) = input.tags {
            item.tags = self.tags.resolve_tag_list(&raw_tags).await?;
        }
        if let Some(priority) = input.priority {
            item.priority = priority;
        }
        if input.notes.is_some() {
            item.notes = input.notes;
        }

        let updated = self
            .repo
            .update(&item)
            .await
            .context("Failed to update wishlist item")?;

        self.tags
            .sync_index(
                EntityType::Wishlist,
                &updated.wish_id,
                &prev_tags,
                &updated.tags,
            )
            .await?;

        Ok(updated)
    }

    /// Move an item through the sourcing pipeline.
    ///
    /// `price_actual` is recorded only when moving to `procured` and is
    /// cleared on any other status.
    pub async fn set_status(
        &self,
        wish_id: &str,
        status: WishlistStatus,
        price_actual: Option<f64>,
    ) -> Result<WishlistItem, WishlistServiceError> {
        let mut item = self.get(wish_id).await?;

        item.status = status;
        if status == WishlistStatus::Procured {
            if let Some(price) = price_actual {
                item.price_actual = Some(price);
            }
        } else {
            item.price_actual = None;
        }

        self.repo
            .update(&item)
            .await
            .context("Failed to update wishlist status")
            .map_err(Into::into)
    }

    /// Link or unlink the sourcing vendor
    pub async fn set_vendor(
        &self,
        wish_id: &str,
        vendor_id: Option<String>,
    ) -> Result<WishlistItem, WishlistServiceError> {
        let mut item = self.get(wish_id).await?;
        if let Some(vendor_id) = &vendor_id {
            self.check_vendor_link(vendor_id).await?;
        }
        item.vendor_id = vendor_id;
        self.repo
            .update(&item)
            .await
            .context("Failed to update wishlist vendor")
            .map_err(Into::into)
    }

    /// Link or unlink the master product
    pub async fn set_master_product(
        &self,
        wish_id: &str,
        master_product_id: Option<String>,
    ) -> Result<WishlistItem, WishlistServiceError> {
        let mut item = self.get(wish_id).await?;
        if let Some(product_id) = &master_product_id {
            self.check_product_link(product_id).await?;
        }
        item.master_product_id = master_product_id;
        self.repo
            .update(&item)
            .await
            .context("Failed to update wishlist master product")
            .map_err(Into::into)
    }

    /// Adjust the linked competitor list
    pub async fn update_competitors(
        &self,
        wish_id: &str,
        add: &[String],
        remove: &[String],
    ) -> Result<WishlistItem, WishlistServiceError> {
        let mut item = self.get(wish_id).await?;

        for business_name in add {
            self.check_competitor_link(business_name).await?;
            if !item.competitors.contains(business_name) {
                item.competitors.push(business_name.clone());
            }
        }
        item.competitors.retain(|c| !remove.contains(c));

        self.repo
            .update(&item)
            .await
            .context("Failed to update wishlist competitors")
            .map_err(Into::into)
    }

    /// Delete a wishlist item and drop its tag assignments
    pub async fn delete(&self, wish_id: &str) -> Result<(), WishlistServiceError> {
        let deleted = self
            .repo
            .delete(wish_id)
            .await
            .context("Failed to delete wishlist item")?;
        if !deleted {
            return Err(WishlistServiceError::NotFound(format!(
                "Wishlist item not found: {}",
                wish_id
            )));
        }
        self.tags.clear_entity(EntityType::Wishlist, wish_id).await?;
        Ok(())
    }
}

fn check_title(title: &str) -> Result<String, WishlistServiceError> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(WishlistServiceError::ValidationError(
            "Title cannot be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(WishlistServiceError::ValidationError(format!(
            "Title cannot exceed {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title)
}

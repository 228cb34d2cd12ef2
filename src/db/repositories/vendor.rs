//! Vendor repository

use super::{decode_list, encode_list};
use crate::models::Vendor;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Vendor repository trait
#[async_trait]
pub trait VendorRepository: Send + Sync {
    /// Insert a new vendor. Fails with a unique violation when the name is
    /// already taken (case-insensitively).
    async fn create(&self, vendor: &Vendor) -> Result<Vendor>;

    /// Get vendor by id
    async fn get(&self, vendor_id: &str) -> Result<Option<Vendor>>;

    /// Case-insensitive lookup by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Vendor>>;

    /// List all vendors, most recently updated first
    async fn list(&self) -> Result<Vec<Vendor>>;

    /// Update all editable fields
    async fn update(&self, vendor: &Vendor) -> Result<Vendor>;

    /// Delete a vendor, returning whether it existed
    async fn delete(&self, vendor_id: &str) -> Result<bool>;

    /// Rewrite only the denormalized tag list
    async fn update_tags(&self, vendor_id: &str, tags: &[String]) -> Result<()>;
}

/// SQLx-based vendor repository implementation
pub struct SqlxVendorRepository {
    pool: SqlitePool,
}

impl SqlxVendorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn VendorRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl VendorRepository for SqlxVendorRepository {
    async fn create(&self, vendor: &Vendor) -> Result<Vendor> {
        let now = Utc::now();

        // No context: callers inspect for unique violations on the name.
        sqlx::query(
            r#"
            INSERT INTO vendors (
                vendor_id, name, website_url, whatsapp_link, email, phone, city, country,
                catalog_urls, lead_time_days, moq_units, payment_terms, rating, tags,
                notes, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&vendor.vendor_id)
        .bind(&vendor.name)
        .bind(&vendor.website_url)
        .bind(&vendor.whatsapp_link)
        .bind(&vendor.email)
        .bind(&vendor.phone)
        .bind(&vendor.city)
        .bind(&vendor.country)
        .bind(encode_list(&vendor.catalog_urls)?)
        .bind(vendor.lead_time_days)
        .bind(vendor.moq_units)
        .bind(&vendor.payment_terms)
        .bind(vendor.rating)
        .bind(encode_list(&vendor.tags)?)
        .bind(&vendor.notes)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Vendor {
            created_at: now,
            updated_at: now,
            ..vendor.clone()
        })
    }

    async fn get(&self, vendor_id: &str) -> Result<Option<Vendor>> {
        let row = sqlx::query("SELECT * FROM vendors WHERE vendor_id = ?")
            .bind(vendor_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get vendor")?;

        row.map(|r| row_to_vendor(&r)).transpose()
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Vendor>> {
        let row = sqlx::query("SELECT * FROM vendors WHERE name = ? COLLATE NOCASE")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get vendor by name")?;

        row.map(|r| row_to_vendor(&r)).transpose()
    }

    async fn list(&self) -> Result<Vec<Vendor>> {
        let rows = sqlx::query("SELECT * FROM vendors ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list vendors")?;

        rows.iter().map(row_to_vendor).collect()
    }

    async fn update(&self, vendor: &Vendor) -> Result<Vendor> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE vendors SET
                name = ?, website_url = ?, whatsapp_link = ?, email = ?, phone = ?,
                city = ?, country = ?, catalog_urls = ?, lead_time_days = ?, moq_units = ?,
                payment_terms = ?, rating = ?, tags = ?, notes = ?, updated_at = ?
            WHERE vendor_id = ?
            "#,
        )
        .bind(&vendor.name)
        .bind(&vendor.website_url)
        .bind(&vendor.whatsapp_link)
        .bind(&vendor.email)
        .bind(&vendor.phone)
        .bind(&vendor.city)
        .bind(&vendor.country)
        .bind(encode_list(&vendor.catalog_urls)?)
        .bind(vendor.lead_time_days)
        .bind(vendor.moq_units)
        .bind(&vendor.payment_terms)
        .bind(vendor.rating)
        .bind(encode_list(&vendor.tags)?)
        .bind(&vendor.notes)
        .bind(now)
        .bind(&vendor.vendor_id)
        .execute(&self.pool)
        .await
        .context("Failed to update vendor")?;

        anyhow::ensure!(
            result.rows_affected() > 0,
            "vendor not found: {}",
            vendor.vendor_id
        );

        Ok(Vendor {
            updated_at: now,
            ..vendor.clone()
        })
    }

    async fn delete(&self, vendor_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM vendors WHERE vendor_id = ?")
            .bind(vendor_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete vendor")?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_tags(&self, vendor_id: &str, tags: &[String]) -> Result<()> {
        sqlx::query("UPDATE vendors SET tags = ?, updated_at = ? WHERE vendor_id = ?")
            .bind(encode_list(tags)?)
            .bind(Utc::now())
            .bind(vendor_id)
            .execute(&self.pool)
            .await
            .context("Failed to update vendor tags")?;

        Ok(())
    }
}

fn row_to_vendor(row: &sqlx::sqlite::SqliteRow) -> Result<Vendor> {
    let catalog_urls: String = row.get("catalog_urls");
    let tags: String = row.get("tags");

    Ok(Vendor {
        vendor_id: row.get("vendor_id"),
        name: row.get("name"),
        website_url: row.get("website_url"),
        whatsapp_link: row.get("whatsapp_link"),
        email: row.get("email"),
        phone: row.get("phone"),
        city: row.get("city"),
        country: row.get("country"),
        catalog_urls: decode_list(&catalog_urls)?,
        lead_time_days: row.get("lead_time_days"),
        moq_units: row.get("moq_units"),
        payment_terms: row.get("payment_terms"),
        rating: row.get("rating"),
        tags: decode_list(&tags)?,
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::is_unique_violation;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxVendorRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxVendorRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;

        let mut vendor = Vendor::new("Gem Source".to_string());
        vendor.phone = Some("9876543210".to_string());
        let created = repo.create(&vendor).await.expect("Create failed");

        let fetched = repo
            .get(&created.vendor_id)
            .await
            .expect("Get failed")
            .expect("Should exist");
        assert_eq!(fetched.name, "Gem Source");
        assert_eq!(fetched.phone.as_deref(), Some("9876543210"));
    }

    #[tokio::test]
    async fn test_name_unique_case_insensitive() {
        let repo = setup().await;

        repo.create(&Vendor::new("Gem Source".to_string()))
            .await
            .expect("Create failed");
        let err = repo
            .create(&Vendor::new("GEM SOURCE".to_string()))
            .await
            .expect_err("Duplicate name should fail");
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_get_by_name_case_insensitive() {
        let repo = setup().await;

        let created = repo
            .create(&Vendor::new("Gem Source".to_string()))
            .await
            .expect("Create failed");

        let found = repo
            .get_by_name("gem source")
            .await
            .expect("Lookup failed")
            .expect("Should match");
        assert_eq!(found.vendor_id, created.vendor_id);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;

        let created = repo
            .create(&Vendor::new("Gem Source".to_string()))
            .await
            .expect("Create failed");
        assert!(repo.delete(&created.vendor_id).await.expect("Delete failed"));
        assert!(!repo.delete(&created.vendor_id).await.expect("Delete failed"));
    }
}

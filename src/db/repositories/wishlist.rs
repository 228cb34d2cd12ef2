//! Wishlist repository

use super::{decode_list, encode_list};
use crate::models::{WishlistItem, WishlistPriority, WishlistStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Wishlist repository trait
#[async_trait]
pub trait WishlistRepository: Send + Sync {
    async fn create(&self, item: &WishlistItem) -> Result<WishlistItem>;

    async fn get(&self, wish_id: &str) -> Result<Option<WishlistItem>>;

    /// List all items, most recently updated first
    async fn list(&self) -> Result<Vec<WishlistItem>>;

    async fn update(&self, item: &WishlistItem) -> Result<WishlistItem>;

    /// Delete an item, returning whether it existed
    async fn delete(&self, wish_id: &str) -> Result<bool>;

    /// Rewrite only the denormalized tag list
    async fn update_tags(&self, wish_id: &str, tags: &[String]) -> Result<()>;

    /// Clear the vendor link on every item referencing a vendor
    async fn detach_vendor(&self, vendor_id: &str) -> Result<u64>;

    /// How many items link to a master product
    async fn count_by_master_product(&self, product_id: &str) -> Result<i64>;
}

/// SQLx-based wishlist repository implementation
pub struct SqlxWishlistRepository {
    pool: SqlitePool,
}

impl SqlxWishlistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn WishlistRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl WishlistRepository for SqlxWishlistRepository {
    async fn create(&self, item: &WishlistItem) -> Result<WishlistItem> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO wishlist_items (
                wish_id, title, description, reference_urls, images, source_platforms,
                competitors, vendor_id, master_product_id, status, price_target,
                price_actual, tags, priority, notes, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.wish_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(encode_list(&item.reference_urls)?)
        .bind(encode_list(&item.images)?)
        .bind(encode_list(&item.source_platforms)?)
        .bind(encode_list(&item.competitors)?)
        .bind(&item.vendor_id)
        .bind(&item.master_product_id)
        .bind(item.status.as_str())
        .bind(item.price_target)
        .bind(item.price_actual)
        .bind(encode_list(&item.tags)?)
        .bind(item.priority.as_str())
        .bind(&item.notes)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create wishlist item")?;

        Ok(WishlistItem {
            created_at: now,
            updated_at: now,
            ..item.clone()
        })
    }

    async fn get(&self, wish_id: &str) -> Result<Option<WishlistItem>> {
        let row = sqlx::query("SELECT * FROM wishlist_items WHERE wish_id = ?")
            .bind(wish_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get wishlist item")?;

        row.map(|r| row_to_item(&r)).transpose()
    }

    async fn list(&self) -> Result<Vec<WishlistItem>> {
        let rows = sqlx::query("SELECT * FROM wishlist_items ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list wishlist items")?;

        rows.iter().map(row_to_item).collect()
    }

    async fn update(&self, item: &WishlistItem) -> Result<WishlistItem> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE wishlist_items SET
                title = ?, description = ?, reference_urls = ?, images = ?,
                source_platforms = ?, competitors = ?, vendor_id = ?,
                master_product_id = ?, status = ?, price_target = ?, price_actual = ?,
                tags = ?, priority = ?, notes = ?, updated_at = ?
            WHERE wish_id = ?
            "#,
        )
        .bind(&item.title)
        .bind(&item.description)
        .bind(encode_list(&item.reference_urls)?)
        .bind(encode_list(&item.images)?)
        .bind(encode_list(&item.source_platforms)?)
        .bind(encode_list(&item.competitors)?)
        .bind(&item.vendor_id)
        .bind(&item.master_product_id)
        .bind(item.status.as_str())
        .bind(item.price_target)
        .bind(item.price_actual)
        .bind(encode_list(&item.tags)?)
        .bind(item.priority.as_str())
        .bind(&item.notes)
        .bind(now)
        .bind(&item.wish_id)
        .execute(&self.pool)
        .await
        .context("Failed to update wishlist item")?;

        anyhow::ensure!(
            result.rows_affected() > 0,
            "wishlist item not found: {}",
            item.wish_id
        );

        Ok(WishlistItem {
            updated_at: now,
            ..item.clone()
        })
    }

    async fn delete(&self, wish_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM wishlist_items WHERE wish_id = ?")
            .bind(wish_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete wishlist item")?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_tags(&self, wish_id: &str, tags: &[String]) -> Result<()> {
        sqlx::query("UPDATE wishlist_items SET tags = ?, updated_at = ? WHERE wish_id = ?")
            .bind(encode_list(tags)?)
            .bind(Utc::now())
            .bind(wish_id)
            .execute(&self.pool)
            .await
            .context("Failed to update wishlist tags")?;

        Ok(())
    }

    async fn detach_vendor(&self, vendor_id: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE wishlist_items SET vendor_id = NULL, updated_at = ? WHERE vendor_id = ?",
        )
        .bind(Utc::now())
        .bind(vendor_id)
        .execute(&self.pool)
        .await
        .context("Failed to detach vendor")?;

        Ok(result.rows_affected())
    }

    async fn count_by_master_product(&self, product_id: &str) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM wishlist_items WHERE master_product_id = ?",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count linked wishlist items")?;

        Ok(row.get("count"))
    }
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<WishlistItem> {
    let reference_urls: String = row.get("reference_urls");
    let images: String = row.get("images");
    let source_platforms: String = row.get("source_platforms");
    let competitors: String = row.get("competitors");
    let tags: String = row.get("tags");
    let status: String = row.get("status");
    let priority: String = row.get("priority");

    Ok(WishlistItem {
        wish_id: row.get("wish_id"),
        title: row.get("title"),
        description: row.get("description"),
        reference_urls: decode_list(&reference_urls)?,
        images: decode_list(&images)?,
        source_platforms: decode_list(&source_platforms)?,
        competitors: decode_list(&competitors)?,
        vendor_id: row.get("vendor_id"),
        master_product_id: row.get("master_product_id"),
        status: status
            .parse::<WishlistStatus>()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Invalid status in database")?,
        price_target: row.get("price_target"),
        price_actual: row.get("price_actual"),
        tags: decode_list(&tags)?,
        priority: priority
            .parse::<WishlistPriority>()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Invalid priority in database")?,
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxWishlistRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxWishlistRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;

        let mut item = WishlistItem::new("Filigree jhumka".to_string());
        item.tags = vec!["filigree".to_string(), "jhumka".to_string()];
        item.price_target = Some(45.0);
        let created = repo.create(&item).await.expect("Create failed");

        let fetched = repo
            .get(&created.wish_id)
            .await
            .expect("Get failed")
            .expect("Should exist");
        assert_eq!(fetched.title, "Filigree jhumka");
        assert_eq!(fetched.tags.len(), 2);
        assert_eq!(fetched.price_target, Some(45.0));
        assert_eq!(fetched.status, WishlistStatus::Planned);
    }

    #[tokio::test]
    async fn test_detach_vendor() {
        let repo = setup().await;

        let mut a = WishlistItem::new("Item A".to_string());
        a.vendor_id = Some("v1".to_string());
        let mut b = WishlistItem::new("Item B".to_string());
        b.vendor_id = Some("v1".to_string());
        let mut c = WishlistItem::new("Item C".to_string());
        c.vendor_id = Some("v2".to_string());

        for item in [&a, &b, &c] {
            repo.create(item).await.expect("Create failed");
        }

        let detached = repo.detach_vendor("v1").await.expect("Detach failed");
        assert_eq!(detached, 2);

        let fetched = repo
            .get(&a.wish_id)
            .await
            .expect("Get failed")
            .expect("Should exist");
        assert!(fetched.vendor_id.is_none());

        let untouched = repo
            .get(&c.wish_id)
            .await
            .expect("Get failed")
            .expect("Should exist");
        assert_eq!(untouched.vendor_id.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_count_by_master_product() {
        let repo = setup().await;

        let mut item = WishlistItem::new("Item".to_string());
        item.master_product_id = Some("p1".to_string());
        repo.create(&item).await.expect("Create failed");

        assert_eq!(
            repo.count_by_master_product("p1").await.expect("Count failed"),
            1
        );
        assert_eq!(
            repo.count_by_master_product("p2").await.expect("Count failed"),
            0
        );
    }
}

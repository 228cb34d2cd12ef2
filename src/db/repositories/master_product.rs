//! Master product repository

use crate::models::MasterProduct;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Master product repository trait
#[async_trait]
pub trait MasterProductRepository: Send + Sync {
    async fn create(&self, product: &MasterProduct) -> Result<MasterProduct>;

    async fn get(&self, product_id: &str) -> Result<Option<MasterProduct>>;

    /// List all products, most recently updated first
    async fn list(&self) -> Result<Vec<MasterProduct>>;

    async fn update(&self, product: &MasterProduct) -> Result<MasterProduct>;

    /// Delete a product, returning whether it existed
    async fn delete(&self, product_id: &str) -> Result<bool>;
}

/// SQLx-based master product repository implementation
pub struct SqlxMasterProductRepository {
    pool: SqlitePool,
}

impl SqlxMasterProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn MasterProductRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MasterProductRepository for SqlxMasterProductRepository {
    async fn create(&self, product: &MasterProduct) -> Result<MasterProduct> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO master_products (
                product_id, name, description, product_type, metal, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.product_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.product_type)
        .bind(&product.metal)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create master product")?;

        Ok(MasterProduct {
            created_at: now,
            updated_at: now,
            ..product.clone()
        })
    }

    async fn get(&self, product_id: &str) -> Result<Option<MasterProduct>> {
        let row = sqlx::query("SELECT * FROM master_products WHERE product_id = ?")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get master product")?;

        Ok(row.map(|r| row_to_product(&r)))
    }

    async fn list(&self) -> Result<Vec<MasterProduct>> {
        let rows = sqlx::query("SELECT * FROM master_products ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list master products")?;

        Ok(rows.iter().map(row_to_product).collect())
    }

    async fn update(&self, product: &MasterProduct) -> Result<MasterProduct> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE master_products SET
                name = ?, description = ?, product_type = ?, metal = ?, updated_at = ?
            WHERE product_id = ?
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.product_type)
        .bind(&product.metal)
        .bind(now)
        .bind(&product.product_id)
        .execute(&self.pool)
        .await
        .context("Failed to update master product")?;

        anyhow::ensure!(
            result.rows_affected() > 0,
            "master product not found: {}",
            product.product_id
        );

        Ok(MasterProduct {
            updated_at: now,
            ..product.clone()
        })
    }

    async fn delete(&self, product_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM master_products WHERE product_id = ?")
            .bind(product_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete master product")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> MasterProduct {
    use sqlx::Row;

    MasterProduct {
        product_id: row.get("product_id"),
        name: row.get("name"),
        description: row.get("description"),
        product_type: row.get("product_type"),
        metal: row.get("metal"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxMasterProductRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxMasterProductRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let repo = setup().await;

        let mut product = MasterProduct::new("Kundan choker".to_string());
        product.metal = Some("brass".to_string());
        let created = repo.create(&product).await.expect("Create failed");

        let mut fetched = repo
            .get(&created.product_id)
            .await
            .expect("Get failed")
            .expect("Should exist");
        assert_eq!(fetched.metal.as_deref(), Some("brass"));

        fetched.product_type = Some("choker".to_string());
        repo.update(&fetched).await.expect("Update failed");

        let updated = repo
            .get(&created.product_id)
            .await
            .expect("Get failed")
            .expect("Should exist");
        assert_eq!(updated.product_type.as_deref(), Some("choker"));

        assert!(repo.delete(&created.product_id).await.expect("Delete failed"));
        assert!(repo
            .get(&created.product_id)
            .await
            .expect("Get failed")
            .is_none());
    }
}

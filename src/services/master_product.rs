//! Master product service
//!
//! The internal product catalog wishlist items graduate into. A master
//! product cannot be deleted while wishlist items still reference it.

use crate::db::repositories::{MasterProductRepository, WishlistRepository};
use crate::models::MasterProduct;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Error types for master product service operations
#[derive(Debug, thiserror::Error)]
pub enum MasterProductServiceError {
    /// Master product not found
    #[error("Master product not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Product still referenced by wishlist items
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Catalog names are capped to keep listings readable
const MAX_NAME_LEN: usize = 160;

/// Fields accepted when cataloging a master product
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMasterProductInput {
    pub name: String,
    pub description: Option<String>,
    pub product_type: Option<String>,
    pub metal: Option<String>,
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMasterProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub product_type: Option<String>,
    pub metal: Option<String>,
}

/// Master product service
pub struct MasterProductService {
    repo: Arc<dyn MasterProductRepository>,
    wishlist: Arc<dyn WishlistRepository>,
}

impl MasterProductService {
    /// Create a new master product service
    pub fn new(
        repo: Arc<dyn MasterProductRepository>,
        wishlist: Arc<dyn WishlistRepository>,
    ) -> Self {
        Self { repo, wishlist }
    }

    /// Catalog a master product
    pub async fn create(
        &self,
        input: CreateMasterProductInput,
    ) -> Result<MasterProduct, MasterProductServiceError> {
        let name = check_name(&input.name)?;

        let mut product = MasterProduct::new(name);
        product.description = input.description;
        product.product_type = input.product_type;
        product.metal = input.metal;

        self.repo
            .create(&product)
            .await
            .context("Failed to create master product")
            .map_err(Into::into)
    }

    /// Get a master product by id
    pub async fn get(&self, product_id: &str) -> Result<MasterProduct, MasterProductServiceError> {
        self.repo
            .get(product_id)
            .await
            .context("Failed to get master product")?
            .ok_or_else(|| MasterProductServiceError::NotFound(product_id.to_string()))
    }

    /// List all master products, most recently updated first
    pub async fn list(&self) -> Result<Vec<MasterProduct>, MasterProductServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list master products")
            .map_err(Into::into)
    }

    /// Update a master product
    pub async fn update(
        &self,
        product_id: &str,
        input: UpdateMasterProductInput,
    ) -> Result<MasterProduct, MasterProductServiceError> {
        let mut product = self.get(product_id).await?;

        if let Some(name) = input.name {
            product.name = check_name(&name)?;
        }
        if input.description.is_some() {
            product.description = input.description;
        }
        if input.product_type.is_some() {
            product.product_type = input.product_type;
        }
        if input.metal.is_some() {
            product.metal = input.metal;
        }

        self.repo
            .update(&product)
            .await
            .context("Failed to update master product")
            .map_err(Into::into)
    }

    /// Delete a master product. Refused while wishlist items reference it.
    pub async fn delete(&self, product_id: &str) -> Result<(), MasterProductServiceError> {
        let references = self
            .wishlist
            .count_by_master_product(product_id)
            .await
            .context("Failed to count wishlist references")?;
        if references > 0 {
            return Err(MasterProductServiceError::Conflict(format!(
                "Master product is referenced by {} wishlist item(s)",
                references
            )));
        }

        let deleted = self
            .repo
            .delete(product_id)
            .await
            .context("Failed to delete master product")?;
        if !deleted {
            return Err(MasterProductServiceError::NotFound(product_id.to_string()));
        }
        Ok(())
    }
}

fn check_name(name: &str) -> Result<String, MasterProductServiceError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(MasterProductServiceError::ValidationError(
            "Product name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(MasterProductServiceError::ValidationError(format!(
            "Product name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxMasterProductRepository, SqlxWishlistRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::WishlistItem;
    use sqlx::SqlitePool;

    async fn setup_test_service() -> (SqlitePool, MasterProductService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = MasterProductService::new(
            SqlxMasterProductRepository::boxed(pool.clone()),
            SqlxWishlistRepository::boxed(pool.clone()),
        );
        (pool, service)
    }

    #[tokio::test]
    async fn test_create_and_update() {
        let (_pool, service) = setup_test_service().await;

        let product = service
            .create(CreateMasterProductInput {
                name: "  Kundan choker  ".to_string(),
                description: None,
                product_type: Some("choker".to_string()),
                metal: Some("brass".to_string()),
            })
            .await
            .expect("Create failed");
        assert_eq!(product.name, "Kundan choker");

        let updated = service
            .update(
                &product.product_id,
                UpdateMasterProductInput {
                    metal: Some("silver".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("Update failed");
        assert_eq!(updated.metal, Some("silver".to_string()));
        assert_eq!(updated.product_type, Some("choker".to_string()));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let (_pool, service) = setup_test_service().await;

        let err = service
            .create(CreateMasterProductInput {
                name: "   ".to_string(),
                description: None,
                product_type: None,
                metal: None,
            })
            .await
            .expect_err("Blank name should fail");
        assert!(matches!(err, MasterProductServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_delete_blocked_while_referenced() {
        let (pool, service) = setup_test_service().await;

        let product = service
            .create(CreateMasterProductInput {
                name: "Kundan choker".to_string(),
                description: None,
                product_type: None,
                metal: None,
            })
            .await
            .expect("Create failed");

        let wishlist = SqlxWishlistRepository::new(pool);
        let mut item = WishlistItem::new("Bridal choker".to_string());
        item.master_product_id = Some(product.product_id.clone());
        let item = wishlist.create(&item).await.expect("Create item failed");

        let err = service
            .delete(&product.product_id)
            .await
            .expect_err("Delete should be blocked");
        assert!(matches!(err, MasterProductServiceError::Conflict(_)));

        // Unlink, then deletion goes through
        let mut item = item;
        item.master_product_id = None;
        wishlist.update(&item).await.expect("Update item failed");
        service
            .delete(&product.product_id)
            .await
            .expect("Delete failed");

        assert!(matches!(
            service.get(&product.product_id).await,
            Err(MasterProductServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_not_found() {
        let (_pool, service) = setup_test_service().await;
        assert!(matches!(
            service.delete("ghost").await,
            Err(MasterProductServiceError::NotFound(_))
        ));
    }
}

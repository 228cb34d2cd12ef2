//! Master product API endpoints
//!
//! - GET /api/v1/master-products - List the catalog
//! - POST /api/v1/master-products - Catalog a product
//! - GET /api/v1/master-products/:id - Single product
//! - PUT /api/v1/master-products/:id - Update a product
//! - DELETE /api/v1/master-products/:id - Remove a product

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::MasterProduct;
use crate::services::{CreateMasterProductInput, UpdateMasterProductInput};

#[derive(Debug, Serialize, Deserialize)]
pub struct MasterProductListResponse {
    pub products: Vec<MasterProduct>,
}

/// Build the master products router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// GET /api/v1/master-products - List the catalog
async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<MasterProductListResponse>, ApiError> {
    let products = state.master_product_service.list().await?;
    Ok(Json(MasterProductListResponse { products }))
}

/// POST /api/v1/master-products - Catalog a product
async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateMasterProductInput>,
) -> Result<(StatusCode, Json<MasterProduct>), ApiError> {
    let product = state.master_product_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/v1/master-products/:id - Single product
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MasterProduct>, ApiError> {
    let product = state.master_product_service.get(&id).await?;
    Ok(Json(product))
}

/// PUT /api/v1/master-products/:id - Update a product
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateMasterProductInput>,
) -> Result<Json<MasterProduct>, ApiError> {
    let product = state.master_product_service.update(&id, input).await?;
    Ok(Json(product))
}

/// DELETE /api/v1/master-products/:id - Remove a product
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.master_product_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Wishlist API endpoints
//!
//! - GET /api/v1/wishlist - List items with filters
//! - POST /api/v1/wishlist - Add an item
//! - GET /api/v1/wishlist/:id - Single item
//! - PUT /api/v1/wishlist/:id - Update descriptive fields
//! - DELETE /api/v1/wishlist/:id - Remove an item
//! - PATCH /api/v1/wishlist/:id/status - Move through the pipeline
//! - PATCH /api/v1/wishlist/:id/vendor - Link/unlink the vendor
//! - PATCH /api/v1/wishlist/:id/master-product - Link/unlink the product
//! - PATCH /api/v1/wishlist/:id/competitors - Adjust linked competitors

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{WishlistItem, WishlistStatus};
use crate::services::{CreateWishlistInput, UpdateWishlistInput, WishlistFilter};

#[derive(Debug, Serialize, Deserialize)]
pub struct WishlistListResponse {
    pub items: Vec<WishlistItem>,
}

#[derive(Debug, Deserialize)]
pub struct StatusPatch {
    pub status: WishlistStatus,
    /// Recorded only when moving to `procured`
    pub price_actual: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct VendorPatch {
    pub vendor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MasterProductPatch {
    pub master_product_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompetitorsPatch {
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

/// Build the wishlist router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route(
            "/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/{id}/status", patch(patch_status))
        .route("/{id}/vendor", patch(patch_vendor))
        .route("/{id}/master-product", patch(patch_master_product))
        .route("/{id}/competitors", patch(patch_competitors))
}

/// GET /api/v1/wishlist - List items with optional filters
async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<WishlistFilter>,
) -> Result<Json<WishlistListResponse>, ApiError> {
    let items = state.wishlist_service.list(&filter).await?;
    Ok(Json(WishlistListResponse { items }))
}

/// POST /api/v1/wishlist - Add an item
async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<CreateWishlistInput>,
) -> Result<(StatusCode, Json<WishlistItem>), ApiError> {
    let item = state.wishlist_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/v1/wishlist/:id - Single item
async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WishlistItem>, ApiError> {
    let item = state.wishlist_service.get(&id).await?;
    Ok(Json(item))
}

/// PUT /api/v1/wishlist/:id - Update descriptive fields
async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateWishlistInput>,
) -> Result<Json<WishlistItem>, ApiError> {
    let item = state.wishlist_service.update(&id, input).await?;
    Ok(Json(item))
}

/// PATCH /api/v1/wishlist/:id/status - Move through the pipeline
async fn patch_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusPatch>,
) -> Result<Json<WishlistItem>, ApiError> {
    let item = state
        .wishlist_service
        .set_status(&id, req.status, req.price_actual)
        .await?;
    Ok(Json(item))
}

/// PATCH /api/v1/wishlist/:id/vendor - Link or unlink the vendor
async fn patch_vendor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VendorPatch>,
) -> Result<Json<WishlistItem>, ApiError> {
    let item = state.wishlist_service.set_vendor(&id, req.vendor_id).await?;
    Ok(Json(item))
}

/// PATCH /api/v1/wishlist/:id/master-product - Link or unlink the product
async fn patch_master_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MasterProductPatch>,
) -> Result<Json<WishlistItem>, ApiError> {
    let item = state
        .wishlist_service
        .set_master_product(&id, req.master_product_id)
        .await?;
    Ok(Json(item))
}

/// PATCH /api/v1/wishlist/:id/competitors - Adjust linked competitors
async fn patch_competitors(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CompetitorsPatch>,
) -> Result<Json<WishlistItem>, ApiError> {
    let item = state
        .wishlist_service
        .update_competitors(&id, &req.add, &req.remove)
        .await?;
    Ok(Json(item))
}

/// DELETE /api/v1/wishlist/:id - Remove an item
async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.wishlist_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

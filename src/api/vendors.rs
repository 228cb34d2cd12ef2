//! Vendor API endpoints
//!
//! - GET /api/v1/vendors - List vendors
//! - POST /api/v1/vendors - Register a vendor
//! - GET /api/v1/vendors/:id - Single vendor
//! - PUT /api/v1/vendors/:id - Update a vendor
//! - DELETE /api/v1/vendors/:id - Remove a vendor

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::Vendor;
use crate::services::{CreateVendorInput, UpdateVendorInput};

/// Query parameters for listing vendors
#[derive(Debug, Deserialize)]
pub struct ListVendorsQuery {
    /// Case-insensitive substring match over name, city and country
    pub query: Option<String>,
    /// Restrict to vendors carrying this tag slug
    pub tag: Option<String>,
    /// Restrict to this city, case-insensitively
    pub city: Option<String>,
}

fn matches_query(vendor: &Vendor, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let haystacks = [
        Some(vendor.name.as_str()),
        vendor.city.as_deref(),
        vendor.country.as_deref(),
    ];
    haystacks
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VendorListResponse {
    pub vendors: Vec<Vendor>,
}

/// Build the vendors router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vendors).post(create_vendor))
        .route(
            "/{id}",
            get(get_vendor).put(update_vendor).delete(delete_vendor),
        )
}

/// GET /api/v1/vendors - List vendors with optional filters
async fn list_vendors(
    State(state): State<AppState>,
    Query(query): Query<ListVendorsQuery>,
) -> Result<Json<VendorListResponse>, ApiError> {
    let vendors = state
        .vendor_service
        .list()
        .await?
        .into_iter()
        .filter(|v| {
            query.query.as_ref().map_or(true, |q| matches_query(v, q))
                && query.tag.as_ref().map_or(true, |t| v.tags.contains(t))
                && query.city.as_ref().map_or(true, |c| {
                    v.city
                        .as_ref()
                        .map_or(false, |vc| vc.eq_ignore_ascii_case(c))
                })
        })
        .collect();
    Ok(Json(VendorListResponse { vendors }))
}

/// POST /api/v1/vendors - Register a vendor
async fn create_vendor(
    State(state): State<AppState>,
    Json(input): Json<CreateVendorInput>,
) -> Result<(StatusCode, Json<Vendor>), ApiError> {
    let vendor = state.vendor_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(vendor)))
}

/// GET /api/v1/vendors/:id - Single vendor
async fn get_vendor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vendor>, ApiError> {
    let vendor = state.vendor_service.get(&id).await?;
    Ok(Json(vendor))
}

/// PUT /api/v1/vendors/:id - Update a vendor
async fn update_vendor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateVendorInput>,
) -> Result<Json<Vendor>, ApiError> {
    let vendor = state.vendor_service.update(&id, input).await?;
    Ok(Json(vendor))
}

/// DELETE /api/v1/vendors/:id - Remove a vendor
async fn delete_vendor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.vendor_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

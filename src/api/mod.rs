//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the IntelHub system:
//! - Tag API endpoints (resolution, curation, stats, assignments)
//! - Competitor API endpoints
//! - Vendor API endpoints
//! - Wishlist API endpoints
//! - Master product API endpoints

pub mod competitors;
pub mod master_products;
pub mod middleware;
pub mod tags;
pub mod vendors;
pub mod wishlist;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

/// GET /api/v1/health - Liveness probe
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the main API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/tags", tags::router())
        .route("/tag-assignments", post(tags::apply_assignments))
        .nest("/competitors", competitors::router())
        .nest("/vendors", vendors::router())
        .nest("/wishlist", wishlist::router())
        .nest("/master-products", master_products::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .context("Invalid CORS origin")?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .nest("/api/v1", build_api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

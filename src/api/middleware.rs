//! Shared API state and error envelope
//!
//! Every handler returns `Result<_, ApiError>`; the `From` impls below
//! translate service errors into the JSON error envelope and HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::{
    CompetitorService, CompetitorServiceError, MasterProductService, MasterProductServiceError,
    TagService, TagServiceError, VendorService, VendorServiceError, WishlistService,
    WishlistServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub tag_service: Arc<TagService>,
    pub competitor_service: Arc<CompetitorService>,
    pub vendor_service: Arc<VendorService>,
    pub wishlist_service: Arc<WishlistService>,
    pub master_product_service: Arc<MasterProductService>,
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<TagServiceError> for ApiError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::NotFound(msg) => Self::not_found(format!("Tag not found: {}", msg)),
            TagServiceError::ValidationError(msg) => Self::validation_error(msg),
            TagServiceError::AliasConflict(msg) | TagServiceError::Conflict(msg) => {
                Self::conflict(msg)
            }
            TagServiceError::InternalError(err) => {
                tracing::error!("Tag service error: {:#}", err);
                Self::internal_error("Internal server error")
            }
        }
    }
}

impl From<CompetitorServiceError> for ApiError {
    fn from(err: CompetitorServiceError) -> Self {
        match err {
            CompetitorServiceError::NotFound(msg) => {
                Self::not_found(format!("Competitor not found: {}", msg))
            }
            CompetitorServiceError::ValidationError(msg) => Self::validation_error(msg),
            CompetitorServiceError::Conflict(msg) => Self::conflict(msg),
            CompetitorServiceError::Tag(err) => err.into(),
            CompetitorServiceError::InternalError(err) => {
                tracing::error!("Competitor service error: {:#}", err);
                Self::internal_error("Internal server error")
            }
        }
    }
}

impl From<VendorServiceError> for ApiError {
    fn from(err: VendorServiceError) -> Self {
        match err {
            VendorServiceError::NotFound(msg) => {
                Self::not_found(format!("Vendor not found: {}", msg))
            }
            VendorServiceError::ValidationError(msg) => Self::validation_error(msg),
            VendorServiceError::Conflict(msg) => Self::conflict(msg),
            VendorServiceError::Tag(err) => err.into(),
            VendorServiceError::InternalError(err) => {
                tracing::error!("Vendor service error: {:#}", err);
                Self::internal_error("Internal server error")
            }
        }
    }
}

impl From<WishlistServiceError> for ApiError {
    fn from(err: WishlistServiceError) -> Self {
        match err {
            WishlistServiceError::NotFound(msg) => Self::not_found(msg),
            WishlistServiceError::ValidationError(msg) => Self::validation_error(msg),
            WishlistServiceError::Tag(err) => err.into(),
            WishlistServiceError::InternalError(err) => {
                tracing::error!("Wishlist service error: {:#}", err);
                Self::internal_error("Internal server error")
            }
        }
    }
}

impl From<MasterProductServiceError> for ApiError {
    fn from(err: MasterProductServiceError) -> Self {
        match err {
            MasterProductServiceError::NotFound(msg) => {
                Self::not_found(format!("Master product not found: {}", msg))
            }
            MasterProductServiceError::ValidationError(msg) => Self::validation_error(msg),
            MasterProductServiceError::Conflict(msg) => Self::conflict(msg),
            MasterProductServiceError::InternalError(err) => {
                tracing::error!("Master product service error: {:#}", err);
                Self::internal_error("Internal server error")
            }
        }
    }
}

//! Competitor API endpoints
//!
//! - GET /api/v1/competitors - List competitors
//! - POST /api/v1/competitors - Register a competitor
//! - GET /api/v1/competitors/:name - Single competitor
//! - PUT /api/v1/competitors/:name - Update a competitor
//! - DELETE /api/v1/competitors/:name - Remove a competitor

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{Competitor, CompetitorPriority};
use crate::services::{CreateCompetitorInput, UpdateCompetitorInput};

/// Query parameters for listing competitors
#[derive(Debug, Deserialize)]
pub struct ListCompetitorsQuery {
    pub priority: Option<CompetitorPriority>,
    pub watchlist: Option<bool>,
    /// Restrict to competitors carrying this tag slug
    pub tag: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompetitorListResponse {
    pub competitors: Vec<Competitor>,
}

/// Build the competitors router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_competitors).post(create_competitor))
        .route(
            "/{name}",
            get(get_competitor)
                .put(update_competitor)
                .delete(delete_competitor),
        )
}

/// GET /api/v1/competitors - List competitors with optional filters
async fn list_competitors(
    State(state): State<AppState>,
    Query(query): Query<ListCompetitorsQuery>,
) -> Result<Json<CompetitorListResponse>, ApiError> {
    let competitors = state
        .competitor_service
        .list()
        .await?
        .into_iter()
        .filter(|c| {
            query.priority.map_or(true, |p| c.priority == p)
                && query.watchlist.map_or(true, |w| c.watchlist == w)
                && query.tag.as_ref().map_or(true, |t| c.tags.contains(t))
        })
        .collect();
    Ok(Json(CompetitorListResponse { competitors }))
}

/// POST /api/v1/competitors - Register a competitor
async fn create_competitor(
    State(state): State<AppState>,
    Json(input): Json<CreateCompetitorInput>,
) -> Result<(StatusCode, Json<Competitor>), ApiError> {
    let competitor = state.competitor_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(competitor)))
}

/// GET /api/v1/competitors/:name - Single competitor
async fn get_competitor(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Competitor>, ApiError> {
    let competitor = state.competitor_service.get(&name).await?;
    Ok(Json(competitor))
}

/// PUT /api/v1/competitors/:name - Update a competitor
async fn update_competitor(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(input): Json<UpdateCompetitorInput>,
) -> Result<Json<Competitor>, ApiError> {
    let competitor = state.competitor_service.update(&name, input).await?;
    Ok(Json(competitor))
}

/// DELETE /api/v1/competitors/:name - Remove a competitor
async fn delete_competitor(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.competitor_service.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

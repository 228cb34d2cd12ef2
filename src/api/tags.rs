//! Tag API endpoints
//!
//! Handles HTTP requests for the tag subsystem:
//! - GET /api/v1/tags - Suggestion search, full listing, or batch lookup
//! - POST /api/v1/tags - Curated tag creation
//! - GET /api/v1/tags/:slug - Single tag with usage count
//! - PUT /api/v1/tags/:slug - Edit display name, category, description
//! - PATCH /api/v1/tags/:slug/status - Lifecycle changes
//! - POST /api/v1/tags/alias - Register an alias
//! - POST /api/v1/tags/resolve - Resolve free text to a canonical tag
//! - POST /api/v1/tags/merge - Merge one tag into another
//! - GET /api/v1/tags/stats/* - Usage statistics
//! - POST /api/v1/tag-assignments - Bulk assignment changes

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::TagSearch;
use crate::models::{EntityType, Tag, TagCategory, TagCategoryCount, TagMergeResult, TagStatus, TagSummary, TagUsage};
use crate::services::{CreateTagInput, UpdateTagInput};

/// Query parameters for the tag list endpoint
#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    /// Substring query; present means suggestion mode
    pub query: Option<String>,
    pub status: Option<TagStatus>,
    pub category: Option<TagCategory>,
    pub entity_type: Option<EntityType>,
    /// Comma-separated slugs for a batch lookup
    pub slugs: Option<String>,
}

/// Response for suggestion search and listing
#[derive(Debug, Serialize, Deserialize)]
pub struct TagListResponse {
    pub tags: Vec<TagSummary>,
}

/// Response for a batch slug lookup
#[derive(Debug, Serialize, Deserialize)]
pub struct TagLookupResponse {
    pub tags: Vec<Tag>,
}

/// Response for resolve: the tag plus whether this call minted it
#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub tag: Tag,
    pub created: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub input: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TagStatus,
}

#[derive(Debug, Deserialize)]
pub struct AliasRequest {
    pub slug: String,
    pub alias: String,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub source: String,
    pub target: String,
}

/// Query parameters for the stats endpoints
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub entity_type: Option<EntityType>,
    #[serde(default = "default_stats_limit")]
    pub limit: i64,
}

fn default_stats_limit() -> i64 {
    20
}

/// Query parameters for co-occurrence
#[derive(Debug, Deserialize)]
pub struct CooccurrenceQuery {
    pub slug: String,
    pub entity_type: Option<EntityType>,
    #[serde(default = "default_stats_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagUsageResponse {
    pub tags: Vec<TagUsage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryBreakdownResponse {
    pub categories: Vec<TagCategoryCount>,
}

/// Bulk assignment change for one entity
#[derive(Debug, Deserialize)]
pub struct AssignmentRequest {
    pub entity_type: EntityType,
    pub entity_key: String,
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

/// Entity's tag list after an assignment change
#[derive(Debug, Serialize, Deserialize)]
pub struct AssignmentResponse {
    pub entity_type: EntityType,
    pub entity_key: String,
    pub tags: Vec<String>,
}

/// Build the tags router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/resolve", post(resolve_tag))
        .route("/merge", post(merge_tags))
        .route("/alias", post(add_alias))
        .route("/stats/top", get(top_tags))
        .route("/stats/cooccurrence", get(cooccurrence))
        .route("/stats/categories", get(category_breakdown))
        .route("/{slug}", get(get_tag).put(update_tag))
        .route("/{slug}/status", patch(set_status))
}

/// GET /api/v1/tags - Suggestion search, listing, or batch lookup
async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<ListTagsQuery>,
) -> Result<axum::response::Response, ApiError> {
    use axum::response::IntoResponse;

    // Batch lookup short-circuits the search path
    if let Some(slugs) = &query.slugs {
        let slugs: Vec<String> = slugs
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let tags = state.tag_service.list_by_slugs(&slugs).await?;
        return Ok(Json(TagLookupResponse { tags }).into_response());
    }

    let params = TagSearch {
        query: query.query,
        status: query.status,
        category: query.category,
        entity_type: query.entity_type,
    };
    let tags = state.tag_service.search(&params).await?;
    Ok(Json(TagListResponse { tags }).into_response())
}

/// POST /api/v1/tags - Create a curated tag
async fn create_tag(
    State(state): State<AppState>,
    Json(input): Json<CreateTagInput>,
) -> Result<(axum::http::StatusCode, Json<Tag>), ApiError> {
    let tag = state.tag_service.create(input).await?;
    Ok((axum::http::StatusCode::CREATED, Json(tag)))
}

/// GET /api/v1/tags/:slug - Single tag with usage count
async fn get_tag(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<TagSummary>, ApiError> {
    let summary = state.tag_service.get(&slug).await?;
    Ok(Json(summary))
}

/// PUT /api/v1/tags/:slug - Edit a tag's metadata
async fn update_tag(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<UpdateTagInput>,
) -> Result<Json<Tag>, ApiError> {
    let tag = state.tag_service.update(&slug, input).await?;
    Ok(Json(tag))
}

/// PATCH /api/v1/tags/:slug/status - Change lifecycle status
async fn set_status(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Tag>, ApiError> {
    let tag = state.tag_service.set_status(&slug, req.status).await?;
    Ok(Json(tag))
}

/// POST /api/v1/tags/alias - Register an alias for a tag
async fn add_alias(
    State(state): State<AppState>,
    Json(req): Json<AliasRequest>,
) -> Result<Json<Tag>, ApiError> {
    let tag = state.tag_service.add_alias(&req.slug, &req.alias).await?;
    Ok(Json(tag))
}

/// POST /api/v1/tags/resolve - Resolve free text to a canonical tag
async fn resolve_tag(
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let (tag, created) = state.tag_service.resolve(&req.input).await?;
    Ok(Json(ResolveResponse { tag, created }))
}

/// POST /api/v1/tags/merge - Merge one tag into another
async fn merge_tags(
    State(state): State<AppState>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<TagMergeResult>, ApiError> {
    let result = state.tag_service.merge(&req.source, &req.target).await?;
    Ok(Json(result))
}

/// GET /api/v1/tags/stats/top - Most-used tags
async fn top_tags(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<TagUsageResponse>, ApiError> {
    let tags = state
        .tag_service
        .top_tags(query.entity_type, query.limit)
        .await?;
    Ok(Json(TagUsageResponse { tags }))
}

/// GET /api/v1/tags/stats/cooccurrence - Tags co-assigned with a tag
async fn cooccurrence(
    State(state): State<AppState>,
    Query(query): Query<CooccurrenceQuery>,
) -> Result<Json<TagUsageResponse>, ApiError> {
    let tags = state
        .tag_service
        .cooccurrence(&query.slug, query.entity_type, query.limit)
        .await?;
    Ok(Json(TagUsageResponse { tags }))
}

/// GET /api/v1/tags/stats/categories - Distinct assigned tags per category
async fn category_breakdown(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<CategoryBreakdownResponse>, ApiError> {
    let categories = state
        .tag_service
        .category_breakdown(query.entity_type)
        .await?;
    Ok(Json(CategoryBreakdownResponse { categories }))
}

/// POST /api/v1/tag-assignments - Bulk assignment change for one entity
pub async fn apply_assignments(
    State(state): State<AppState>,
    Json(req): Json<AssignmentRequest>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let tags = state
        .tag_service
        .apply_assignments(req.entity_type, &req.entity_key, &req.add, &req.remove)
        .await?;
    Ok(Json(AssignmentResponse {
        entity_type: req.entity_type,
        entity_key: req.entity_key,
        tags,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::setup_test_server;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_resolve_roundtrip() {
        let server = setup_test_server().await;

        let resp = server
            .post("/api/v1/tags/resolve")
            .json(&json!({"input": "Oxidised Silver"}))
            .await;
        resp.assert_status(StatusCode::OK);
        let body: ResolveResponse = resp.json();
        assert!(body.created);
        assert_eq!(body.tag.slug, "oxidised-silver");

        let resp = server
            .post("/api/v1/tags/resolve")
            .json(&json!({"input": "oxidised silver"}))
            .await;
        let body: ResolveResponse = resp.json();
        assert!(!body.created);
        assert_eq!(body.tag.slug, "oxidised-silver");
    }

    #[tokio::test]
    async fn test_resolve_rejects_blank() {
        let server = setup_test_server().await;

        let resp = server
            .post("/api/v1/tags/resolve")
            .json(&json!({"input": "   "}))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_get_update_flow() {
        let server = setup_test_server().await;

        let resp = server
            .post("/api/v1/tags")
            .json(&json!({
                "display_name": "Kundan",
                "category": "technique",
                "aliases": ["kundankari"]
            }))
            .await;
        resp.assert_status(StatusCode::CREATED);
        let tag: Tag = resp.json();
        assert_eq!(tag.slug, "kundan");
        assert_eq!(tag.status, TagStatus::Active);

        let resp = server.get("/api/v1/tags/kundan").await;
        resp.assert_status(StatusCode::OK);
        let summary: TagSummary = resp.json();
        assert_eq!(summary.usage_count, 0);
        assert!(summary.tag.aliases.contains(&"kundankari".to_string()));

        let resp = server
            .put("/api/v1/tags/kundan")
            .json(&json!({"description": "Glass-set gold work"}))
            .await;
        resp.assert_status(StatusCode::OK);
        let updated: Tag = resp.json();
        assert_eq!(updated.description, Some("Glass-set gold work".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let server = setup_test_server().await;

        let body = json!({"display_name": "Kundan"});
        server.post("/api/v1/tags").json(&body).await.assert_status(StatusCode::CREATED);
        let resp = server.post("/api/v1/tags").json(&body).await;
        resp.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_get_missing_tag_404() {
        let server = setup_test_server().await;
        let resp = server.get("/api/v1/tags/ghost").await;
        resp.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_suggestion_search_and_filters() {
        let server = setup_test_server().await;

        for input in ["Silver", "Silk Thread", "Gold"] {
            server
                .post("/api/v1/tags/resolve")
                .json(&json!({"input": input}))
                .await
                .assert_status(StatusCode::OK);
        }

        let resp = server.get("/api/v1/tags").add_query_param("query", "sil").await;
        resp.assert_status(StatusCode::OK);
        let body: TagListResponse = resp.json();
        let slugs: Vec<&str> = body.tags.iter().map(|t| t.tag.slug.as_str()).collect();
        assert_eq!(slugs, vec!["silk-thread", "silver"]);

        // Blank query means nothing typed yet
        let resp = server.get("/api/v1/tags").add_query_param("query", " ").await;
        let body: TagListResponse = resp.json();
        assert!(body.tags.is_empty());

        // No query lists everything
        let resp = server.get("/api/v1/tags").await;
        let body: TagListResponse = resp.json();
        assert_eq!(body.tags.len(), 3);
    }

    #[tokio::test]
    async fn test_batch_lookup_omits_unknown() {
        let server = setup_test_server().await;

        server
            .post("/api/v1/tags/resolve")
            .json(&json!({"input": "Silver"}))
            .await
            .assert_status(StatusCode::OK);

        let resp = server
            .get("/api/v1/tags")
            .add_query_param("slugs", "silver,ghost")
            .await;
        resp.assert_status(StatusCode::OK);
        let body: TagLookupResponse = resp.json();
        assert_eq!(body.tags.len(), 1);
        assert_eq!(body.tags[0].slug, "silver");
    }

    #[tokio::test]
    async fn test_alias_and_status_endpoints() {
        let server = setup_test_server().await;

        server
            .post("/api/v1/tags/resolve")
            .json(&json!({"input": "Silver"}))
            .await
            .assert_status(StatusCode::OK);

        let resp = server
            .post("/api/v1/tags/alias")
            .json(&json!({"slug": "silver", "alias": "925"}))
            .await;
        resp.assert_status(StatusCode::OK);

        let resp = server
            .patch("/api/v1/tags/silver/status")
            .json(&json!({"status": "active"}))
            .await;
        resp.assert_status(StatusCode::OK);
        let tag: Tag = resp.json();
        assert_eq!(tag.status, TagStatus::Active);

        // Alias now resolves to the tag
        let resp = server
            .post("/api/v1/tags/resolve")
            .json(&json!({"input": "925"}))
            .await;
        let body: ResolveResponse = resp.json();
        assert!(!body.created);
        assert_eq!(body.tag.slug, "silver");
    }

    #[tokio::test]
    async fn test_assignments_and_stats() {
        let server = setup_test_server().await;

        for input in ["Silver", "Enamel"] {
            server
                .post("/api/v1/tags/resolve")
                .json(&json!({"input": input}))
                .await
                .assert_status(StatusCode::OK);
        }

        let resp = server
            .post("/api/v1/tag-assignments")
            .json(&json!({
                "entity_type": "vendor",
                "entity_key": "v1",
                "add": ["silver", "enamel"]
            }))
            .await;
        resp.assert_status(StatusCode::OK);
        let body: AssignmentResponse = resp.json();
        assert_eq!(body.tags, vec!["enamel".to_string(), "silver".to_string()]);

        let resp = server.get("/api/v1/tags/stats/top").await;
        resp.assert_status(StatusCode::OK);
        let body: TagUsageResponse = resp.json();
        assert_eq!(body.tags.len(), 2);

        let resp = server
            .get("/api/v1/tags/stats/cooccurrence")
            .add_query_param("slug", "silver")
            .await;
        resp.assert_status(StatusCode::OK);
        let body: TagUsageResponse = resp.json();
        assert_eq!(body.tags.len(), 1);
        assert_eq!(body.tags[0].slug, "enamel");

        let resp = server.get("/api/v1/tags/stats/categories").await;
        resp.assert_status(StatusCode::OK);
        let body: CategoryBreakdownResponse = resp.json();
        assert_eq!(body.categories.len(), 1);
    }

    #[tokio::test]
    async fn test_stats_limit_bounds() {
        let server = setup_test_server().await;

        let resp = server
            .get("/api/v1/tags/stats/top")
            .add_query_param("limit", "0")
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);

        let resp = server
            .get("/api/v1/tags/stats/top")
            .add_query_param("limit", "101")
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_merge_endpoint() {
        let server = setup_test_server().await;

        for input in ["Sterling", "Silver"] {
            server
                .post("/api/v1/tags/resolve")
                .json(&json!({"input": input}))
                .await
                .assert_status(StatusCode::OK);
        }

        let resp = server
            .post("/api/v1/tags/merge")
            .json(&json!({"source": "sterling", "target": "silver"}))
            .await;
        resp.assert_status(StatusCode::OK);
        let result: TagMergeResult = resp.json();
        assert_eq!(result.target.slug, "silver");
        assert!(result.target.aliases.contains(&"sterling".to_string()));

        server.get("/api/v1/tags/sterling").await.assert_status(StatusCode::NOT_FOUND);

        // Merging into itself is rejected
        let resp = server
            .post("/api/v1/tags/merge")
            .json(&json!({"source": "silver", "target": "silver"}))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }
}

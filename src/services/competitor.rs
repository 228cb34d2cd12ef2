//! Competitor service
//!
//! CRUD over tracked competitor storefronts. Free-text tag entries on
//! writes are resolved to canonical slugs and mirrored into the tag
//! index.

use crate::db::repositories::{is_unique_violation, CompetitorRepository};
use crate::models::{Competitor, CompetitorPriority, EntityType, PrimaryPlatform};
use crate::services::tag::{TagService, TagServiceError};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Error types for competitor service operations
#[derive(Debug, thiserror::Error)]
pub enum CompetitorServiceError {
    /// Competitor not found
    #[error("Competitor not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Business name already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Error from the tag subsystem
    #[error(transparent)]
    Tag(#[from] TagServiceError),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Fields accepted when registering a competitor
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCompetitorInput {
    pub business_name: String,
    pub website_url: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub price_range: Option<String>,
    pub instagram_handle: Option<String>,
    pub instagram_followers: Option<i64>,
    pub primary_platform: Option<PrimaryPlatform>,
    pub intel_score: Option<i64>,
    #[serde(default)]
    pub priority: CompetitorPriority,
    #[serde(default)]
    pub watchlist: bool,
    pub notes: Option<String>,
    /// Free-text tag entries, resolved on write
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCompetitorInput {
    pub website_url: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub categories: Option<Vec<String>>,
    pub price_range: Option<String>,
    pub instagram_handle: Option<String>,
    pub instagram_followers: Option<i64>,
    pub primary_platform: Option<PrimaryPlatform>,
    pub intel_score: Option<i64>,
    pub priority: Option<CompetitorPriority>,
    pub watchlist: Option<bool>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Competitor service
pub struct CompetitorService {
    repo: Arc<dyn CompetitorRepository>,
    tags: Arc<TagService>,
}

impl CompetitorService {
    /// Create a new competitor service
    pub fn new(repo: Arc<dyn CompetitorRepository>, tags: Arc<TagService>) -> Self {
        Self { repo, tags }
    }

    fn check_intel_score(score: Option<i64>) -> Result<(), CompetitorServiceError> {
        if let Some(score) = score {
            if !(0..=100).contains(&score) {
                return Err(CompetitorServiceError::ValidationError(
                    "intel_score must be between 0 and 100".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Register a competitor
    pub async fn create(
        &self,
        input: CreateCompetitorInput,
    ) -> Result<Competitor, CompetitorServiceError> {
        let business_name = input.business_name.trim().to_string();
        if business_name.is_empty() {
            return Err(CompetitorServiceError::ValidationError(
                "Business name cannot be empty".to_string(),
            ));
        }
        Self::check_intel_score(input.intel_score)?;

        let tags = self.tags.resolve_tag_list(&input.tags).await?;

        let mut competitor = Competitor::new(business_name);
        competitor.website_url = input.website_url;
        competitor.country = input.country;
        competitor.city = input.city;
        competitor.categories = input.categories;
        competitor.price_range = input.price_range;
        competitor.instagram_handle = input.instagram_handle;
        competitor.instagram_followers = input.instagram_followers;
        competitor.primary_platform = input.primary_platform;
        competitor.intel_score = input.intel_score;
        competitor.priority = input.priority;
        competitor.watchlist = input.watchlist;
        competitor.notes = input.notes;
        competitor.tags = tags.clone();

        let created = match self.repo.create(&competitor).await {
            Ok(created) => created,
            Err(err) if is_unique_violation(&err) => {
                return Err(CompetitorServiceError::Conflict(format!(
                    "Competitor already exists: {}",
                    competitor.business_name
                )))
            }
            Err(err) => return Err(err.into()),
        };

        self.tags
            .sync_index(
                EntityType::Competitor,
                &created.business_name,
                &[],
                &tags,
            )
            .await?;

        Ok(created)
    }

    /// Get a competitor by business name
    pub async fn get(&self, business_name: &str) -> Result<Competitor, CompetitorServiceError> {
        self.repo
            .get(business_name)
            .await
            .context("Failed to get competitor")?
            .ok_or_else(|| CompetitorServiceError::NotFound(business_name.to_string()))
    }

    /// List all competitors, most recently updated first
    pub async fn list(&self) -> Result<Vec<Competitor>, CompetitorServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list competitors")
            .map_err(Into::into)
    }

    /// Update a competitor
    pub async fn update(
        &self,
        business_name: &str,
        input: UpdateCompetitorInput,
    ) -> Result<Competitor, CompetitorServiceError> {
        let mut competitor = self.get(business_name).await?;
        let prev_tags = competitor.tags.clone();

        if input.website_url.is_some() {
            competitor.website_url = input.website_url;
        }
        if input.country.is_some() {
            competitor.country = input.country;
        }
        if input.city.is_some() {
            competitor.city = input.city;
        }
        if let Some(categories) = input.categories {
            competitor.categories = categories;
        }
        if input.price_range.is_some() {
            competitor.price_range = input.price_range;
        }
        if input.instagram_handle.is_some() {
            competitor.instagram_handle = input.instagram_handle;
        }
        if input.instagram_followers.is_some() {
            competitor.instagram_followers = input.instagram_followers;
        }
        if input.primary_platform.is_some() {
            competitor.primary_platform = input.primary_platform;
        }
        if input.intel_score.is_some() {
            Self::check_intel_score(input.intel_score)?;
            competitor.intel_score = input.intel_score;
        }
        if let Some(priority) = input.priority {
            competitor.priority = priority;
        }
        if let Some(watchlist) = input.watchlist {
            competitor.watchlist = watchlist;
        }
        if input.notes.is_some() {
            competitor.notes = input.notes;
        }
        if let Some(raw_tags) = input.tags {
            competitor.tags = self.tags.resolve_tag_list(&raw_tags).await?;
        }

        let updated = self
            .repo
            .update(&competitor)
            .await
            .context("Failed to update competitor")?;

        self.tags
            .sync_index(
                EntityType::Competitor,
                &updated.business_name,
                &prev_tags,
                &updated.tags,
            )
            .await?;

        Ok(updated)
    }

    /// Delete a competitor and drop its tag assignments
    pub async fn delete(&self, business_name: &str) -> Result<(), CompetitorServiceError> {
        let deleted = self
            .repo
            .delete(business_name)
            .await
            .context("Failed to delete competitor")?;
        if !deleted {
            return Err(CompetitorServiceError::NotFound(business_name.to_string()));
        }
        self.tags
            .clear_entity(EntityType::Competitor, business_name)
            .await?;
        Ok(())
    }
}

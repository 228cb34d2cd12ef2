//! Tag service
//!
//! Business logic for the tag subsystem:
//! - resolving free-text input to canonical tags (create-on-miss)
//! - curation: create, update, status changes, aliases, merge
//! - suggestion search and the usage statistics
//! - assignment bookkeeping used by the entity services
//!
//! The resolver never fails on "already exists": matching an existing tag
//! is the normal, successful outcome.

use crate::db::repositories::{
    is_unique_violation, CompetitorRepository, TagIndexRepository, TagRepository, TagSearch,
    VendorRepository, WishlistRepository,
};
use crate::models::{
    EntityType, Tag, TagCategory, TagCategoryCount, TagMergeResult, TagStatus, TagSummary,
    TagUsage,
};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Maximum accepted length of a free-text tag input, after trimming
pub const MAX_TAG_INPUT_LEN: usize = 64;

/// Maximum limit for the stats endpoints
pub const MAX_STATS_LIMIT: i64 = 100;

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    /// Tag not found
    #[error("Tag not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Alias already points at a different tag
    #[error("Alias conflict: {0}")]
    AliasConflict(String),

    /// Operation conflicts with current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Fields accepted when creating a tag through curation
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateTagInput {
    /// Explicit slug; derived from the display name when absent
    pub slug: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub category: TagCategory,
    /// Curated tags default to active, unlike resolver-created drafts
    #[serde(default = "default_curated_status")]
    pub status: TagStatus,
    pub description: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

fn default_curated_status() -> TagStatus {
    TagStatus::Active
}

/// Editable fields of an existing tag
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct UpdateTagInput {
    pub display_name: Option<String>,
    pub category: Option<TagCategory>,
    pub description: Option<String>,
}

/// Denormalized entity stores swept after a merge
#[derive(Clone)]
pub struct EntityStores {
    pub competitors: Arc<dyn CompetitorRepository>,
    pub vendors: Arc<dyn VendorRepository>,
    pub wishlist: Arc<dyn WishlistRepository>,
}

/// Tag service
pub struct TagService {
    repo: Arc<dyn TagRepository>,
    index: Arc<dyn TagIndexRepository>,
    stores: Option<EntityStores>,
}

impl TagService {
    /// Create a new tag service
    pub fn new(repo: Arc<dyn TagRepository>, index: Arc<dyn TagIndexRepository>) -> Self {
        Self {
            repo,
            index,
            stores: None,
        }
    }

    /// Attach the entity stores so merges can rewrite denormalized tag lists
    pub fn with_entity_stores(mut self, stores: EntityStores) -> Self {
        self.stores = Some(stores);
        self
    }

    // ------------------------------------------------------------------
    // Resolver
    // ------------------------------------------------------------------

    /// Resolve free-text input to a canonical tag, creating a draft tag on
    /// a miss. Returns the tag and whether it was created by this call.
    ///
    /// Lookup order: exact slug (accepted only when the hit belongs to
    /// this input), then case-insensitive display name or alias. New tags
    /// get the candidate slug, with a numeric suffix when the slug is
    /// held by an unrelated tag. Losing a creation race to an identical
    /// resolve returns the winner with `created = false`.
    pub async fn resolve(&self, input: &str) -> Result<(Tag, bool), TagServiceError> {
        let normalized = normalize_input(input);
        if normalized.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Tag input cannot be empty".to_string(),
            ));
        }
        if normalized.chars().count() > MAX_TAG_INPUT_LEN {
            return Err(TagServiceError::ValidationError(format!(
                "Tag input exceeds {} characters",
                MAX_TAG_INPUT_LEN
            )));
        }

        let base_slug = slugify(&normalized);
        if base_slug.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Tag input contains no usable characters".to_string(),
            ));
        }

        let mut candidate = base_slug.clone();
        let mut suffix = 2;

        if let Some(existing) = self
            .repo
            .get_by_slug(&base_slug)
            .await
            .context("Failed to check slug")?
        {
            // The slug hit only counts when it is actually this input's
            // tag; a different display name that happens to normalize to
            // the same slug gets its own suffixed tag instead.
            if matches_input(&existing, &normalized) {
                return Ok((existing, false));
            }
            candidate = format!("{}-{}", base_slug, suffix);
            suffix += 1;
        }

        if let Some(existing) = self
            .repo
            .find_by_name_or_alias(&normalized)
            .await
            .context("Failed to check name and aliases")?
        {
            return Ok((existing, false));
        }

        loop {
            let tag = Tag::new(candidate.clone(), normalized.clone());
            match self.repo.create(&tag).await {
                Ok(created) => return Ok((created, true)),
                Err(err) if is_unique_violation(&err) => {
                    // Someone beat us to this slug. An identical resolve
                    // racing us wins outright; an unrelated tag means we
                    // try the next suffix.
                    if let Some(existing) = self
                        .repo
                        .get_by_slug(&candidate)
                        .await
                        .context("Failed to re-read after slug race")?
                    {
                        if matches_input(&existing, &normalized) {
                            return Ok((existing, false));
                        }
                    }
                    candidate = format!("{}-{}", base_slug, suffix);
                    suffix += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Resolve a list of free-text entries to slugs, deduplicated with
    /// input order preserved.
    pub async fn resolve_tag_list(&self, inputs: &[String]) -> Result<Vec<String>, TagServiceError> {
        let mut slugs = Vec::new();
        for input in inputs {
            let (tag, _) = self.resolve(input).await?;
            if !slugs.contains(&tag.slug) {
                slugs.push(tag.slug);
            }
        }
        Ok(slugs)
    }

    // ------------------------------------------------------------------
    // Store / curation
    // ------------------------------------------------------------------

    /// Get a tag with its usage count
    pub async fn get(&self, slug: &str) -> Result<TagSummary, TagServiceError> {
        let tag = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| TagServiceError::NotFound(slug.to_string()))?;
        let usage_count = self
            .index
            .usage_count(slug)
            .await
            .context("Failed to count usage")?;
        Ok(TagSummary::new(tag, usage_count))
    }

    /// Fetch tags for a set of slugs; unknown slugs are silently omitted
    pub async fn list_by_slugs(&self, slugs: &[String]) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .list_by_slugs(slugs)
            .await
            .context("Failed to list tags by slugs")
            .map_err(Into::into)
    }

    /// Search or list tags.
    ///
    /// A present-but-blank query is a suggestion request with nothing
    /// typed yet and returns no results; an absent query lists everything
    /// the filters allow.
    pub async fn search(&self, params: &TagSearch) -> Result<Vec<TagSummary>, TagServiceError> {
        if let Some(query) = &params.query {
            if query.trim().is_empty() {
                return Ok(Vec::new());
            }
        }
        self.repo
            .search(params)
            .await
            .context("Failed to search tags")
            .map_err(Into::into)
    }

    /// Create a tag through curation, with an explicit slug and metadata
    pub async fn create(&self, input: CreateTagInput) -> Result<Tag, TagServiceError> {
        let display_name = normalize_input(&input.display_name);
        if display_name.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Display name cannot be empty".to_string(),
            ));
        }

        let slug = slugify(input.slug.as_deref().unwrap_or(&display_name));
        if slug.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Slug contains no usable characters".to_string(),
            ));
        }

        if self
            .repo
            .get_by_slug(&slug)
            .await
            .context("Failed to check slug")?
            .is_some()
        {
            return Err(TagServiceError::Conflict(format!(
                "Tag already exists: {}",
                slug
            )));
        }

        for alias in &input.aliases {
            if let Some(owner) = self
                .repo
                .find_alias(alias)
                .await
                .context("Failed to check alias")?
            {
                return Err(TagServiceError::AliasConflict(format!(
                    "Alias '{}' already points to '{}'",
                    alias, owner
                )));
            }
        }

        let tag = Tag {
            slug,
            display_name,
            category: input.category,
            status: input.status,
            aliases: input.aliases,
            description: input.description,
            ..Tag::new(String::new(), String::new())
        };

        self.repo
            .create(&tag)
            .await
            .context("Failed to create tag")
            .map_err(Into::into)
    }

    /// Update the editable fields of a tag. The slug never changes.
    pub async fn update(&self, slug: &str, input: UpdateTagInput) -> Result<Tag, TagServiceError> {
        let mut tag = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| TagServiceError::NotFound(slug.to_string()))?;

        if let Some(display_name) = input.display_name {
            let display_name = normalize_input(&display_name);
            if display_name.is_empty() {
                return Err(TagServiceError::ValidationError(
                    "Display name cannot be empty".to_string(),
                ));
            }
            tag.display_name = display_name;
        }
        if let Some(category) = input.category {
            tag.category = category;
        }
        if let Some(description) = input.description {
            tag.description = Some(description);
        }

        self.repo
            .update(&tag)
            .await
            .context("Failed to update tag")
            .map_err(Into::into)
    }

    /// Change a tag's lifecycle status
    pub async fn set_status(&self, slug: &str, status: TagStatus) -> Result<Tag, TagServiceError> {
        let mut tag = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| TagServiceError::NotFound(slug.to_string()))?;

        tag.status = status;
        self.repo
            .update(&tag)
            .await
            .context("Failed to update status")
            .map_err(Into::into)
    }

    /// Register an alias for a tag.
    ///
    /// Re-adding an alias the tag already owns is a no-op; an alias owned
    /// by a different tag is a conflict.
    pub async fn add_alias(&self, slug: &str, alias: &str) -> Result<Tag, TagServiceError> {
        let alias = normalize_input(alias);
        if alias.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Alias cannot be empty".to_string(),
            ));
        }

        let tag = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| TagServiceError::NotFound(slug.to_string()))?;

        match self
            .repo
            .find_alias(&alias)
            .await
            .context("Failed to check alias")?
        {
            Some(owner) if owner == tag.slug => return Ok(tag),
            Some(owner) => {
                return Err(TagServiceError::AliasConflict(format!(
                    "Alias '{}' already points to '{}'",
                    alias, owner
                )))
            }
            None => {}
        }

        match self.repo.add_alias(&tag.slug, &alias).await {
            Ok(()) => {}
            Err(err) if is_unique_violation(&err) => {
                // Raced with another writer; accept if they claimed it for us
                let owner = self
                    .repo
                    .find_alias(&alias)
                    .await
                    .context("Failed to re-check alias")?;
                if owner.as_deref() != Some(tag.slug.as_str()) {
                    return Err(TagServiceError::AliasConflict(format!(
                        "Alias '{}' already points to '{}'",
                        alias,
                        owner.unwrap_or_default()
                    )));
                }
            }
            Err(err) => return Err(err.into()),
        }

        self.get(&tag.slug).await.map(|summary| summary.tag)
    }

    /// Merge `source` into `target`.
    ///
    /// Assignments and aliases move to the target, the source slug becomes
    /// an alias of the target, the source tag is removed, and the
    /// denormalized entity tag lists are rewritten.
    pub async fn merge(&self, source: &str, target: &str) -> Result<TagMergeResult, TagServiceError> {
        if source == target {
            return Err(TagServiceError::ValidationError(
                "Cannot merge a tag into itself".to_string(),
            ));
        }

        self.repo
            .get_by_slug(source)
            .await
            .context("Failed to get source tag")?
            .ok_or_else(|| TagServiceError::NotFound(source.to_string()))?;

        let target_tag = self
            .repo
            .get_by_slug(target)
            .await
            .context("Failed to get target tag")?
            .ok_or_else(|| TagServiceError::NotFound(target.to_string()))?;

        if target_tag.status == TagStatus::Deprecated {
            return Err(TagServiceError::Conflict(format!(
                "Cannot merge into deprecated tag: {}",
                target
            )));
        }

        self.repo
            .merge(source, target)
            .await
            .context("Failed to merge tags")?;

        let updated_counts = self.sweep_entities(source, target).await?;

        let target_tag = self
            .repo
            .get_by_slug(target)
            .await
            .context("Failed to re-read target")?
            .ok_or_else(|| TagServiceError::NotFound(target.to_string()))?;

        Ok(TagMergeResult {
            target: target_tag,
            source: source.to_string(),
            updated_counts,
        })
    }

    /// Rewrite denormalized tag lists after a merge
    async fn sweep_entities(
        &self,
        source: &str,
        target: &str,
    ) -> Result<BTreeMap<String, u64>, TagServiceError> {
        let mut counts = BTreeMap::new();
        let Some(stores) = &self.stores else {
            return Ok(counts);
        };

        let mut competitor_count = 0u64;
        for competitor in stores
            .competitors
            .list()
            .await
            .context("Failed to list competitors")?
        {
            if let Some(tags) = replace_slug(&competitor.tags, source, target) {
                stores
                    .competitors
                    .update_tags(&competitor.business_name, &tags)
                    .await
                    .context("Failed to rewrite competitor tags")?;
                competitor_count += 1;
            }
        }
        counts.insert(EntityType::Competitor.as_str().to_string(), competitor_count);

        let mut vendor_count = 0u64;
        for vendor in stores.vendors.list().await.context("Failed to list vendors")? {
            if let Some(tags) = replace_slug(&vendor.tags, source, target) {
                stores
                    .vendors
                    .update_tags(&vendor.vendor_id, &tags)
                    .await
                    .context("Failed to rewrite vendor tags")?;
                vendor_count += 1;
            }
        }
        counts.insert(EntityType::Vendor.as_str().to_string(), vendor_count);

        let mut wishlist_count = 0u64;
        for item in stores
            .wishlist
            .list()
            .await
            .context("Failed to list wishlist items")?
        {
            if let Some(tags) = replace_slug(&item.tags, source, target) {
                stores
                    .wishlist
                    .update_tags(&item.wish_id, &tags)
                    .await
                    .context("Failed to rewrite wishlist tags")?;
                wishlist_count += 1;
            }
        }
        counts.insert(EntityType::Wishlist.as_str().to_string(), wishlist_count);

        Ok(counts)
    }

    // ------------------------------------------------------------------
    // Index
    // ------------------------------------------------------------------

    /// A tag must exist and not be deprecated to be assigned
    async fn ensure_assignable(&self, slug: &str) -> Result<(), TagServiceError> {
        let tag = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| TagServiceError::NotFound(slug.to_string()))?;
        if tag.status == TagStatus::Deprecated {
            return Err(TagServiceError::Conflict(format!(
                "Cannot assign deprecated tag: {}",
                slug
            )));
        }
        Ok(())
    }

    /// Apply add/remove slug lists to an entity and return its final tags
    pub async fn apply_assignments(
        &self,
        entity_type: EntityType,
        entity_key: &str,
        add: &[String],
        remove: &[String],
    ) -> Result<Vec<String>, TagServiceError> {
        for slug in add {
            self.ensure_assignable(slug).await?;
        }
        for slug in add {
            self.index
                .assign(slug, entity_type, entity_key)
                .await
                .context("Failed to assign tag")?;
        }
        for slug in remove {
            self.index
                .unassign(slug, entity_type, entity_key)
                .await
                .context("Failed to unassign tag")?;
        }
        self.index
            .slugs_for_entity(entity_type, entity_key)
            .await
            .context("Failed to list entity tags")
            .map_err(Into::into)
    }

    /// Bring the index in line with an entity's new tag list
    pub async fn sync_index(
        &self,
        entity_type: EntityType,
        entity_key: &str,
        prev: &[String],
        next: &[String],
    ) -> Result<(), TagServiceError> {
        for slug in next {
            if !prev.contains(slug) {
                self.index
                    .assign(slug, entity_type, entity_key)
                    .await
                    .context("Failed to assign tag")?;
            }
        }
        for slug in prev {
            if !next.contains(slug) {
                self.index
                    .unassign(slug, entity_type, entity_key)
                    .await
                    .context("Failed to unassign tag")?;
            }
        }
        Ok(())
    }

    /// Drop every assignment an entity holds (entity deletion)
    pub async fn clear_entity(
        &self,
        entity_type: EntityType,
        entity_key: &str,
    ) -> Result<(), TagServiceError> {
        self.index
            .unassign_all(entity_type, entity_key)
            .await
            .context("Failed to clear entity assignments")
            .map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    fn check_limit(limit: i64) -> Result<(), TagServiceError> {
        if !(1..=MAX_STATS_LIMIT).contains(&limit) {
            return Err(TagServiceError::ValidationError(format!(
                "limit must be between 1 and {}",
                MAX_STATS_LIMIT
            )));
        }
        Ok(())
    }

    /// Most-used tags, optionally restricted to one entity type
    pub async fn top_tags(
        &self,
        entity_type: Option<EntityType>,
        limit: i64,
    ) -> Result<Vec<TagUsage>, TagServiceError> {
        Self::check_limit(limit)?;
        self.index
            .top_tags(entity_type, limit)
            .await
            .context("Failed to compute top tags")
            .map_err(Into::into)
    }

    /// Tags co-occurring with the given tag
    pub async fn cooccurrence(
        &self,
        slug: &str,
        entity_type: Option<EntityType>,
        limit: i64,
    ) -> Result<Vec<TagUsage>, TagServiceError> {
        Self::check_limit(limit)?;
        if self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get tag")?
            .is_none()
        {
            return Err(TagServiceError::NotFound(slug.to_string()));
        }
        self.index
            .cooccurrence(slug, entity_type, limit)
            .await
            .context("Failed to compute co-occurrence")
            .map_err(Into::into)
    }

    /// Distinct assigned tags per category
    pub async fn category_breakdown(
        &self,
        entity_type: Option<EntityType>,
    ) -> Result<Vec<TagCategoryCount>, TagServiceError> {
        self.index
            .category_breakdown(entity_type)
            .await
            .context("Failed to compute category breakdown")
            .map_err(Into::into)
    }
}

/// Trim and collapse internal whitespace
fn normalize_input(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derive a slug: lowercase, runs of non-alphanumerics become single
/// hyphens, leading and trailing hyphens dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::new();
    let mut prev_hyphen = true;
    for c in input.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Whether a normalized input belongs to this tag: it is the slug
/// itself, or matches the display name or an alias case-insensitively.
fn matches_input(tag: &Tag, normalized: &str) -> bool {
    normalized.eq_ignore_ascii_case(&tag.slug)
        || tag.display_name.eq_ignore_ascii_case(normalized)
        || tag
            .aliases
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(normalized))
}

/// Replace `source` with `target` in a tag list, deduplicating while
/// preserving order. Returns None when the list doesn't contain `source`.
fn replace_slug(tags: &[String], source: &str, target: &str) -> Option<Vec<String>> {
    if !tags.iter().any(|t| t == source) {
        return None;
    }
    let mut rewritten = Vec::new();
    for tag in tags {
        let slug = if tag == source { target } else { tag.as_str() };
        if !rewritten.iter().any(|t: &String| t == slug) {
            rewritten.push(slug.to_string());
        }
    }
    Some(rewritten)
}

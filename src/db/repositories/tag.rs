//! Tag repository
//!
//! Database operations for the tag store: the `tags` table, the
//! `tag_aliases` lookup table, and the transactional merge that folds one
//! tag into another. Aliases live in their own table so the "one alias,
//! one slug" rule is enforced by a primary key rather than by code.

use crate::models::{EntityType, Tag, TagCategory, TagStatus, TagSummary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

/// Search parameters for tag listing and suggestion queries
#[derive(Debug, Clone, Default)]
pub struct TagSearch {
    /// Case-insensitive substring over display name, slug and aliases
    pub query: Option<String>,
    pub status: Option<TagStatus>,
    pub category: Option<TagCategory>,
    /// Restrict to tags with at least one assignment of this type
    pub entity_type: Option<EntityType>,
}

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Insert a new tag. Fails with a unique violation if the slug is taken;
    /// callers distinguish that case via [`is_unique_violation`].
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    /// Get tag by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// Case-insensitive exact match over display names and aliases
    async fn find_by_name_or_alias(&self, name: &str) -> Result<Option<Tag>>;

    /// Which slug an alias currently points to, if any
    async fn find_alias(&self, alias: &str) -> Result<Option<String>>;

    /// Fetch tags for a set of slugs; missing slugs are silently omitted
    async fn list_by_slugs(&self, slugs: &[String]) -> Result<Vec<Tag>>;

    /// List or search tags with usage counts, ordered by display name
    async fn search(&self, params: &TagSearch) -> Result<Vec<TagSummary>>;

    /// Update the editable fields of a tag (everything but the slug)
    async fn update(&self, tag: &Tag) -> Result<Tag>;

    /// Register an alias for a tag. Fails with a unique violation if the
    /// alias is already taken.
    async fn add_alias(&self, slug: &str, alias: &str) -> Result<()>;

    /// Fold `source` into `target` in a single transaction: assignments
    /// and aliases are re-pointed, the source slug becomes an alias of the
    /// target, and the source row is deleted.
    async fn merge(&self, source: &str, target: &str) -> Result<()>;
}

/// Check whether an error is a database unique-constraint violation
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: SqlitePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &Tag) -> Result<Tag> {
        let now = Utc::now();

        // No context here: callers inspect the raw sqlx error for unique
        // violations when racing on slug creation.
        sqlx::query(
            r#"
            INSERT INTO tags (slug, display_name, category, status, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tag.slug)
        .bind(&tag.display_name)
        .bind(tag.category.as_str())
        .bind(tag.status.as_str())
        .bind(&tag.description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        for alias in &tag.aliases {
            sqlx::query("INSERT INTO tag_aliases (alias_norm, alias, tag_slug) VALUES (?, ?, ?)")
                .bind(alias.to_lowercase())
                .bind(alias)
                .bind(&tag.slug)
                .execute(&self.pool)
                .await?;
        }

        Ok(Tag {
            created_at: now,
            updated_at: now,
            ..tag.clone()
        })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        let row = sqlx::query(
            r#"
            SELECT slug, display_name, category, status, description, created_at, updated_at
            FROM tags
            WHERE slug = ?
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get tag by slug")?;

        match row {
            Some(row) => {
                let mut tag = row_to_tag(&row)?;
                tag.aliases = self.aliases_for(&tag.slug).await?;
                Ok(Some(tag))
            }
            None => Ok(None),
        }
    }

    async fn find_by_name_or_alias(&self, name: &str) -> Result<Option<Tag>> {
        let norm = name.to_lowercase();

        let row = sqlx::query(
            r#"
            SELECT slug FROM tags WHERE lower(display_name) = ?
            UNION
            SELECT tag_slug FROM tag_aliases WHERE alias_norm = ?
            LIMIT 1
            "#,
        )
        .bind(&norm)
        .bind(&norm)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up tag by name or alias")?;

        match row {
            Some(row) => {
                let slug: String = row.get("slug");
                self.get_by_slug(&slug).await
            }
            None => Ok(None),
        }
    }

    async fn find_alias(&self, alias: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT tag_slug FROM tag_aliases WHERE alias_norm = ?")
            .bind(alias.to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up alias")?;

        Ok(row.map(|r| r.get("tag_slug")))
    }

    async fn list_by_slugs(&self, slugs: &[String]) -> Result<Vec<Tag>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; slugs.len()].join(", ");
        let sql = format!(
            r#"
            SELECT slug, display_name, category, status, description, created_at, updated_at
            FROM tags
            WHERE slug IN ({})
            ORDER BY lower(display_name)
            "#,
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for slug in slugs {
            query = query.bind(slug);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list tags by slugs")?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row_to_tag(&row)?);
        }
        self.stitch_aliases(&mut tags).await?;

        Ok(tags)
    }

    async fn search(&self, params: &TagSearch) -> Result<Vec<TagSummary>> {
        let mut sql = String::from(
            r#"
            SELECT t.slug, t.display_name, t.category, t.status, t.description,
                   t.created_at, t.updated_at,
                   COUNT(a.tag_slug) AS usage_count
            FROM tags t
            LEFT JOIN tag_assignments a ON a.tag_slug = t.slug
            WHERE 1 = 1
            "#,
        );
        let mut binds: Vec<String> = Vec::new();

        if let Some(query) = &params.query {
            sql.push_str(
                r#"
                AND (lower(t.display_name) LIKE ? ESCAPE '\'
                     OR t.slug LIKE ? ESCAPE '\'
                     OR EXISTS (SELECT 1 FROM tag_aliases al
                                WHERE al.tag_slug = t.slug
                                  AND al.alias_norm LIKE ? ESCAPE '\'))
                "#,
            );
            let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
            binds.push(pattern.clone());
            binds.push(pattern.clone());
            binds.push(pattern);
        }
        if let Some(status) = params.status {
            sql.push_str(" AND t.status = ?");
            binds.push(status.as_str().to_string());
        } else {
            // Deprecated tags stay out of listings unless asked for
            sql.push_str(" AND t.status != 'deprecated'");
        }
        if let Some(category) = params.category {
            sql.push_str(" AND t.category = ?");
            binds.push(category.as_str().to_string());
        }
        if let Some(entity_type) = params.entity_type {
            sql.push_str(
                r#"
                AND EXISTS (SELECT 1 FROM tag_assignments e
                            WHERE e.tag_slug = t.slug AND e.entity_type = ?)
                "#,
            );
            binds.push(entity_type.as_str().to_string());
        }

        sql.push_str(
            r#"
            GROUP BY t.slug
            ORDER BY lower(t.display_name) ASC
            "#,
        );

        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to search tags")?;

        let mut tags = Vec::new();
        let mut counts = Vec::new();
        for row in rows {
            tags.push(row_to_tag(&row)?);
            counts.push(row.get::<i64, _>("usage_count"));
        }
        self.stitch_aliases(&mut tags).await?;

        Ok(tags
            .into_iter()
            .zip(counts)
            .map(|(tag, count)| TagSummary::new(tag, count))
            .collect())
    }

    async fn update(&self, tag: &Tag) -> Result<Tag> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE tags
            SET display_name = ?, category = ?, status = ?, description = ?, updated_at = ?
            WHERE slug = ?
            "#,
        )
        .bind(&tag.display_name)
        .bind(tag.category.as_str())
        .bind(tag.status.as_str())
        .bind(&tag.description)
        .bind(now)
        .bind(&tag.slug)
        .execute(&self.pool)
        .await
        .context("Failed to update tag")?;

        anyhow::ensure!(result.rows_affected() > 0, "tag not found: {}", tag.slug);

        Ok(Tag {
            updated_at: now,
            ..tag.clone()
        })
    }

    async fn add_alias(&self, slug: &str, alias: &str) -> Result<()> {
        // No context: callers inspect for unique violations.
        sqlx::query("INSERT INTO tag_aliases (alias_norm, alias, tag_slug) VALUES (?, ?, ?)")
            .bind(alias.to_lowercase())
            .bind(alias)
            .bind(slug)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn merge(&self, source: &str, target: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin merge")?;

        // Re-point assignments, skipping ones the target already has
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO tag_assignments (tag_slug, entity_type, entity_key, created_at)
            SELECT ?, entity_type, entity_key, created_at
            FROM tag_assignments
            WHERE tag_slug = ?
            "#,
        )
        .bind(target)
        .bind(source)
        .execute(&mut *tx)
        .await
        .context("Failed to move assignments")?;

        sqlx::query("DELETE FROM tag_assignments WHERE tag_slug = ?")
            .bind(source)
            .execute(&mut *tx)
            .await
            .context("Failed to clear source assignments")?;

        // Re-point aliases; the alias keys themselves don't change
        sqlx::query("UPDATE tag_aliases SET tag_slug = ? WHERE tag_slug = ?")
            .bind(target)
            .bind(source)
            .execute(&mut *tx)
            .await
            .context("Failed to move aliases")?;

        // The retired slug keeps resolving to the target
        sqlx::query(
            "INSERT OR IGNORE INTO tag_aliases (alias_norm, alias, tag_slug) VALUES (?, ?, ?)",
        )
        .bind(source)
        .bind(source)
        .bind(target)
        .execute(&mut *tx)
        .await
        .context("Failed to record source alias")?;

        sqlx::query("DELETE FROM tags WHERE slug = ?")
            .bind(source)
            .execute(&mut *tx)
            .await
            .context("Failed to delete source tag")?;

        sqlx::query("UPDATE tags SET updated_at = ? WHERE slug = ?")
            .bind(Utc::now())
            .bind(target)
            .execute(&mut *tx)
            .await
            .context("Failed to touch target tag")?;

        tx.commit().await.context("Failed to commit merge")?;

        Ok(())
    }
}

impl SqlxTagRepository {
    async fn aliases_for(&self, slug: &str) -> Result<Vec<String>> {
        let rows =
            sqlx::query("SELECT alias FROM tag_aliases WHERE tag_slug = ? ORDER BY alias_norm")
                .bind(slug)
                .fetch_all(&self.pool)
                .await
                .context("Failed to load aliases")?;

        Ok(rows.iter().map(|r| r.get("alias")).collect())
    }

    /// Batch-load aliases for a set of tags with one query
    async fn stitch_aliases(&self, tags: &mut [Tag]) -> Result<()> {
        if tags.is_empty() {
            return Ok(());
        }

        let placeholders = vec!["?"; tags.len()].join(", ");
        let sql = format!(
            "SELECT tag_slug, alias FROM tag_aliases WHERE tag_slug IN ({}) ORDER BY alias_norm",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for tag in tags.iter() {
            query = query.bind(&tag.slug);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to load aliases")?;

        let mut by_slug: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            by_slug
                .entry(row.get("tag_slug"))
                .or_default()
                .push(row.get("alias"));
        }

        for tag in tags.iter_mut() {
            tag.aliases = by_slug.remove(&tag.slug).unwrap_or_default();
        }

        Ok(())
    }
}

/// Escape LIKE metacharacters so a query matches them literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Convert a database row to a Tag (aliases loaded separately)
fn row_to_tag(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    let category: String = row.get("category");
    let status: String = row.get("status");

    Ok(Tag {
        slug: row.get("slug"),
        display_name: row.get("display_name"),
        category: category
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("Invalid tag category in database")?,
        status: status
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("Invalid tag status in database")?,
        aliases: Vec::new(),
        description: row.get("description"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

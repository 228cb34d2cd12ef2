//! Tag index repository
//!
//! The tag index is the `tag_assignments` join table: which tags are on
//! which entities. Assign and unassign are idempotent set operations; the
//! aggregation queries behind the stats endpoints live here too.

use crate::models::{EntityType, TagCategoryCount, TagUsage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Tag index repository trait
#[async_trait]
pub trait TagIndexRepository: Send + Sync {
    /// Record that an entity carries a tag. Already-present pairs are a no-op.
    async fn assign(&self, slug: &str, entity_type: EntityType, entity_key: &str) -> Result<()>;

    /// Remove a tag from an entity. Absent pairs are a no-op.
    async fn unassign(&self, slug: &str, entity_type: EntityType, entity_key: &str) -> Result<()>;

    /// Remove every tag held by an entity (entity deletion)
    async fn unassign_all(&self, entity_type: EntityType, entity_key: &str) -> Result<()>;

    /// Slugs currently assigned to an entity
    async fn slugs_for_entity(
        &self,
        entity_type: EntityType,
        entity_key: &str,
    ) -> Result<Vec<String>>;

    /// Number of entities a tag is assigned to
    async fn usage_count(&self, slug: &str) -> Result<i64>;

    /// Most-used tags, count descending with slug as the tie-break
    async fn top_tags(&self, entity_type: Option<EntityType>, limit: i64) -> Result<Vec<TagUsage>>;

    /// Tags appearing on the same entities as `slug`, each entity counted once
    async fn cooccurrence(
        &self,
        slug: &str,
        entity_type: Option<EntityType>,
        limit: i64,
    ) -> Result<Vec<TagUsage>>;

    /// Distinct assigned tags per category
    async fn category_breakdown(
        &self,
        entity_type: Option<EntityType>,
    ) -> Result<Vec<TagCategoryCount>>;
}

/// SQLx-based tag index repository implementation
pub struct SqlxTagIndexRepository {
    pool: SqlitePool,
}

impl SqlxTagIndexRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn TagIndexRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagIndexRepository for SqlxTagIndexRepository {
    async fn assign(&self, slug: &str, entity_type: EntityType, entity_key: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO tag_assignments (tag_slug, entity_type, entity_key)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(slug)
        .bind(entity_type.as_str())
        .bind(entity_key)
        .execute(&self.pool)
        .await
        .context("Failed to assign tag")?;

        Ok(())
    }

    async fn unassign(&self, slug: &str, entity_type: EntityType, entity_key: &str) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM tag_assignments
            WHERE tag_slug = ? AND entity_type = ? AND entity_key = ?
            "#,
        )
        .bind(slug)
        .bind(entity_type.as_str())
        .bind(entity_key)
        .execute(&self.pool)
        .await
        .context("Failed to unassign tag")?;

        Ok(())
    }

    async fn unassign_all(&self, entity_type: EntityType, entity_key: &str) -> Result<()> {
        sqlx::query("DELETE FROM tag_assignments WHERE entity_type = ? AND entity_key = ?")
            .bind(entity_type.as_str())
            .bind(entity_key)
            .execute(&self.pool)
            .await
            .context("Failed to clear entity assignments")?;

        Ok(())
    }

    async fn slugs_for_entity(
        &self,
        entity_type: EntityType,
        entity_key: &str,
    ) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT tag_slug FROM tag_assignments
            WHERE entity_type = ? AND entity_key = ?
            ORDER BY tag_slug
            "#,
        )
        .bind(entity_type.as_str())
        .bind(entity_key)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list entity tags")?;

        Ok(rows.iter().map(|r| r.get("tag_slug")).collect())
    }

    async fn usage_count(&self, slug: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM tag_assignments WHERE tag_slug = ?")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count tag usage")?;

        Ok(row.get("count"))
    }

    async fn top_tags(&self, entity_type: Option<EntityType>, limit: i64) -> Result<Vec<TagUsage>> {
        let mut sql = String::from(
            r#"
            SELECT t.slug, t.display_name, COUNT(a.tag_slug) AS count
            FROM tag_assignments a
            JOIN tags t ON t.slug = a.tag_slug
            WHERE 1 = 1
            "#,
        );
        let mut binds: Vec<String> = Vec::new();

        if let Some(entity_type) = entity_type {
            sql.push_str(" AND a.entity_type = ?");
            binds.push(entity_type.as_str().to_string());
        }

        sql.push_str(
            r#"
            GROUP BY t.slug
            ORDER BY count DESC, t.slug ASC
            LIMIT ?
            "#,
        );

        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        query = query.bind(limit);

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to compute top tags")?;

        Ok(rows.iter().map(row_to_usage).collect())
    }

    async fn cooccurrence(
        &self,
        slug: &str,
        entity_type: Option<EntityType>,
        limit: i64,
    ) -> Result<Vec<TagUsage>> {
        // Self-join on the entity key: `other` rows share an entity with
        // the anchor slug. The composite primary key guarantees each
        // entity contributes at most one row per co-occurring tag.
        let mut sql = String::from(
            r#"
            SELECT t.slug, t.display_name, COUNT(*) AS count
            FROM tag_assignments anchor
            JOIN tag_assignments other
              ON other.entity_type = anchor.entity_type
             AND other.entity_key = anchor.entity_key
             AND other.tag_slug != anchor.tag_slug
            JOIN tags t ON t.slug = other.tag_slug
            WHERE anchor.tag_slug = ?
            "#,
        );
        let mut binds: Vec<String> = vec![slug.to_string()];

        if let Some(entity_type) = entity_type {
            sql.push_str(" AND anchor.entity_type = ?");
            binds.push(entity_type.as_str().to_string());
        }

        sql.push_str(
            r#"
            GROUP BY t.slug
            ORDER BY count DESC, t.slug ASC
            LIMIT ?
            "#,
        );

        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        query = query.bind(limit);

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to compute co-occurrence")?;

        Ok(rows.iter().map(row_to_usage).collect())
    }

    async fn category_breakdown(
        &self,
        entity_type: Option<EntityType>,
    ) -> Result<Vec<TagCategoryCount>> {
        let mut sql = String::from(
            r#"
            SELECT t.category, COUNT(DISTINCT t.slug) AS count
            FROM tag_assignments a
            JOIN tags t ON t.slug = a.tag_slug
            WHERE 1 = 1
            "#,
        );
        let mut binds: Vec<String> = Vec::new();

        if let Some(entity_type) = entity_type {
            sql.push_str(" AND a.entity_type = ?");
            binds.push(entity_type.as_str().to_string());
        }

        sql.push_str(
            r#"
            GROUP BY t.category
            ORDER BY count DESC, t.category ASC
            "#,
        );

        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to compute category breakdown")?;

        let mut breakdown = Vec::new();
        for row in rows {
            let category: String = row.get("category");
            breakdown.push(TagCategoryCount {
                category: category
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!(e))
                    .context("Invalid tag category in database")?,
                count: row.get("count"),
            });
        }

        Ok(breakdown)
    }
}

fn row_to_usage(row: &sqlx::sqlite::SqliteRow) -> TagUsage {
    TagUsage {
        slug: row.get("slug"),
        display_name: row.get("display_name"),
        count: row.get("count"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::tag::{SqlxTagRepository, TagRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::Tag;

    async fn setup() -> (SqlxTagRepository, SqlxTagIndexRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            SqlxTagRepository::new(pool.clone()),
            SqlxTagIndexRepository::new(pool),
        )
    }

    async fn create_tag(repo: &SqlxTagRepository, slug: &str, name: &str) {
        repo.create(&Tag::new(slug.to_string(), name.to_string()))
            .await
            .expect("Failed to create tag");
    }

    #[tokio::test]
    async fn test_assign_is_idempotent() {
        let (tags, index) = setup().await;
        create_tag(&tags, "silver", "Silver").await;

        index
            .assign("silver", EntityType::Vendor, "v1")
            .await
            .expect("Assign failed");
        index
            .assign("silver", EntityType::Vendor, "v1")
            .await
            .expect("Repeated assign should be a no-op");

        assert_eq!(index.usage_count("silver").await.expect("Count failed"), 1);
    }

    #[tokio::test]
    async fn test_unassign_is_idempotent() {
        let (tags, index) = setup().await;
        create_tag(&tags, "silver", "Silver").await;

        index
            .assign("silver", EntityType::Vendor, "v1")
            .await
            .expect("Assign failed");
        index
            .unassign("silver", EntityType::Vendor, "v1")
            .await
            .expect("Unassign failed");
        index
            .unassign("silver", EntityType::Vendor, "v1")
            .await
            .expect("Repeated unassign should be a no-op");

        assert_eq!(index.usage_count("silver").await.expect("Count failed"), 0);
    }

    #[tokio::test]
    async fn test_slugs_for_entity() {
        let (tags, index) = setup().await;
        create_tag(&tags, "silver", "Silver").await;
        create_tag(&tags, "enamel", "Enamel").await;

        index
            .assign("silver", EntityType::Wishlist, "w1")
            .await
            .expect("Assign failed");
        index
            .assign("enamel", EntityType::Wishlist, "w1")
            .await
            .expect("Assign failed");

        let slugs = index
            .slugs_for_entity(EntityType::Wishlist, "w1")
            .await
            .expect("Lookup failed");
        assert_eq!(slugs, vec!["enamel".to_string(), "silver".to_string()]);
    }

    #[tokio::test]
    async fn test_top_tags_ties_broken_by_slug() {
        let (tags, index) = setup().await;
        create_tag(&tags, "zircon", "Zircon").await;
        create_tag(&tags, "amber", "Amber").await;
        create_tag(&tags, "silver", "Silver").await;

        for key in ["v1", "v2"] {
            index
                .assign("silver", EntityType::Vendor, key)
                .await
                .expect("Assign failed");
        }
        index
            .assign("zircon", EntityType::Vendor, "v1")
            .await
            .expect("Assign failed");
        index
            .assign("amber", EntityType::Vendor, "v1")
            .await
            .expect("Assign failed");

        let top = index.top_tags(None, 10).await.expect("Top tags failed");
        let slugs: Vec<&str> = top.iter().map(|u| u.slug.as_str()).collect();
        assert_eq!(slugs, vec!["silver", "amber", "zircon"]);
        assert_eq!(top[0].count, 2);
    }

    #[tokio::test]
    async fn test_top_tags_entity_type_filter() {
        let (tags, index) = setup().await;
        create_tag(&tags, "silver", "Silver").await;
        create_tag(&tags, "gold", "Gold").await;

        index
            .assign("silver", EntityType::Vendor, "v1")
            .await
            .expect("Assign failed");
        index
            .assign("gold", EntityType::Wishlist, "w1")
            .await
            .expect("Assign failed");

        let top = index
            .top_tags(Some(EntityType::Wishlist), 10)
            .await
            .expect("Top tags failed");
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].slug, "gold");
    }

    #[tokio::test]
    async fn test_cooccurrence_counts_entity_once() {
        let (tags, index) = setup().await;
        create_tag(&tags, "silver", "Silver").await;
        create_tag(&tags, "enamel", "Enamel").await;
        create_tag(&tags, "jhumka", "Jhumka").await;

        // w1 carries silver+enamel+jhumka, w2 carries silver+enamel
        for (slug, key) in [
            ("silver", "w1"),
            ("enamel", "w1"),
            ("jhumka", "w1"),
            ("silver", "w2"),
            ("enamel", "w2"),
        ] {
            index
                .assign(slug, EntityType::Wishlist, key)
                .await
                .expect("Assign failed");
        }

        let related = index
            .cooccurrence("silver", None, 10)
            .await
            .expect("Cooccurrence failed");
        let pairs: Vec<(&str, i64)> = related
            .iter()
            .map(|u| (u.slug.as_str(), u.count))
            .collect();
        assert_eq!(pairs, vec![("enamel", 2), ("jhumka", 1)]);
    }

    #[tokio::test]
    async fn test_category_breakdown_counts_distinct_tags() {
        let (tags, index) = setup().await;

        let mut silver = Tag::new("silver".to_string(), "Silver".to_string());
        silver.category = crate::models::TagCategory::Material;
        tags.create(&silver).await.expect("Failed to create tag");

        let mut gold = Tag::new("gold".to_string(), "Gold".to_string());
        gold.category = crate::models::TagCategory::Material;
        tags.create(&gold).await.expect("Failed to create tag");

        create_tag(&tags, "floral", "Floral").await;

        // silver used heavily; still one distinct material tag each
        for key in ["v1", "v2", "v3"] {
            index
                .assign("silver", EntityType::Vendor, key)
                .await
                .expect("Assign failed");
        }
        index
            .assign("gold", EntityType::Vendor, "v1")
            .await
            .expect("Assign failed");
        index
            .assign("floral", EntityType::Vendor, "v1")
            .await
            .expect("Assign failed");

        let breakdown = index
            .category_breakdown(None)
            .await
            .expect("Breakdown failed");
        let pairs: Vec<(&str, i64)> = breakdown
            .iter()
            .map(|c| (c.category.as_str(), c.count))
            .collect();
        assert_eq!(pairs, vec![("material", 2), ("other", 1)]);
    }
}

//! Competitor repository

use super::{decode_list, encode_list};
use crate::models::{Competitor, CompetitorPriority};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Competitor repository trait
#[async_trait]
pub trait CompetitorRepository: Send + Sync {
    /// Insert a new competitor. Fails with a unique violation if the
    /// business name is taken.
    async fn create(&self, competitor: &Competitor) -> Result<Competitor>;

    /// Get competitor by business name
    async fn get(&self, business_name: &str) -> Result<Option<Competitor>>;

    /// List all competitors, most recently updated first
    async fn list(&self) -> Result<Vec<Competitor>>;

    /// Update all editable fields
    async fn update(&self, competitor: &Competitor) -> Result<Competitor>;

    /// Delete a competitor, returning whether it existed
    async fn delete(&self, business_name: &str) -> Result<bool>;

    /// Rewrite only the denormalized tag list
    async fn update_tags(&self, business_name: &str, tags: &[String]) -> Result<()>;
}

/// SQLx-based competitor repository implementation
pub struct SqlxCompetitorRepository {
    pool: SqlitePool,
}

impl SqlxCompetitorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn CompetitorRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CompetitorRepository for SqlxCompetitorRepository {
    async fn create(&self, competitor: &Competitor) -> Result<Competitor> {
        let now = Utc::now();

        // No context: callers inspect for unique violations on the name.
        sqlx::query(
            r#"
            INSERT INTO competitors (
                business_name, website_url, country, city, categories, price_range,
                instagram_handle, instagram_followers, primary_platform, intel_score,
                priority, watchlist, notes, tags, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&competitor.business_name)
        .bind(&competitor.website_url)
        .bind(&competitor.country)
        .bind(&competitor.city)
        .bind(encode_list(&competitor.categories)?)
        .bind(&competitor.price_range)
        .bind(&competitor.instagram_handle)
        .bind(competitor.instagram_followers)
        .bind(competitor.primary_platform.map(|p| p.as_str()))
        .bind(competitor.intel_score)
        .bind(competitor.priority.as_str())
        .bind(competitor.watchlist)
        .bind(&competitor.notes)
        .bind(encode_list(&competitor.tags)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Competitor {
            created_at: now,
            updated_at: now,
            ..competitor.clone()
        })
    }

    async fn get(&self, business_name: &str) -> Result<Option<Competitor>> {
        let row = sqlx::query("SELECT * FROM competitors WHERE business_name = ?")
            .bind(business_name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get competitor")?;

        row.map(|r| row_to_competitor(&r)).transpose()
    }

    async fn list(&self) -> Result<Vec<Competitor>> {
        let rows = sqlx::query("SELECT * FROM competitors ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list competitors")?;

        rows.iter().map(row_to_competitor).collect()
    }

    async fn update(&self, competitor: &Competitor) -> Result<Competitor> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE competitors SET
                website_url = ?, country = ?, city = ?, categories = ?, price_range = ?,
                instagram_handle = ?, instagram_followers = ?, primary_platform = ?,
                intel_score = ?, priority = ?, watchlist = ?, notes = ?, tags = ?,
                updated_at = ?
            WHERE business_name = ?
            "#,
        )
        .bind(&competitor.website_url)
        .bind(&competitor.country)
        .bind(&competitor.city)
        .bind(encode_list(&competitor.categories)?)
        .bind(&competitor.price_range)
        .bind(&competitor.instagram_handle)
        .bind(competitor.instagram_followers)
        .bind(competitor.primary_platform.map(|p| p.as_str()))
        .bind(competitor.intel_score)
        .bind(competitor.priority.as_str())
        .bind(competitor.watchlist)
        .bind(&competitor.notes)
        .bind(encode_list(&competitor.tags)?)
        .bind(now)
        .bind(&competitor.business_name)
        .execute(&self.pool)
        .await
        .context("Failed to update competitor")?;

        anyhow::ensure!(
            result.rows_affected() > 0,
            "competitor not found: {}",
            competitor.business_name
        );

        Ok(Competitor {
            updated_at: now,
            ..competitor.clone()
        })
    }

    async fn delete(&self, business_name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM competitors WHERE business_name = ?")
            .bind(business_name)
            .execute(&self.pool)
            .await
            .context("Failed to delete competitor")?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_tags(&self, business_name: &str, tags: &[String]) -> Result<()> {
        sqlx::query("UPDATE competitors SET tags = ?, updated_at = ? WHERE business_name = ?")
            .bind(encode_list(tags)?)
            .bind(Utc::now())
            .bind(business_name)
            .execute(&self.pool)
            .await
            .context("Failed to update competitor tags")?;

        Ok(())
    }
}

fn row_to_competitor(row: &sqlx::sqlite::SqliteRow) -> Result<Competitor> {
    let categories: String = row.get("categories");
    let tags: String = row.get("tags");
    let priority: String = row.get("priority");
    let platform: Option<String> = row.get("primary_platform");

    Ok(Competitor {
        business_name: row.get("business_name"),
        website_url: row.get("website_url"),
        country: row.get("country"),
        city: row.get("city"),
        categories: decode_list(&categories)?,
        price_range: row.get("price_range"),
        instagram_handle: row.get("instagram_handle"),
        instagram_followers: row.get("instagram_followers"),
        primary_platform: platform
            .map(|p| p.parse().map_err(|e: String| anyhow::anyhow!(e)))
            .transpose()
            .context("Invalid platform in database")?,
        intel_score: row.get("intel_score"),
        priority: priority
            .parse::<CompetitorPriority>()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Invalid priority in database")?,
        watchlist: row.get("watchlist"),
        notes: row.get("notes"),
        tags: decode_list(&tags)?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

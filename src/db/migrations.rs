//! Database migrations module
//!
//! Migrations are embedded directly in Rust code as SQL strings for
//! single-binary deployment. Applied versions are tracked in a
//! `_migrations` table.
//!
//! # Usage
//!
//! ```ignore
//! use intelhub::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements to apply
    pub up: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    /// Migration version number
    pub version: i64,
    /// Migration name/description
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// All migrations, embedded in the binary.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_tags",
        up: r#"
            CREATE TABLE IF NOT EXISTS tags (
                slug VARCHAR(100) PRIMARY KEY,
                display_name VARCHAR(100) NOT NULL,
                category VARCHAR(20) NOT NULL DEFAULT 'other',
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_tags_status ON tags(status);
            CREATE INDEX IF NOT EXISTS idx_tags_category ON tags(category);
        "#,
    },
    Migration {
        version: 2,
        name: "create_tag_aliases",
        up: r#"
            CREATE TABLE IF NOT EXISTS tag_aliases (
                alias_norm VARCHAR(100) PRIMARY KEY,
                alias VARCHAR(100) NOT NULL,
                tag_slug VARCHAR(100) NOT NULL,
                FOREIGN KEY (tag_slug) REFERENCES tags(slug) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_tag_aliases_tag_slug ON tag_aliases(tag_slug);
        "#,
    },
    Migration {
        version: 3,
        name: "create_tag_assignments",
        up: r#"
            CREATE TABLE IF NOT EXISTS tag_assignments (
                tag_slug VARCHAR(100) NOT NULL,
                entity_type VARCHAR(20) NOT NULL,
                entity_key VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (tag_slug, entity_type, entity_key),
                FOREIGN KEY (tag_slug) REFERENCES tags(slug) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_tag_assignments_entity
                ON tag_assignments(entity_type, entity_key);
        "#,
    },
    Migration {
        version: 4,
        name: "create_competitors",
        up: r#"
            CREATE TABLE IF NOT EXISTS competitors (
                business_name VARCHAR(160) PRIMARY KEY,
                website_url TEXT,
                country VARCHAR(80),
                city VARCHAR(80),
                categories TEXT NOT NULL DEFAULT '[]',
                price_range VARCHAR(40),
                instagram_handle VARCHAR(80),
                instagram_followers INTEGER,
                primary_platform VARCHAR(20),
                intel_score INTEGER,
                priority VARCHAR(10) NOT NULL DEFAULT 'med',
                watchlist BOOLEAN NOT NULL DEFAULT 0,
                notes TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 5,
        name: "create_vendors",
        up: r#"
            CREATE TABLE IF NOT EXISTS vendors (
                vendor_id VARCHAR(36) PRIMARY KEY,
                name VARCHAR(160) NOT NULL,
                website_url TEXT,
                whatsapp_link TEXT,
                email VARCHAR(255),
                phone VARCHAR(20),
                city VARCHAR(80),
                country VARCHAR(80),
                catalog_urls TEXT NOT NULL DEFAULT '[]',
                lead_time_days INTEGER,
                moq_units INTEGER,
                payment_terms VARCHAR(120),
                rating INTEGER,
                tags TEXT NOT NULL DEFAULT '[]',
                notes TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_vendors_name_nocase
                ON vendors(name COLLATE NOCASE);
        "#,
    },
    Migration {
        version: 6,
        name: "create_master_products",
        up: r#"
            CREATE TABLE IF NOT EXISTS master_products (
                product_id VARCHAR(36) PRIMARY KEY,
                name VARCHAR(160) NOT NULL,
                description TEXT,
                product_type VARCHAR(80),
                metal VARCHAR(80),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 7,
        name: "create_wishlist_items",
        up: r#"
            CREATE TABLE IF NOT EXISTS wishlist_items (
                wish_id VARCHAR(36) PRIMARY KEY,
                title VARCHAR(120) NOT NULL,
                description TEXT,
                reference_urls TEXT NOT NULL DEFAULT '[]',
                images TEXT NOT NULL DEFAULT '[]',
                source_platforms TEXT NOT NULL DEFAULT '[]',
                competitors TEXT NOT NULL DEFAULT '[]',
                vendor_id VARCHAR(36),
                master_product_id VARCHAR(36),
                status VARCHAR(20) NOT NULL DEFAULT 'planned',
                price_target REAL,
                price_actual REAL,
                tags TEXT NOT NULL DEFAULT '[]',
                priority VARCHAR(10) NOT NULL DEFAULT 'medium',
                notes TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_wishlist_status ON wishlist_items(status);
            CREATE INDEX IF NOT EXISTS idx_wishlist_vendor ON wishlist_items(vendor_id);
            CREATE INDEX IF NOT EXISTS idx_wishlist_master_product
                ON wishlist_items(master_product_id);
        "#,
    },
];

/// Run all pending migrations.
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

/// Apply a single migration
async fn apply_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    // Migration SQL may contain multiple statements
    for statement in split_sql_statements(migration.up) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        format!("{}...", &sql[..100])
    } else {
        sql.to_string()
    }
}

/// Split SQL into individual statements, handling comments properly
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut current_start = 0;
    let mut in_statement = false;

    for (i, c) in sql.char_indices() {
        match c {
            ';' => {
                if in_statement {
                    let stmt = sql[current_start..i].trim();
                    if !stmt.is_empty() && !is_comment_only(stmt) {
                        statements.push(stmt);
                    }
                    in_statement = false;
                }
                current_start = i + 1;
            }
            _ if !c.is_whitespace() && !in_statement => {
                current_start = i;
                in_statement = true;
            }
            _ => {}
        }
    }

    // Handle last statement without trailing semicolon
    if in_statement {
        let stmt = sql[current_start..].trim();
        if !stmt.is_empty() && !is_comment_only(stmt) {
            statements.push(stmt);
        }
    }

    statements
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    for line in s.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("--") {
            return false;
        }
    }
    true
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &SqlitePool) -> Result<bool> {
    let _ = create_migrations_table(pool).await;

    let applied = get_applied_migrations(pool).await?;
    Ok(applied.len() == MIGRATIONS.len())
}

/// Get pending migrations count
pub async fn pending_count(pool: &SqlitePool) -> Result<usize> {
    let _ = create_migrations_table(pool).await;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

/// Get the total number of migrations defined
pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}

//! SQLite connection pool setup

use anyhow::{Context, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;

/// Create a SQLite connection pool from configuration.
///
/// For file-based databases the parent directory is created if missing and
/// the database file is created on first connect (`mode=rwc`). Foreign key
/// enforcement is enabled on the pool.
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let url = config.url.as_str();

    if !url.starts_with(":memory:") && !url.starts_with("sqlite::memory:") {
        let path = if url.starts_with("sqlite:") {
            url.trim_start_matches("sqlite:")
        } else {
            url
        };

        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {:?}", parent)
                })?;
            }
        }
    }

    let connection_url = if url.starts_with("sqlite:") {
        if url.contains('?') {
            url.to_string()
        } else {
            format!("{}?mode=rwc", url)
        }
    } else if url == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite:{}?mode=rwc", url)
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .connect(&connection_url)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .context("Failed to enable foreign keys")?;

    Ok(pool)
}

/// Create an in-memory database pool for testing
pub async fn create_test_pool() -> Result<SqlitePool> {
    let config = DatabaseConfig {
        url: ":memory:".to_string(),
    };
    create_pool(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_pool_creation() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("Ping should succeed");
    }

    #[tokio::test]
    async fn test_pool_execute() {
        let pool = create_test_pool().await.expect("Failed to create pool");

        sqlx::query("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)")
            .execute(&pool)
            .await
            .expect("Failed to create table");

        let affected = sqlx::query("INSERT INTO test (name) VALUES ('test')")
            .execute(&pool)
            .await
            .expect("Failed to insert")
            .rows_affected();
        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_file_pool_creation() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = DatabaseConfig {
            url: db_path.to_string_lossy().to_string(),
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("Ping should succeed");

        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_nested_directory_creation() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("dir").join("test.db");

        let config = DatabaseConfig {
            url: db_path.to_string_lossy().to_string(),
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("Ping should succeed");

        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        let row: (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .expect("Failed to read pragma");
        assert_eq!(row.0, 1);
    }
}

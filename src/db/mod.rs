//! Database layer
//!
//! SQLite-backed persistence for single-binary deployment. The pool is a
//! plain `sqlx::SqlitePool`; repositories wrap it behind async traits.
//!
//! # Usage
//!
//! ```ignore
//! use intelhub::config::DatabaseConfig;
//! use intelhub::db::{create_pool, migrations};
//!
//! let config = DatabaseConfig::default();
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};

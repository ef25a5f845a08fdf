//! Database layer
//!
//! Storage for Quill, with two interchangeable backends:
//! - SQLite (default, also used in-memory by tests)
//! - MySQL
//!
//! The database driver is selected by configuration. Repositories hold a
//! [`DynDatabasePool`] and match on [`Backend`] to run backend-specific SQL.
//!
//! # Usage
//!
//! ```ignore
//! use quill::config::DatabaseConfig;
//! use quill::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repositories;

pub use error::{classify, StorageFailure};
pub use pool::{
    create_pool, create_test_pool, Backend, DatabasePool, DynDatabasePool, MysqlDatabase,
    SqliteDatabase,
};

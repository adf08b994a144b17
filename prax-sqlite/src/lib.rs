//! SQLite executor for prax-filter queries.
//!
//! Runs compiled [`SelectQuery`](prax_filter::SelectQuery)s on a single
//! `tokio-rusqlite` connection and performs select-in population, so every
//! populated relation is fetched through the same filter compiler as the
//! primary query.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use prax_filter::{ConditionTree, EntityMeta, EntityRegistry, FindOptions};
//! use prax_sqlite::{SqliteConfig, SqliteEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = EntityRegistry::new().register(EntityMeta::new("Company", "company").scalar("name"));
//!     let engine = SqliteEngine::open(SqliteConfig::from_url("sqlite::memory:")?, Arc::new(registry)).await?;
//!     engine.execute_batch("CREATE TABLE company (id INTEGER PRIMARY KEY, name TEXT NOT NULL)").await?;
//!
//!     let rows = engine.find("Company", &ConditionTree::new(), &FindOptions::new()).await?;
//!     assert!(rows.is_empty());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

pub use config::{DatabasePath, SqliteConfig};
pub use engine::SqliteEngine;
pub use error::{SqliteError, SqliteResult};

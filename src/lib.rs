//! # Prax Filters
//!
//! Named, parameterized query filters that compile nested relation
//! conditions into joins, plus an SQLite executor that applies the same
//! filters when populating relations.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use prax_filters::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = EntityRegistry::new()
//!         .register(EntityMeta::new("Location", "location").scalar("name"))
//!         .register(
//!             EntityMeta::new("User", "users")
//!                 .scalar("name")
//!                 .relation(RelationSpec::many_to_one("location", "Location", "location_id"))
//!                 .filter(
//!                     FilterDefinition::new("byLocation", |args| {
//!                         Ok(ConditionTree::new().value("location", args.require("locations")?.clone()))
//!                     })
//!                     .requires(["locations"]),
//!                 ),
//!         );
//!
//!     let engine = SqliteEngine::open(SqliteConfig::memory(), Arc::new(registry)).await?;
//!     let filters = ActiveFilterSet::new()
//!         .enable_with("byLocation", FilterParams::new().set("locations", vec![1i64]));
//!     let users = engine
//!         .find("User", &ConditionTree::new(), &FindOptions::new().filters(filters).populate("location"))
//!         .await?;
//!     println!("{} users", users.len());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Filter definitions, the clause compiler and SQL rendering.
pub mod filter {
    pub use prax_filter::*;
}

/// SQLite execution and population.
pub mod sqlite {
    pub use prax_sqlite::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use prax_filter::prelude::*;
    pub use prax_sqlite::{SqliteConfig, SqliteEngine};
}

pub use prax_filter::{CompileOptions, FilterCompiler, QueryError, QueryResult};
pub use prax_sqlite::{SqliteEngine, SqliteError};

//! # prax-filter
//!
//! Named, parameterized query filters and the compiler that turns them
//! into SQL joins and predicates.
//!
//! Filters are registered on entity metadata as builders from bound
//! parameters to a [`ConditionTree`]. A query activates any number of them;
//! their trees are ANDed and compiled together with the caller's own
//! condition. Nested conditions on relations always compile to joins,
//! including inside population queries and with several filters active.
//!
//! ## Registering filters
//!
//! ```rust
//! use prax_filter::prelude::*;
//!
//! let registry = EntityRegistry::new()
//!     .register(
//!         EntityMeta::new("User", "users")
//!             .scalar("name")
//!             .relation(RelationSpec::many_to_one("location", "Location", "location_id")),
//!     )
//!     .register(EntityMeta::new("Location", "location").scalar("name"))
//!     .register(
//!         EntityMeta::new("Task", "task")
//!             .column("deletedAt", "deleted_at", true)
//!             .relation(RelationSpec::many_to_one("owner", "User", "owner_id"))
//!             .filter(
//!                 FilterDefinition::new("byLocation", |args| {
//!                     let locations = args.require("locations")?.clone();
//!                     Ok(ConditionTree::new()
//!                         .relation("owner", ConditionTree::new().value("location", locations)))
//!                 })
//!                 .requires(["locations"]),
//!             )
//!             .filter(FilterDefinition::constant(
//!                 "notDeleted",
//!                 ConditionTree::new().value("deletedAt", FilterValue::Null),
//!             )),
//!     );
//!
//! let filters = ActiveFilterSet::new()
//!     .enable_with("byLocation", FilterParams::new().set("locations", vec![1i64]))
//!     .enable("notDeleted");
//!
//! let query = SelectQuery::find(
//!     &registry,
//!     "Task",
//!     &ConditionTree::new(),
//!     &filters,
//!     &CompileOptions::default(),
//! )
//! .unwrap();
//! let (sql, params) = query.to_sql(DatabaseType::SQLite);
//!
//! assert!(sql.contains("LEFT JOIN users AS e1 ON e0.owner_id = e1.id"));
//! assert!(sql.contains("e1.location_id IN (?)"));
//! assert!(sql.contains("e0.deleted_at IS NULL"));
//! assert_eq!(params[0], FilterValue::Int(1));
//! ```
//!
//! ## Conditions from JSON
//!
//! ```rust
//! use prax_filter::ConditionTree;
//! use serde_json::json;
//!
//! let tree = ConditionTree::from_json(&json!({
//!     "owner": { "location": { "$in": [1, 2] } },
//!     "deletedAt": null,
//! }))
//! .unwrap();
//! assert_eq!(tree.len(), 2);
//! ```

pub mod clause;
pub mod compiler;
pub mod condition;
pub mod config;
pub mod definition;
pub mod error;
pub mod filter;
pub mod join;
pub mod logging;
pub mod metadata;
pub mod populate;
pub mod query;
pub mod relation;
pub mod sql;

#[cfg(test)]
mod test_fixtures;

pub use clause::{Clause, ColumnRef, CompiledClause};
pub use compiler::FilterCompiler;
pub use condition::{Condition, ConditionTree};
pub use config::CompileOptions;
pub use definition::{ActiveFilterSet, FilterArgs, FilterDefinition, FilterParams};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use filter::{FilterValue, ScalarFilter};
pub use join::{Join, JoinContext, JoinKind};
pub use metadata::{EntityMeta, EntityRegistry, FieldMeta};
pub use populate::PopulationQuery;
pub use query::{FindOptions, Record, SelectQuery};
pub use relation::{RelationSpec, RelationType};
pub use sql::{DatabaseType, SqlBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::compiler::FilterCompiler;
    pub use crate::condition::ConditionTree;
    pub use crate::config::CompileOptions;
    pub use crate::definition::{ActiveFilterSet, FilterDefinition, FilterParams};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::{FilterValue, ScalarFilter};
    pub use crate::metadata::{EntityMeta, EntityRegistry};
    pub use crate::query::{FindOptions, Record, SelectQuery};
    pub use crate::relation::RelationSpec;
    pub use crate::sql::DatabaseType;
}

//! Select queries assembled from compiled clauses.

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::clause::{Clause, ColumnRef, CompiledClause};
use crate::compiler::FilterCompiler;
use crate::condition::ConditionTree;
use crate::config::CompileOptions;
use crate::definition::ActiveFilterSet;
use crate::error::QueryResult;
use crate::filter::{FilterValue, ScalarFilter};
use crate::metadata::EntityRegistry;
use crate::sql::{DatabaseType, SqlBuilder};

/// A fetched row, keyed by column name. Populated relations are added
/// under the relation name.
pub type Record = serde_json::Map<String, JsonValue>;

/// Per-call options for a find.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Filters to apply, with their bound parameters.
    pub filters: ActiveFilterSet,
    /// Relations to load after the primary query.
    pub populate: Vec<String>,
}

impl FindOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the active filters.
    pub fn filters(mut self, filters: ActiveFilterSet) -> Self {
        self.filters = filters;
        self
    }

    /// Populate a relation.
    pub fn populate(mut self, relation: impl Into<String>) -> Self {
        self.populate.push(relation.into());
        self
    }
}

/// A `SELECT` over one entity with its joins and conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    entity: String,
    table: String,
    primary_key: String,
    clause: CompiledClause,
}

impl SelectQuery {
    /// Compile `tree` and the active filters for `entity`.
    pub fn find(
        registry: &EntityRegistry,
        entity: &str,
        tree: &ConditionTree,
        filters: &ActiveFilterSet,
        options: &CompileOptions,
    ) -> QueryResult<Self> {
        let meta = registry.entity(entity)?;
        let clause = FilterCompiler::new(registry, options).compile(entity, tree, filters)?;
        Ok(Self {
            entity: meta.name().to_string(),
            table: meta.table().to_string(),
            primary_key: meta.primary_key().to_string(),
            clause,
        })
    }

    /// Restrict the result to rows whose root `column` is one of `values`.
    pub fn with_keys(mut self, column: &str, values: Vec<FilterValue>) -> Self {
        let keys = Clause::predicate(
            ColumnRef::new(self.clause.root_alias.clone(), column),
            ScalarFilter::In(values),
        );
        let rest = std::mem::take(&mut self.clause.condition);
        self.clause.condition = Clause::and([keys, rest]);
        self
    }

    /// Queried entity.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The compiled condition and joins.
    pub fn clause(&self) -> &CompiledClause {
        &self.clause
    }

    /// Render to SQL. Joined queries select `DISTINCT` root rows.
    pub fn to_sql(&self, db_type: DatabaseType) -> (String, Vec<FilterValue>) {
        let root = self.clause.root_alias.as_str();
        let mut builder = SqlBuilder::new(db_type);

        builder.push("SELECT ");
        if !self.clause.joins.is_empty() {
            builder.push("DISTINCT ");
        }
        builder
            .push_identifier(root)
            .push(".* FROM ")
            .push_identifier(&self.table)
            .push(" AS ")
            .push_identifier(root)
            .push_joins(&self.clause.joins);

        if !self.clause.condition.is_true() {
            builder.push(" WHERE ").push_clause(&self.clause.condition);
        }
        builder
            .push(" ORDER BY ")
            .push_column(&ColumnRef::new(root, self.primary_key.as_str()));

        let (sql, params) = builder.build();
        debug!(entity = %self.entity, sql = %sql, params = params.len(), "Rendered select");
        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{location_filters, scenario_registry};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_primary_query_sql() {
        let registry = scenario_registry();
        let query = SelectQuery::find(
            &registry,
            "ClientManagementObject",
            &ConditionTree::new(),
            &location_filters(&[1]),
            &CompileOptions::default(),
        )
        .unwrap();
        let (sql, params) = query.to_sql(DatabaseType::SQLite);

        assert_eq!(
            sql,
            "SELECT DISTINCT e0.* FROM client_management_object AS e0 \
             LEFT JOIN \"user\" AS e1 ON e0.owner_id = e1.id AND e1.location_id IN (?) \
             WHERE e1.location_id IN (?) AND e0.deleted_at IS NULL \
             ORDER BY e0.id"
        );
        assert_eq!(params, vec![FilterValue::Int(1), FilterValue::Int(1)]);
    }

    #[test]
    fn test_population_query_sql_joins_nested_path() {
        let registry = scenario_registry();
        let query = SelectQuery::find(
            &registry,
            "Client",
            &ConditionTree::new(),
            &location_filters(&[1]),
            &CompileOptions::default(),
        )
        .unwrap()
        .with_keys("id", vec![FilterValue::Int(1)]);
        let (sql, params) = query.to_sql(DatabaseType::PostgreSQL);

        assert_eq!(
            sql,
            "SELECT DISTINCT e0.* FROM client AS e0 \
             LEFT JOIN (client_management_object AS e1 \
             LEFT JOIN \"user\" AS e2 ON e1.owner_id = e2.id AND e2.location_id IN ($1)) \
             ON e0.id = e1.client_id AND (e2.location_id IN ($2) AND e1.deleted_at IS NULL) \
             WHERE e0.id IN ($3) AND e2.location_id IN ($4) \
             ORDER BY e0.id"
        );
        assert_eq!(params, vec![FilterValue::Int(1); 4]);
        assert!(!sql.contains("location\":"));
    }

    #[test]
    fn test_unfiltered_query_has_no_where() {
        let registry = scenario_registry();
        let query = SelectQuery::find(
            &registry,
            "Company",
            &ConditionTree::new(),
            &ActiveFilterSet::new(),
            &CompileOptions::default(),
        )
        .unwrap();
        let (sql, params) = query.to_sql(DatabaseType::SQLite);
        assert_eq!(sql, "SELECT e0.* FROM company AS e0 ORDER BY e0.id");
        assert!(params.is_empty());
    }

    #[test]
    fn test_find_options_builder() {
        let options = FindOptions::new()
            .filters(ActiveFilterSet::new().enable("notDeleted"))
            .populate("client");
        assert_eq!(options.populate, vec!["client".to_string()]);
        assert!(options.filters.is_enabled("notDeleted"));
    }
}

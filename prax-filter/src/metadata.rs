//! Entity metadata: tables, fields, relations and the filters attached
//! to each entity.

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::condition::ConditionTree;
use crate::definition::{ActiveFilterSet, FilterDefinition, FilterParams};
use crate::error::{QueryError, QueryResult};
use crate::relation::RelationSpec;

/// A mapped field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMeta {
    /// Plain column.
    Scalar {
        /// Column name.
        column: String,
        /// Whether the column accepts NULL.
        nullable: bool,
    },
    /// Relation to another entity.
    Relation(RelationSpec),
}

impl FieldMeta {
    /// Relation spec, when this field is a relation.
    pub fn as_relation(&self) -> Option<&RelationSpec> {
        match self {
            Self::Relation(spec) => Some(spec),
            Self::Scalar { .. } => None,
        }
    }
}

/// Metadata for one entity type.
#[derive(Debug, Clone)]
pub struct EntityMeta {
    name: String,
    table: String,
    primary_key: String,
    fields: IndexMap<String, FieldMeta>,
    filters: IndexMap<String, FilterDefinition>,
    duplicate_filters: Vec<String>,
}

impl EntityMeta {
    /// Create metadata with an `id` primary key column.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        let mut fields = IndexMap::new();
        fields.insert(
            "id".to_string(),
            FieldMeta::Scalar {
                column: "id".to_string(),
                nullable: false,
            },
        );
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            fields,
            filters: IndexMap::new(),
            duplicate_filters: Vec::new(),
        }
    }

    /// Add a non-null scalar field stored in a column of the same name.
    pub fn scalar(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let column = name.clone();
        self.column(name, column, false)
    }

    /// Add a scalar field with an explicit column name.
    pub fn column(mut self, name: impl Into<String>, column: impl Into<String>, nullable: bool) -> Self {
        self.fields.insert(
            name.into(),
            FieldMeta::Scalar {
                column: column.into(),
                nullable,
            },
        );
        self
    }

    /// Add a relation field.
    pub fn relation(mut self, spec: RelationSpec) -> Self {
        self.fields.insert(spec.name.clone(), FieldMeta::Relation(spec));
        self
    }

    /// Attach a named filter.
    ///
    /// Names are unique per entity. A second definition under a taken name
    /// is not registered; resolving filters for this entity then fails with
    /// a configuration error.
    pub fn filter(mut self, definition: FilterDefinition) -> Self {
        let name = definition.name().to_string();
        if self.filters.contains_key(&name) {
            warn!(entity = %self.name, filter = %name, "Duplicate filter definition");
            self.duplicate_filters.push(name);
        } else {
            self.filters.insert(name, definition);
        }
        self
    }

    /// Entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Primary key column.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.get(name)
    }

    /// Look up a relation by name.
    pub fn relation_spec(&self, name: &str) -> Option<&RelationSpec> {
        self.fields.get(name).and_then(FieldMeta::as_relation)
    }

    /// Look up a filter by name.
    pub fn filter_definition(&self, name: &str) -> Option<&FilterDefinition> {
        self.filters.get(name)
    }

    /// Filters defined on this entity, in registration order.
    pub fn filters(&self) -> impl Iterator<Item = &FilterDefinition> {
        self.filters.values()
    }

    /// Check that every filter name was registered once.
    pub fn validate(&self) -> QueryResult<()> {
        match self.duplicate_filters.first() {
            Some(name) => Err(QueryError::duplicate_filter(&self.name, name)),
            None => Ok(()),
        }
    }
}

/// All entity metadata known to a query layer.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: IndexMap<String, EntityMeta>,
}

impl EntityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity.
    pub fn register(mut self, meta: EntityMeta) -> Self {
        self.entities.insert(meta.name().to_string(), meta);
        self
    }

    /// Look up an entity.
    pub fn get(&self, name: &str) -> Option<&EntityMeta> {
        self.entities.get(name)
    }

    /// Look up an entity or fail with a mapping error.
    pub fn entity(&self, name: &str) -> QueryResult<&EntityMeta> {
        self.get(name).ok_or_else(|| QueryError::unknown_entity(name))
    }

    /// Whether any entity defines a filter with this name.
    pub fn is_filter_defined(&self, name: &str) -> bool {
        self.entities
            .values()
            .any(|meta| meta.filter_definition(name).is_some())
    }

    /// Check every explicitly enabled filter against the registry.
    pub fn validate_filters(&self, active: &ActiveFilterSet) -> QueryResult<()> {
        match active.names().find(|name| !self.is_filter_defined(name)) {
            Some(unknown) => Err(QueryError::unknown_filter(unknown)),
            None => Ok(()),
        }
    }

    /// Filters that apply to `entity` for this query: the explicitly
    /// enabled ones defined on it, then its default filters that were
    /// neither enabled explicitly nor disabled.
    pub fn resolve_filters<'a>(
        &'a self,
        entity: &str,
        active: &'a ActiveFilterSet,
    ) -> QueryResult<Vec<(&'a FilterDefinition, Option<&'a FilterParams>)>> {
        self.validate_filters(active)?;
        let meta = self.entity(entity)?;
        meta.validate()?;

        let mut resolved = Vec::new();
        for name in active.names() {
            match meta.filter_definition(name) {
                Some(def) => resolved.push((def, active.params(name))),
                None => trace!(entity, filter = name, "Filter not defined on entity, skipping"),
            }
        }
        for def in meta.filters() {
            if def.is_default() && !active.is_enabled(def.name()) && !active.is_disabled(def.name()) {
                resolved.push((def, None));
            }
        }
        Ok(resolved)
    }

    /// Build every applicable filter for `entity` and AND the trees at the root.
    pub fn merge_filters(&self, entity: &str, active: &ActiveFilterSet) -> QueryResult<ConditionTree> {
        let empty = FilterParams::new();
        let mut merged = ConditionTree::new();
        for (def, params) in self.resolve_filters(entity, active)? {
            let tree = def
                .build(params.unwrap_or(&empty))
                .map_err(|e| e.with_entity(entity))?;
            merged = merged.merge(tree);
        }
        Ok(merged)
    }
}

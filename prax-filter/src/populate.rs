//! Select-in population of relations.
//!
//! After the primary query, each populated relation is loaded with one
//! more query rooted at the related entity. That query goes through the
//! same compiler with the same active filters, so nested filter
//! conditions on the related entity become joins there too.

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::condition::ConditionTree;
use crate::config::CompileOptions;
use crate::definition::ActiveFilterSet;
use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;
use crate::metadata::EntityRegistry;
use crate::query::{Record, SelectQuery};
use crate::relation::RelationSpec;

/// A planned population query for one relation.
#[derive(Debug, Clone)]
pub struct PopulationQuery {
    relation: RelationSpec,
    parent_column: String,
    child_column: String,
    query: SelectQuery,
}

impl PopulationQuery {
    /// Plan the query loading `relation` of `owner` for `parents`.
    ///
    /// Returns `None` when no parent carries a key, in which case nothing
    /// needs to run.
    pub fn plan(
        registry: &EntityRegistry,
        owner: &str,
        relation: &str,
        parents: &[Record],
        filters: &ActiveFilterSet,
        options: &CompileOptions,
    ) -> QueryResult<Option<Self>> {
        let meta = registry.entity(owner)?;
        let spec = meta
            .relation_spec(relation)
            .ok_or_else(|| QueryError::invalid_populate(owner, relation))?;
        let mut pairs = spec.key_pairs();
        let (parent_column, child_column) = match (pairs.next(), pairs.next()) {
            (Some(pair), None) => pair,
            (Some(_), Some(_)) => return Err(QueryError::composite_populate(owner, relation)),
            (None, _) => {
                return Err(QueryError::internal(format!("Relation '{}' has no join columns", relation)));
            }
        };

        let mut keys: Vec<FilterValue> = Vec::new();
        for parent in parents {
            match parent.get(parent_column) {
                None | Some(JsonValue::Null) => {}
                Some(value) => {
                    let key = FilterValue::from(value);
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
            }
        }
        if keys.is_empty() {
            debug!(owner, relation, "No keys to populate");
            return Ok(None);
        }

        let query = SelectQuery::find(
            registry,
            &spec.related_entity,
            &ConditionTree::new(),
            filters,
            options,
        )?
        .with_keys(child_column, keys);

        Ok(Some(Self {
            parent_column: parent_column.to_string(),
            child_column: child_column.to_string(),
            relation: spec.clone(),
            query,
        }))
    }

    /// The relation being populated.
    pub fn relation(&self) -> &RelationSpec {
        &self.relation
    }

    /// The query to run.
    pub fn query(&self) -> &SelectQuery {
        &self.query
    }

    /// Attach fetched children to their parents under the relation name.
    ///
    /// To-one relations receive the matching child or `null` when it was
    /// filtered out; to-many relations receive an array.
    pub fn attach(&self, parents: &mut [Record], children: &[Record]) {
        for parent in parents.iter_mut() {
            let key = parent.get(&self.parent_column).cloned().unwrap_or(JsonValue::Null);
            let mut matches = children
                .iter()
                .filter(|child| !key.is_null() && child.get(&self.child_column) == Some(&key))
                .map(|child| JsonValue::Object(child.clone()));

            let value = if self.relation.relation_type.is_many() {
                JsonValue::Array(matches.collect())
            } else {
                matches.next().unwrap_or(JsonValue::Null)
            };
            parent.insert(self.relation.name.clone(), value);
        }
    }
}

/// Give every parent an empty value for a relation no query was needed
/// for: `null` for to-one relations, `[]` for to-many.
pub fn attach_empty(relation: &RelationSpec, parents: &mut [Record]) {
    let empty = if relation.relation_type.is_many() {
        JsonValue::Array(Vec::new())
    } else {
        JsonValue::Null
    };
    for parent in parents.iter_mut() {
        parent.insert(relation.name.clone(), empty.clone());
    }
}

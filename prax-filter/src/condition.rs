//! Condition trees: the declarative shape a filter produces.
//!
//! A [`ConditionTree`] is an ordered conjunction of [`Condition`] nodes.
//! Leaves compare a field of the current entity; [`Condition::Relation`]
//! nodes descend into a related entity and carry their own tree.
//!
//! ```rust
//! use prax_filter::{Condition, ConditionTree};
//!
//! // { owner: { location: [1, 2] }, deletedAt: null }
//! let tree = ConditionTree::new()
//!     .path("owner.location", vec![1i64, 2])
//!     .value("deletedAt", None::<i64>);
//!
//! assert_eq!(tree.len(), 2);
//! assert!(matches!(&tree.conditions()[0], Condition::Relation { name, .. } if name == "owner"));
//! ```

use serde_json::Value as JsonValue;

use crate::error::{QueryError, QueryResult};
use crate::filter::{FilterValue, ScalarFilter};

/// A single node of a condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Predicate on a field of the current entity.
    Field {
        /// Field name.
        name: String,
        /// Operator and operand.
        filter: ScalarFilter<FilterValue>,
    },
    /// Nested condition on a related entity.
    Relation {
        /// Relation field name.
        name: String,
        /// Condition on the related entity.
        tree: ConditionTree,
    },
    /// All of the trees hold.
    And(Vec<ConditionTree>),
    /// At least one of the trees holds.
    Or(Vec<ConditionTree>),
    /// The tree does not hold.
    Not(Box<ConditionTree>),
}

/// Ordered conjunction of conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionTree {
    conditions: Vec<Condition>,
}

impl ConditionTree {
    /// Create an empty tree (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if this tree has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Number of top-level conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Top-level conditions in insertion order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Append a raw condition.
    pub fn push(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Predicate on a field of this entity.
    pub fn field(self, name: impl Into<String>, filter: ScalarFilter<FilterValue>) -> Self {
        self.push(Condition::Field {
            name: name.into(),
            filter,
        })
    }

    /// Shorthand predicate: lists mean `IN`, null means `IS NULL`.
    pub fn value(self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.field(name, ScalarFilter::from_value(value))
    }

    /// Nested condition on a related entity.
    pub fn relation(self, name: impl Into<String>, tree: ConditionTree) -> Self {
        self.push(Condition::Relation {
            name: name.into(),
            tree,
        })
    }

    /// Shorthand predicate on a dotted path such as `owner.location`;
    /// every segment but the last becomes a nested relation condition.
    pub fn path(self, path: &str, value: impl Into<FilterValue>) -> Self {
        self.path_filter(path, ScalarFilter::from_value(value))
    }

    /// Explicit predicate on a dotted path.
    pub fn path_filter(self, path: &str, filter: ScalarFilter<FilterValue>) -> Self {
        let mut segments: Vec<&str> = path.split('.').collect();
        let leaf = segments.pop().unwrap_or_default();
        let mut condition = Condition::Field {
            name: leaf.to_string(),
            filter,
        };
        for segment in segments.into_iter().rev() {
            condition = Condition::Relation {
                name: segment.to_string(),
                tree: ConditionTree::new().push(condition),
            };
        }
        self.push(condition)
    }

    /// Logical AND group.
    pub fn and(self, trees: impl IntoIterator<Item = ConditionTree>) -> Self {
        self.push(Condition::And(trees.into_iter().collect()))
    }

    /// Logical OR group.
    pub fn or(self, trees: impl IntoIterator<Item = ConditionTree>) -> Self {
        self.push(Condition::Or(trees.into_iter().collect()))
    }

    /// Logical NOT.
    pub fn not(self, tree: ConditionTree) -> Self {
        self.push(Condition::Not(Box::new(tree)))
    }

    /// AND another tree onto this one at the root.
    pub fn merge(mut self, other: ConditionTree) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    /// Parse the object syntax used by filter definitions:
    ///
    /// - `$and`, `$or` take arrays of objects, `$not` takes an object;
    /// - an object whose keys are all comparison operators (`$in`, `$eq`,
    ///   `$gte`, ...) is a predicate on that field;
    /// - any other object is a nested condition on a relation;
    /// - arrays mean `IN`, `null` means `IS NULL`, scalars mean equality.
    ///
    /// ```rust
    /// use prax_filter::{Condition, ConditionTree};
    /// use serde_json::json;
    ///
    /// let tree = ConditionTree::from_json(&json!({
    ///     "managementObjects": { "owner": { "location": { "$in": [1] } } }
    /// }))
    /// .unwrap();
    ///
    /// assert!(matches!(&tree.conditions()[0], Condition::Relation { .. }));
    /// ```
    pub fn from_json(value: &JsonValue) -> QueryResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            QueryError::invalid_filter("", format!("Condition must be an object, got {}", value))
        })?;

        let mut tree = ConditionTree::new();
        for (key, value) in object {
            tree = match key.as_str() {
                "$and" => tree.and(parse_tree_list(key, value)?),
                "$or" => tree.or(parse_tree_list(key, value)?),
                "$not" => tree.not(ConditionTree::from_json(value)?),
                op if op.starts_with('$') => {
                    return Err(QueryError::invalid_filter(
                        "",
                        format!("Operator '{}' must be applied to a field", op),
                    ));
                }
                field => parse_field(tree, field, value)?,
            };
        }
        Ok(tree)
    }
}

fn parse_tree_list(key: &str, value: &JsonValue) -> QueryResult<Vec<ConditionTree>> {
    let items = value.as_array().ok_or_else(|| {
        QueryError::invalid_filter("", format!("'{}' expects an array of conditions", key))
    })?;
    items.iter().map(ConditionTree::from_json).collect()
}

fn parse_field(mut tree: ConditionTree, field: &str, value: &JsonValue) -> QueryResult<ConditionTree> {
    match value {
        JsonValue::Object(map) if is_operator_object(map) => {
            for (op, operand) in map {
                let filter = ScalarFilter::from_operator(op, operand).ok_or_else(|| {
                    QueryError::invalid_filter("", format!("Unknown operator '{}'", op))
                        .with_field(field)
                })?;
                tree = tree.field(field, filter);
            }
            Ok(tree)
        }
        JsonValue::Object(_) => Ok(tree.relation(field, ConditionTree::from_json(value)?)),
        other => Ok(tree.value(field, FilterValue::from(other))),
    }
}

/// Objects whose keys are operators compare a field; logical keys
/// (`$and`, `$or`, `$not`) keep an object a nested tree.
fn is_operator_object(map: &serde_json::Map<String, JsonValue>) -> bool {
    !map.is_empty()
        && map
            .keys()
            .all(|k| k.starts_with('$') && !matches!(k.as_str(), "$and" | "$or" | "$not"))
}

//! Join registration with alias reuse.
//!
//! Joins are keyed by their relation path from the query root
//! (`managementObjects.owner`), so every condition reaching the same path
//! shares one alias no matter which filter produced it.
//!
//! The joined entity's own filters travel with the join and end up in its
//! `ON` condition, so a related row that fails them counts as absent.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::clause::{Clause, ColumnRef};
use crate::relation::RelationSpec;

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinKind {
    /// `LEFT JOIN`: root rows survive when no related row exists.
    #[default]
    Left,
}

impl JoinKind {
    /// Get the SQL keyword for this join type.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Left => "LEFT JOIN",
        }
    }
}

/// A join to a related entity's table.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Alias of the joined table.
    pub alias: SmolStr,
    /// Alias of the table the relation is declared on.
    pub parent_alias: SmolStr,
    /// Relation path from the query root.
    pub path: String,
    /// Related entity name.
    pub entity: String,
    /// Related table name.
    pub table: String,
    /// Join type.
    pub kind: JoinKind,
    /// Column pairs `(parent, joined)` compared for equality.
    pub on: Vec<(ColumnRef, ColumnRef)>,
    /// Filters of the joined entity, ANDed into the `ON` condition. May
    /// reference joins nested below this one.
    pub filter: Clause,
}

#[derive(Debug)]
struct JoinEntry {
    join: Join,
    filtered: bool,
}

/// Join accumulator for one compilation.
///
/// Created fresh per query build and consumed by it; nothing here
/// outlives a single compilation.
#[derive(Debug)]
pub struct JoinContext {
    root_alias: SmolStr,
    alias_prefix: SmolStr,
    next_alias: usize,
    joins: IndexMap<String, JoinEntry>,
}

impl JoinContext {
    /// Create a context whose root table is aliased `root_alias`; joins
    /// are numbered `{alias_prefix}1`, `{alias_prefix}2`, ...
    pub fn new(root_alias: impl Into<SmolStr>, alias_prefix: impl Into<SmolStr>) -> Self {
        Self {
            root_alias: root_alias.into(),
            alias_prefix: alias_prefix.into(),
            next_alias: 1,
            joins: IndexMap::new(),
        }
    }

    /// Alias of the root table.
    pub fn root_alias(&self) -> &SmolStr {
        &self.root_alias
    }

    /// Number of joins registered so far.
    pub fn len(&self) -> usize {
        self.joins.len()
    }

    /// Check if no join has been registered.
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Register the join for `path`, or return the alias already
    /// registered for it.
    pub fn join(
        &mut self,
        path: &str,
        parent_alias: &SmolStr,
        relation: &RelationSpec,
        table: &str,
    ) -> SmolStr {
        if let Some(entry) = self.joins.get(path) {
            return entry.join.alias.clone();
        }

        let alias = SmolStr::new(format!("{}{}", self.alias_prefix, self.next_alias));
        self.next_alias += 1;

        let on = relation
            .key_pairs()
            .map(|(local, remote)| {
                (
                    ColumnRef::new(parent_alias.clone(), local),
                    ColumnRef::new(alias.clone(), remote),
                )
            })
            .collect();

        self.joins.insert(
            path.to_string(),
            JoinEntry {
                join: Join {
                    alias: alias.clone(),
                    parent_alias: parent_alias.clone(),
                    path: path.to_string(),
                    entity: relation.related_entity.clone(),
                    table: table.to_string(),
                    kind: JoinKind::Left,
                    on,
                    filter: Clause::True,
                },
                filtered: false,
            },
        );
        alias
    }

    /// Joined-entity filter clause already compiled for `path`.
    pub fn propagated(&self, path: &str) -> Option<&Clause> {
        self.joins
            .get(path)
            .filter(|e| e.filtered)
            .map(|e| &e.join.filter)
    }

    /// Attach the joined-entity filter clause compiled for `path`.
    pub fn set_propagated(&mut self, path: &str, clause: Clause) {
        if let Some(entry) = self.joins.get_mut(path) {
            entry.join.filter = clause;
            entry.filtered = true;
        }
    }

    /// Consume the context, yielding joins in registration order.
    pub fn into_joins(self) -> Vec<Join> {
        self.joins.into_values().map(|e| e.join).collect()
    }
}

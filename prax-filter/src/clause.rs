//! Structured output of filter compilation.
//!
//! A [`CompiledClause`] is what the SQL layer consumes: the joins a
//! condition depends on plus a predicate tree over aliased columns.

use std::fmt;

use smol_str::SmolStr;

use crate::filter::{FilterValue, ScalarFilter};
use crate::join::Join;

/// A column qualified by the alias of the table it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Table alias.
    pub alias: SmolStr,
    /// Column name.
    pub column: SmolStr,
}

impl ColumnRef {
    /// Create a column reference.
    pub fn new(alias: impl Into<SmolStr>, column: impl Into<SmolStr>) -> Self {
        Self {
            alias: alias.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.column)
    }
}

/// Predicate tree over aliased columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Always true (no restriction).
    True,
    /// Comparison on one column.
    Predicate {
        /// The column compared.
        column: ColumnRef,
        /// Operator and operand.
        filter: ScalarFilter<FilterValue>,
    },
    /// Logical AND.
    And(Vec<Clause>),
    /// Logical OR.
    Or(Vec<Clause>),
    /// Logical NOT.
    Not(Box<Clause>),
}

impl Clause {
    /// Comparison on one column.
    pub fn predicate(column: ColumnRef, filter: ScalarFilter<FilterValue>) -> Self {
        Self::Predicate { column, filter }
    }

    /// Check if this clause places no restriction.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// AND clauses together, flattening nested ANDs and dropping `True`
    /// and repeated parts.
    pub fn and(clauses: impl IntoIterator<Item = Clause>) -> Self {
        let mut parts: Vec<Clause> = Vec::new();
        for clause in clauses {
            let flattened = match clause {
                Self::True => Vec::new(),
                Self::And(inner) => inner,
                other => vec![other],
            };
            for part in flattened {
                if !parts.contains(&part) {
                    parts.push(part);
                }
            }
        }
        match parts.len() {
            0 => Self::True,
            1 => parts.pop().unwrap_or(Self::True),
            _ => Self::And(parts),
        }
    }

    /// OR clauses together; any `True` branch makes the whole clause true.
    pub fn or(clauses: impl IntoIterator<Item = Clause>) -> Self {
        let mut parts = Vec::new();
        for clause in clauses {
            match clause {
                Self::True => return Self::True,
                Self::Or(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Self::True,
            1 => parts.pop().unwrap_or(Self::True),
            _ => Self::Or(parts),
        }
    }

    /// Negate a clause. `NOT TRUE` stays a no-op.
    pub fn not(clause: Clause) -> Self {
        match clause {
            Self::True => Self::True,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Visit every predicate in the clause.
    pub fn predicates(&self) -> Vec<(&ColumnRef, &ScalarFilter<FilterValue>)> {
        let mut out = Vec::new();
        self.collect_predicates(&mut out);
        out
    }

    fn collect_predicates<'a>(&'a self, out: &mut Vec<(&'a ColumnRef, &'a ScalarFilter<FilterValue>)>) {
        match self {
            Self::True => {}
            Self::Predicate { column, filter } => out.push((column, filter)),
            Self::And(parts) | Self::Or(parts) => {
                for part in parts {
                    part.collect_predicates(out);
                }
            }
            Self::Not(inner) => inner.collect_predicates(out),
        }
    }
}

impl Default for Clause {
    fn default() -> Self {
        Self::True
    }
}

/// A compiled condition: joins plus the predicate over them.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledClause {
    /// Alias of the queried entity's table.
    pub root_alias: SmolStr,
    /// Joins the condition depends on, in registration order.
    pub joins: Vec<Join>,
    /// Predicate for the `WHERE` clause.
    pub condition: Clause,
}

impl CompiledClause {
    /// Check if compilation produced neither joins nor predicates.
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty() && self.condition.is_true()
    }

    /// Find the join registered for a relation path such as `owner.location`.
    pub fn join_for(&self, path: &str) -> Option<&Join> {
        self.joins.iter().find(|j| j.path == path)
    }
}

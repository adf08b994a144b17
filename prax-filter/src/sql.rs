//! SQL generation for compiled clauses.

use crate::clause::{Clause, ColumnRef};
use crate::filter::{FilterValue, ScalarFilter};
use crate::join::Join;

/// Escape a string for use in SQL (for identifiers, not values).
pub fn escape_identifier(name: &str) -> String {
    // Double any existing quotes
    let escaped = name.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Check if an identifier needs quoting.
pub fn needs_quoting(name: &str) -> bool {
    let reserved = [
        "user", "order", "group", "select", "from", "where", "table", "index",
        "key", "primary", "foreign", "check", "default", "null", "not", "and",
        "or", "in", "is", "like", "between", "case", "when", "then", "else",
        "end", "as", "on", "join", "left", "right", "inner", "outer", "cross",
        "natural", "using", "limit", "offset", "union", "intersect", "except",
        "all", "distinct", "having", "create", "alter", "drop", "insert",
        "update", "delete", "into", "values", "set", "returning",
    ];

    if reserved.contains(&name.to_lowercase().as_str()) {
        return true;
    }

    !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote an identifier if needed.
pub fn quote_identifier(name: &str) -> String {
    if needs_quoting(name) {
        escape_identifier(name)
    } else {
        name.to_string()
    }
}

/// Target SQL dialect; decides parameter placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseType {
    /// PostgreSQL uses $1, $2, etc.
    PostgreSQL,
    /// MySQL uses ?, ?, etc.
    MySQL,
    /// SQLite uses ?, ?, etc.
    #[default]
    SQLite,
}

impl DatabaseType {
    /// Get the parameter placeholder for this database type.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${}", index),
            Self::MySQL | Self::SQLite => "?".to_string(),
        }
    }
}

/// Accumulates SQL text and bound parameters.
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    db_type: DatabaseType,
    parts: Vec<String>,
    params: Vec<FilterValue>,
}

impl SqlBuilder {
    /// Create a new SQL builder.
    pub fn new(db_type: DatabaseType) -> Self {
        Self {
            db_type,
            parts: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Create a SQLite SQL builder.
    pub fn sqlite() -> Self {
        Self::new(DatabaseType::SQLite)
    }

    /// Push a literal SQL string.
    pub fn push(&mut self, sql: impl AsRef<str>) -> &mut Self {
        self.parts.push(sql.as_ref().to_string());
        self
    }

    /// Push a placeholder and bind its value.
    pub fn push_param(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        let index = self.params.len() + 1;
        self.parts.push(self.db_type.placeholder(index));
        self.params.push(value.into());
        self
    }

    /// Push an identifier (properly quoted if needed).
    pub fn push_identifier(&mut self, name: &str) -> &mut Self {
        self.parts.push(quote_identifier(name));
        self
    }

    /// Push an aliased column such as `e1.location_id`.
    pub fn push_column(&mut self, column: &ColumnRef) -> &mut Self {
        self.push_identifier(&column.alias)
            .push(".")
            .push_identifier(&column.column)
    }

    /// Push a separator between parts.
    pub fn push_sep(&mut self, sep: &str) -> &mut Self {
        self.parts.push(sep.to_string());
        self
    }

    /// Push joins, each preceded by a space.
    ///
    /// A join whose filter is not trivially true and that has joins nested
    /// below it is emitted as a group, `LEFT JOIN (t AS e1 LEFT JOIN ...) ON ...`,
    /// so its `ON` condition can see the nested aliases.
    pub fn push_joins(&mut self, joins: &[Join]) -> &mut Self {
        for join in joins.iter().filter(|j| !joins.iter().any(|p| p.alias == j.parent_alias)) {
            self.push_join(join, joins);
        }
        self
    }

    fn push_join(&mut self, join: &Join, joins: &[Join]) -> &mut Self {
        let children: Vec<&Join> = joins.iter().filter(|j| j.parent_alias == join.alias).collect();
        let grouped = !join.filter.is_true() && !children.is_empty();

        self.push(" ").push(join.kind.as_sql()).push(" ");
        if grouped {
            self.push("(");
        }
        self.push_identifier(&join.table).push(" AS ").push_identifier(&join.alias);
        if grouped {
            for child in &children {
                self.push_join(child, joins);
            }
            self.push(")");
        }

        self.push(" ON ");
        for (i, (parent, joined)) in join.on.iter().enumerate() {
            if i > 0 {
                self.push_sep(" AND ");
            }
            self.push_column(parent).push(" = ").push_column(joined);
        }
        if !join.filter.is_true() {
            self.push(" AND ").push_clause_inner(&join.filter, true);
        }

        if !grouped {
            for child in &children {
                self.push_join(child, joins);
            }
        }
        self
    }

    /// Push a clause as a boolean SQL expression.
    pub fn push_clause(&mut self, clause: &Clause) -> &mut Self {
        self.push_clause_inner(clause, false)
    }

    fn push_clause_inner(&mut self, clause: &Clause, nested: bool) -> &mut Self {
        match clause {
            Clause::True => self.push("TRUE"),
            Clause::Predicate { column, filter } => self.push_predicate(column, filter),
            Clause::And(parts) => self.push_group(parts, " AND ", nested),
            Clause::Or(parts) => self.push_group(parts, " OR ", nested),
            Clause::Not(inner) => {
                self.push("NOT (");
                self.push_clause_inner(inner, false);
                self.push(")")
            }
        }
    }

    fn push_group(&mut self, parts: &[Clause], sep: &str, nested: bool) -> &mut Self {
        if nested {
            self.push("(");
        }
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                self.push_sep(sep);
            }
            self.push_clause_inner(part, true);
        }
        if nested {
            self.push(")");
        }
        self
    }

    fn push_predicate(&mut self, column: &ColumnRef, filter: &ScalarFilter<FilterValue>) -> &mut Self {
        match filter {
            ScalarFilter::Equals(FilterValue::Null) | ScalarFilter::IsNull => {
                self.push_column(column).push(" IS NULL")
            }
            ScalarFilter::Not(v) if v.is_null() => self.push_column(column).push(" IS NOT NULL"),
            ScalarFilter::IsNotNull => self.push_column(column).push(" IS NOT NULL"),
            ScalarFilter::Equals(FilterValue::List(values)) | ScalarFilter::In(values) => {
                self.push_list(column, "IN", "FALSE", values)
            }
            ScalarFilter::NotIn(values) => self.push_list(column, "NOT IN", "TRUE", values),
            ScalarFilter::Equals(v) => self.push_comparison(column, "=", v),
            ScalarFilter::Not(v) => self.push_comparison(column, "<>", v),
            ScalarFilter::Lt(v) => self.push_comparison(column, "<", v),
            ScalarFilter::Lte(v) => self.push_comparison(column, "<=", v),
            ScalarFilter::Gt(v) => self.push_comparison(column, ">", v),
            ScalarFilter::Gte(v) => self.push_comparison(column, ">=", v),
            ScalarFilter::Like(v) => self.push_column(column).push(" LIKE ").push_param(like_text(v)),
            ScalarFilter::Contains(v) => self.push_like(column, v, "%", "%"),
            ScalarFilter::StartsWith(v) => self.push_like(column, v, "", "%"),
            ScalarFilter::EndsWith(v) => self.push_like(column, v, "%", ""),
        }
    }

    fn push_comparison(&mut self, column: &ColumnRef, op: &str, value: &FilterValue) -> &mut Self {
        self.push_column(column)
            .push(" ")
            .push(op)
            .push(" ")
            .push_param(value.clone())
    }

    fn push_list(&mut self, column: &ColumnRef, op: &str, empty: &str, values: &[FilterValue]) -> &mut Self {
        if values.is_empty() {
            return self.push(empty);
        }
        self.push_column(column).push(" ").push(op).push(" (");
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.push_sep(", ");
            }
            self.push_param(value.clone());
        }
        self.push(")")
    }

    /// Substring matches: the value is matched literally, wildcards and
    /// the escape character in it are escaped.
    fn push_like(&mut self, column: &ColumnRef, value: &FilterValue, prefix: &str, suffix: &str) -> &mut Self {
        let text = escape_like(&like_text(value));
        self.push_column(column)
            .push(" LIKE ")
            .push_param(format!("{}{}{}", prefix, text, suffix))
            .push(" ESCAPE '\\'")
    }

    /// Build the final SQL string and parameters.
    pub fn build(self) -> (String, Vec<FilterValue>) {
        (self.parts.join(""), self.params)
    }

    /// Get the current SQL string (without consuming).
    pub fn sql(&self) -> String {
        self.parts.join("")
    }

    /// Get the current parameters.
    pub fn params(&self) -> &[FilterValue] {
        &self.params
    }
}

impl Default for SqlBuilder {
    fn default() -> Self {
        Self::sqlite()
    }
}

fn like_text(value: &FilterValue) -> String {
    match value {
        FilterValue::String(s) => s.clone(),
        other => other.to_json().to_string(),
    }
}

/// Escape `%`, `_` and `\` so a value matches itself in a `LIKE ... ESCAPE '\'`.
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Render a clause on its own.
pub fn render_clause(clause: &Clause, db_type: DatabaseType) -> (String, Vec<FilterValue>) {
    let mut builder = SqlBuilder::new(db_type);
    builder.push_clause(clause);
    builder.build()
}

/// Render joins as `LEFT JOIN table AS alias ON ...`, space separated.
pub fn render_joins(joins: &[Join]) -> String {
    let mut builder = SqlBuilder::default();
    builder.push_joins(joins);
    builder.sql().trim_start().to_string()
}

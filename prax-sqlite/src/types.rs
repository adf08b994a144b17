//! Conversions between filter values, JSON records and SQLite values.

use rusqlite::types::{Value, ValueRef};
use serde_json::Value as JsonValue;

use prax_filter::filter::FilterValue;

use crate::error::{SqliteError, SqliteResult};

/// Convert a bound parameter to a SQLite value.
///
/// Lists only reach here as `IN` items are expanded by the renderer, so a
/// list parameter is stored as JSON text like any structured value.
pub fn filter_value_to_sqlite(value: &FilterValue) -> Value {
    match value {
        FilterValue::Null => Value::Null,
        FilterValue::Bool(b) => Value::Integer(i64::from(*b)),
        FilterValue::Int(i) => Value::Integer(*i),
        FilterValue::Float(f) => Value::Real(*f),
        FilterValue::String(s) => Value::Text(s.clone()),
        FilterValue::Json(_) | FilterValue::List(_) => Value::Text(value.to_json().to_string()),
    }
}

/// Convert a record field to a SQLite value for inserts.
pub fn json_to_sqlite(column: &str, value: &JsonValue) -> SqliteResult<Value> {
    match value {
        JsonValue::Number(n) if n.is_u64() && n.as_i64().is_none() => Err(
            SqliteError::type_conversion(format!("column '{}': number {} out of range", column, n)),
        ),
        other => Ok(filter_value_to_sqlite(&FilterValue::from(other))),
    }
}

/// Convert a SQLite value to JSON.
pub fn from_sqlite_value(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        ValueRef::Text(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect()),
    }
}

/// Read a whole row into a JSON map keyed by column name.
pub fn row_to_record(row: &rusqlite::Row<'_>, columns: &[String]) -> rusqlite::Result<serde_json::Map<String, JsonValue>> {
    let mut record = serde_json::Map::new();
    for (i, column) in columns.iter().enumerate() {
        record.insert(column.clone(), from_sqlite_value(row.get_ref(i)?));
    }
    Ok(record)
}

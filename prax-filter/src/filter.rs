//! Filter values and the scalar predicates that make up condition leaves.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A filter value that can be used in comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// JSON value.
    Json(JsonValue),
    /// List of values.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value carries a structured JSON object or array,
    /// directly or inside a list.
    pub fn is_structured(&self) -> bool {
        match self {
            Self::Json(JsonValue::Object(_)) | Self::Json(JsonValue::Array(_)) => true,
            Self::List(values) => values.iter().any(Self::is_structured),
            _ => false,
        }
    }

    /// Convert into a JSON value.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Json(j) => j.clone(),
            Self::List(values) => JsonValue::Array(values.iter().map(Self::to_json).collect()),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// Scalar JSON maps onto the matching variant; objects stay as `Json`.
impl From<&JsonValue> for FilterValue {
    fn from(v: &JsonValue) -> Self {
        match v {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            JsonValue::String(s) => Self::String(s.clone()),
            JsonValue::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            JsonValue::Object(_) => Self::Json(v.clone()),
        }
    }
}

/// Scalar filter operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarFilter<T> {
    /// Equals the value.
    Equals(T),
    /// Not equals the value.
    Not(Box<T>),
    /// In a list of values.
    In(Vec<T>),
    /// Not in a list of values.
    NotIn(Vec<T>),
    /// Less than.
    Lt(T),
    /// Less than or equal.
    Lte(T),
    /// Greater than.
    Gt(T),
    /// Greater than or equal.
    Gte(T),
    /// Raw `LIKE` pattern; `%` and `_` keep their wildcard meaning.
    Like(T),
    /// Contains (for strings).
    Contains(T),
    /// Starts with (for strings).
    StartsWith(T),
    /// Ends with (for strings).
    EndsWith(T),
    /// Is null.
    IsNull,
    /// Is not null.
    IsNotNull,
}

impl ScalarFilter<FilterValue> {
    /// Shorthand predicate for a bare value: lists mean `IN`, null means
    /// `IS NULL`, anything else is equality.
    pub fn from_value(value: impl Into<FilterValue>) -> Self {
        match value.into() {
            FilterValue::Null => Self::IsNull,
            FilterValue::List(values) => Self::In(values),
            other => Self::Equals(other),
        }
    }

    /// Parse an operator key such as `$in` together with its operand.
    ///
    /// Returns `None` for keys that are not comparison operators.
    pub fn from_operator(op: &str, operand: &JsonValue) -> Option<Self> {
        let value = FilterValue::from(operand);
        let list = |value: FilterValue| match value {
            FilterValue::List(values) => values,
            other => vec![other],
        };
        let filter = match op {
            "$eq" => match value {
                FilterValue::Null => Self::IsNull,
                other => Self::Equals(other),
            },
            "$ne" => match value {
                FilterValue::Null => Self::IsNotNull,
                other => Self::Not(Box::new(other)),
            },
            "$in" => Self::In(list(value)),
            "$nin" => Self::NotIn(list(value)),
            "$lt" => Self::Lt(value),
            "$lte" => Self::Lte(value),
            "$gt" => Self::Gt(value),
            "$gte" => Self::Gte(value),
            "$like" => Self::Like(value),
            "$contains" => Self::Contains(value),
            "$startsWith" => Self::StartsWith(value),
            "$endsWith" => Self::EndsWith(value),
            _ => return None,
        };
        Some(filter)
    }

    /// Every value this predicate compares against.
    pub fn values(&self) -> Vec<&FilterValue> {
        match self {
            Self::Equals(v)
            | Self::Lt(v)
            | Self::Lte(v)
            | Self::Gt(v)
            | Self::Gte(v)
            | Self::Like(v)
            | Self::Contains(v)
            | Self::StartsWith(v)
            | Self::EndsWith(v) => vec![v],
            Self::Not(v) => vec![v.as_ref()],
            Self::In(values) | Self::NotIn(values) => values.iter().collect(),
            Self::IsNull | Self::IsNotNull => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_value_from() {
        assert_eq!(FilterValue::from(42i32), FilterValue::Int(42));
        assert_eq!(FilterValue::from("hello"), FilterValue::String("hello".to_string()));
        assert_eq!(FilterValue::from(true), FilterValue::Bool(true));
        assert_eq!(FilterValue::from(None::<i64>), FilterValue::Null);
    }

    #[test]
    fn test_filter_value_from_json() {
        assert_eq!(FilterValue::from(&json!(7)), FilterValue::Int(7));
        assert_eq!(
            FilterValue::from(&json!([1, 2])),
            FilterValue::List(vec![FilterValue::Int(1), FilterValue::Int(2)])
        );
        assert!(matches!(FilterValue::from(&json!({"a": 1})), FilterValue::Json(_)));
    }

    #[test]
    fn test_structured_detection() {
        assert!(FilterValue::Json(json!({"location": {"$in": [1]}})).is_structured());
        assert!(FilterValue::List(vec![FilterValue::Json(json!([1]))]).is_structured());
        assert!(!FilterValue::List(vec![FilterValue::Int(1)]).is_structured());
        assert!(!FilterValue::Json(json!("text")).is_structured());
    }

    #[test]
    fn test_from_value_shorthand() {
        assert_eq!(ScalarFilter::from_value(FilterValue::Null), ScalarFilter::IsNull);
        assert_eq!(
            ScalarFilter::from_value(vec![1i64, 2]),
            ScalarFilter::In(vec![FilterValue::Int(1), FilterValue::Int(2)])
        );
        assert_eq!(
            ScalarFilter::from_value("x"),
            ScalarFilter::Equals(FilterValue::String("x".into()))
        );
    }

    #[test]
    fn test_from_operator() {
        assert_eq!(
            ScalarFilter::from_operator("$in", &json!([1])),
            Some(ScalarFilter::In(vec![FilterValue::Int(1)]))
        );
        assert_eq!(ScalarFilter::from_operator("$ne", &json!(null)), Some(ScalarFilter::IsNotNull));
        assert_eq!(
            ScalarFilter::from_operator("$gte", &json!(3)),
            Some(ScalarFilter::Gte(FilterValue::Int(3)))
        );
        assert_eq!(ScalarFilter::from_operator("$unknown", &json!(1)), None);
    }

    #[test]
    fn test_like_is_not_contains() {
        assert_eq!(
            ScalarFilter::from_operator("$like", &json!("CMO%")),
            Some(ScalarFilter::Like(FilterValue::String("CMO%".into())))
        );
        assert_eq!(
            ScalarFilter::from_operator("$contains", &json!("CMO")),
            Some(ScalarFilter::Contains(FilterValue::String("CMO".into())))
        );
    }
}

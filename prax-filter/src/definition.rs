//! Named, parameterized filter definitions and the set of filters active
//! for a query.
//!
//! ```rust
//! use prax_filter::{ActiveFilterSet, ConditionTree, FilterDefinition, FilterParams};
//!
//! let by_location = FilterDefinition::new("byLocation", |args| {
//!     Ok(ConditionTree::new().path("owner.location", args.require("locations")?.clone()))
//! })
//! .requires(["locations"]);
//!
//! let active = ActiveFilterSet::new()
//!     .enable_with("byLocation", FilterParams::new().set("locations", vec![1i64]))
//!     .enable("notDeleted");
//!
//! assert_eq!(by_location.name(), "byLocation");
//! assert_eq!(active.names().collect::<Vec<_>>(), vec!["byLocation", "notDeleted"]);
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::condition::ConditionTree;
use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;

/// Bound parameter values for one filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams {
    values: IndexMap<String, FilterValue>,
}

impl FilterParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a parameter.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Look up a parameter.
    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.values.get(name)
    }

    /// Check if a parameter is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

/// Arguments handed to a condition builder.
#[derive(Debug, Clone, Copy)]
pub struct FilterArgs<'a> {
    filter: &'a str,
    params: &'a FilterParams,
}

impl<'a> FilterArgs<'a> {
    /// Create arguments for the named filter.
    pub fn new(filter: &'a str, params: &'a FilterParams) -> Self {
        Self { filter, params }
    }

    /// Name of the filter being built.
    pub fn filter(&self) -> &str {
        self.filter
    }

    /// Optional parameter.
    pub fn get(&self, name: &str) -> Option<&'a FilterValue> {
        self.params.get(name)
    }

    /// Required parameter; missing values fail naming the filter.
    pub fn require(&self, name: &str) -> QueryResult<&'a FilterValue> {
        self.params
            .get(name)
            .ok_or_else(|| QueryError::missing_parameter(self.filter, name))
    }
}

type ConditionBuilder = dyn Fn(&FilterArgs<'_>) -> QueryResult<ConditionTree> + Send + Sync;

/// A named filter registered on an entity type.
#[derive(Clone)]
pub struct FilterDefinition {
    name: SmolStr,
    builder: Arc<ConditionBuilder>,
    required: Vec<String>,
    default: bool,
}

impl FilterDefinition {
    /// Create a filter from a condition builder.
    pub fn new<F>(name: impl Into<SmolStr>, builder: F) -> Self
    where
        F: Fn(&FilterArgs<'_>) -> QueryResult<ConditionTree> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            builder: Arc::new(builder),
            required: Vec::new(),
            default: false,
        }
    }

    /// Create a parameterless filter with a fixed condition.
    pub fn constant(name: impl Into<SmolStr>, tree: ConditionTree) -> Self {
        Self::new(name, move |_| Ok(tree.clone()))
    }

    /// Declare parameters that must be bound before the builder runs.
    pub fn requires(mut self, params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.required.extend(params.into_iter().map(Into::into));
        self
    }

    /// Enable this filter unless a query disables it.
    pub fn default_enabled(mut self, enabled: bool) -> Self {
        self.default = enabled;
        self
    }

    /// Filter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the filter is enabled by default.
    pub fn is_default(&self) -> bool {
        self.default
    }

    /// Run the condition builder against bound parameters.
    pub fn build(&self, params: &FilterParams) -> QueryResult<ConditionTree> {
        if let Some(missing) = self.required.iter().find(|p| !params.contains(p)) {
            return Err(QueryError::missing_parameter(self.name.as_str(), missing.as_str()));
        }
        (self.builder)(&FilterArgs::new(&self.name, params))
    }
}

impl fmt::Debug for FilterDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDefinition")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Filters requested for a query, with their bound parameters.
///
/// Insertion order is kept so compiled output is reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveFilterSet {
    enabled: IndexMap<SmolStr, FilterParams>,
    disabled: Vec<SmolStr>,
}

impl ActiveFilterSet {
    /// Create an empty set (default filters still apply).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable a filter without parameters.
    pub fn enable(self, name: impl Into<SmolStr>) -> Self {
        self.enable_with(name, FilterParams::new())
    }

    /// Enable a filter with bound parameters.
    pub fn enable_with(mut self, name: impl Into<SmolStr>, params: FilterParams) -> Self {
        let name = name.into();
        self.disabled.retain(|d| d != &name);
        self.enabled.insert(name, params);
        self
    }

    /// Disable a filter, including default-enabled ones.
    pub fn disable(mut self, name: impl Into<SmolStr>) -> Self {
        let name = name.into();
        self.enabled.shift_remove(&name);
        if !self.disabled.contains(&name) {
            self.disabled.push(name);
        }
        self
    }

    /// Check if no filter is explicitly enabled.
    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    /// Explicitly enabled filter names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.enabled.keys().map(SmolStr::as_str)
    }

    /// Bound parameters for a filter; empty when none were bound.
    pub fn params(&self, name: &str) -> Option<&FilterParams> {
        self.enabled.get(name)
    }

    /// Whether a filter was explicitly enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains_key(name)
    }

    /// Whether a filter was explicitly disabled.
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d == name)
    }
}

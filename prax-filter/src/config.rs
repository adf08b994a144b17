//! Compilation options, loadable from the `[filters]` table of a TOML file.
//!
//! ```toml
//! [filters]
//! propagate_to_joins = true
//! root_alias = "e0"
//! alias_prefix = "e"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// Options controlling filter compilation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Apply the joined entity's active filters to every join a condition
    /// introduces.
    pub propagate_to_joins: bool,
    /// Alias of the queried entity's table.
    pub root_alias: String,
    /// Prefix for join aliases; joins are numbered from 1.
    pub alias_prefix: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            propagate_to_joins: true,
            root_alias: "e0".to_string(),
            alias_prefix: "e".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    filters: CompileOptions,
}

impl CompileOptions {
    /// Disable joined-entity filter propagation.
    pub fn without_propagation(mut self) -> Self {
        self.propagate_to_joins = false;
        self
    }

    /// Parse options from TOML; a missing `[filters]` table yields defaults.
    pub fn from_toml_str(content: &str) -> QueryResult<Self> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| {
            QueryError::invalid_configuration(format!("Invalid filter configuration: {}", e))
                .with_source(e)
        })?;
        file.filters.validate()?;
        Ok(file.filters)
    }

    /// Load options from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryError::invalid_configuration(format!("Cannot read {}: {}", path.display(), e))
                .with_source(e)
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> QueryResult<()> {
        let valid = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid(&self.root_alias) || !valid(&self.alias_prefix) {
            return Err(QueryError::invalid_configuration(
                "root_alias and alias_prefix must be non-empty identifiers",
            ));
        }
        if self.root_alias.starts_with(&self.alias_prefix)
            && self.root_alias[self.alias_prefix.len()..]
                .parse::<usize>()
                .is_ok_and(|n| n > 0)
        {
            return Err(QueryError::invalid_configuration(format!(
                "root_alias '{}' collides with join aliases '{}1', '{}2', ...",
                self.root_alias, self.alias_prefix, self.alias_prefix
            )));
        }
        Ok(())
    }
}

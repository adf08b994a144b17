//! Error types for filter compilation with actionable messages.
//!
//! Every error carries an [`ErrorCode`] for programmatic handling plus an
//! [`ErrorContext`] describing the entity, field and filter involved.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: P{category}{number}
//! - 1xxx: Mapping and condition errors (unknown field, invalid filter)
//! - 5xxx: Execution errors raised by drivers
//! - 6xxx: Data errors (serialization)
//! - 7xxx: Configuration errors (unknown filter, missing parameter)
//! - 9xxx: Internal errors
//!
//! ```rust
//! use prax_filter::{ErrorCode, QueryError};
//!
//! let err = QueryError::unknown_filter("byLocation");
//! assert_eq!(err.code, ErrorCode::UnknownFilter);
//! assert!(err.is_configuration_error());
//!
//! let err = QueryError::missing_parameter("byLocation", "locations");
//! assert!(err.to_string().contains("locations"));
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for filter and query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Mapping errors (1xxx)
    /// Invalid filter or where clause (P1003).
    InvalidFilter = 1003,
    /// Field does not exist on the entity at that depth (P1006).
    UnknownField = 1006,
    /// Entity is not registered (P1007).
    UnknownEntity = 1007,
    /// Relation cannot be populated (P1008).
    InvalidPopulate = 1008,

    // Execution errors (5xxx)
    /// General database error (P5005).
    DatabaseError = 5005,

    // Data errors (6xxx)
    /// Serialization error (P6002).
    SerializationError = 6002,

    // Configuration errors (7xxx)
    /// Invalid configuration (P7001).
    InvalidConfiguration = 7001,
    /// Filter name is not registered on any entity (P7004).
    UnknownFilter = 7004,
    /// Bound parameter required by a filter is missing (P7005).
    MissingParameter = 7005,

    // Internal errors (9xxx)
    /// Internal error (P9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "P1006").
    pub fn code(&self) -> String {
        format!("P{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidFilter => "Invalid filter condition",
            Self::UnknownField => "Unknown field",
            Self::UnknownEntity => "Unknown entity",
            Self::InvalidPopulate => "Invalid populate hint",
            Self::DatabaseError => "Database error",
            Self::SerializationError => "Serialization error",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::UnknownFilter => "Unknown filter",
            Self::MissingParameter => "Missing filter parameter",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The entity involved.
    pub entity: Option<String>,
    /// The field or relation path involved.
    pub field: Option<String>,
    /// The filter involved.
    pub filter: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
}

/// Errors that can occur while merging, compiling or executing filters.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Set the entity.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.context.entity = Some(entity.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.context.filter = Some(filter.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// A filter name that no entity defines.
    pub fn unknown_filter(filter: impl Into<String>) -> Self {
        let filter = filter.into();
        Self::new(
            ErrorCode::UnknownFilter,
            format!("Filter '{}' is not defined on any entity", filter),
        )
        .with_filter(&filter)
        .with_suggestion("Register the filter on the entity metadata before querying")
    }

    /// A filter was activated without one of its required parameters.
    pub fn missing_parameter(filter: impl Into<String>, param: impl Into<String>) -> Self {
        let filter = filter.into();
        let param = param.into();
        Self::new(
            ErrorCode::MissingParameter,
            format!("Filter '{}' requires parameter '{}' which was not bound", filter, param),
        )
        .with_filter(&filter)
        .with_field(&param)
        .with_suggestion(format!(
            "Bind '{}' when enabling '{}' on the active filter set",
            param, filter
        ))
    }

    /// A condition names a field that does not exist at that nesting level.
    pub fn unknown_field(entity: impl Into<String>, path: impl Into<String>) -> Self {
        let entity = entity.into();
        let path = path.into();
        Self::new(
            ErrorCode::UnknownField,
            format!("Entity '{}' has no field for condition path '{}'", entity, path),
        )
        .with_entity(&entity)
        .with_field(&path)
    }

    /// An entity name that is not registered.
    pub fn unknown_entity(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self::new(
            ErrorCode::UnknownEntity,
            format!("Entity '{}' is not registered", entity),
        )
        .with_entity(&entity)
    }

    /// A condition that cannot be compiled as written.
    pub fn invalid_filter(entity: impl Into<String>, message: impl Into<String>) -> Self {
        let entity = entity.into();
        Self::new(ErrorCode::InvalidFilter, message.into()).with_entity(&entity)
    }

    /// A populate hint that does not name a relation.
    pub fn invalid_populate(entity: impl Into<String>, relation: impl Into<String>) -> Self {
        let entity = entity.into();
        let relation = relation.into();
        Self::new(
            ErrorCode::InvalidPopulate,
            format!("Cannot populate '{}' on '{}': not a relation", relation, entity),
        )
        .with_entity(&entity)
        .with_field(&relation)
    }

    /// A populate hint on a relation joined by more than one column pair.
    pub fn composite_populate(entity: impl Into<String>, relation: impl Into<String>) -> Self {
        let entity = entity.into();
        let relation = relation.into();
        Self::new(
            ErrorCode::InvalidPopulate,
            format!(
                "Cannot populate '{}' on '{}': relations with composite keys are not supported",
                relation, entity
            ),
        )
        .with_entity(&entity)
        .with_field(&relation)
        .with_suggestion("Query the related entity directly with a condition on every key column")
    }

    /// Two filters with the same name registered on one entity.
    pub fn duplicate_filter(entity: impl Into<String>, filter: impl Into<String>) -> Self {
        let entity = entity.into();
        let filter = filter.into();
        Self::new(
            ErrorCode::InvalidConfiguration,
            format!("Filter '{}' is defined more than once on entity '{}'", filter, entity),
        )
        .with_entity(&entity)
        .with_filter(&filter)
        .with_suggestion("Give each filter on an entity a unique name")
    }

    /// Invalid configuration.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message.into())
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message.into())
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message.into())
            .with_suggestion("Check the database logs for more details")
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message.into()))
    }

    // ============== Error Checks ==============

    /// Configuration errors surface problems in filter registration or binding.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UnknownFilter | ErrorCode::MissingParameter | ErrorCode::InvalidConfiguration
        )
    }

    /// Mapping errors surface conditions that do not fit the entity metadata.
    pub fn is_mapping_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UnknownField | ErrorCode::UnknownEntity | ErrorCode::InvalidFilter
        )
    }

    /// Display the full error with context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = format!("Error [{}]: {}\n", self.code.code(), self.message);

        if let Some(ref entity) = self.context.entity {
            output.push_str(&format!("  → Entity: {}\n", entity));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }
        if let Some(ref filter) = self.context.filter {
            output.push_str(&format!("  → Filter: {}\n", filter));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

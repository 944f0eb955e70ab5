//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`RuleHubError`] via `#[from]`. Storage adapters wrap their backend
//! failures in [`StorageError`] at the port boundary.

use serde::{Deserialize, Serialize};

/// Invariant violation detected before anything touches storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// The rule or template name is empty.
    #[error("name must not be empty")]
    EmptyName,
    /// The owning organization is empty.
    #[error("organization must not be empty")]
    EmptyOrganization,
    /// A rule declared no actions.
    #[error("at least one action is required")]
    NoActions,
    /// A required template variable was not supplied and has no default.
    #[error("required variable '{0}' not provided")]
    MissingVariable(String),
    /// A template variable value does not match its declared kind.
    #[error("variable '{name}' expects a {expected} value")]
    VariableType { name: String, expected: String },
    /// A field-level failure reported by the condition or rule validator.
    #[error("{field}: {message}")]
    Invalid { field: String, message: String },
}

impl ValidationError {
    /// Build a field-level validation error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Lookup failure for a typed identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Entity kind, e.g. `"Rule"` or `"Execution"`.
    pub entity: &'static str,
    /// Rendered identifier of the missing record.
    pub id: String,
}

/// Failure reported by a storage backend behind one of the port traits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StorageError {
    pub message: String,
}

impl StorageError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure in the execution state machine or an action run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced by rulehub use-cases and ports.
#[derive(Debug, thiserror::Error)]
pub enum RuleHubError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),
}

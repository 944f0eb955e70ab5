//! Validation and test reports.
//!
//! Unlike [`crate::error::ValidationError`], which aborts an operation on
//! the first problem, a report collects every finding so callers can show
//! them all at once.

use serde::{Deserialize, Serialize};

use crate::execution::ActionOutcome;
use crate::id::RuleId;

/// One finding, tied to the field that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Collected findings for a rule or a condition tree.
///
/// `valid` is false exactly when `errors` is non-empty; warnings alone do
/// not fail validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::valid()
    }
}

impl ValidationReport {
    /// An empty, passing report.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record an error and mark the report failed.
    pub fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationIssue::new(field, message));
    }

    /// Record a warning without failing the report.
    pub fn warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue::new(field, message));
    }

    /// Merge another report in, prefixing its fields.
    pub fn absorb(&mut self, prefix: &str, other: Self) {
        self.valid = self.valid && other.valid;
        for issue in other.errors {
            self.errors
                .push(ValidationIssue::new(format!("{prefix}{}", issue.field), issue.message));
        }
        for issue in other.warnings {
            self.warnings
                .push(ValidationIssue::new(format!("{prefix}{}", issue.field), issue.message));
        }
    }

    /// First error message, if any.
    #[must_use]
    pub fn first_error(&self) -> Option<&ValidationIssue> {
        self.errors.first()
    }
}

/// Outcome of a dry run of a rule against a sample event.
///
/// Action outcomes are simulated; nothing external was called.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTestReport {
    pub rule_id: RuleId,
    pub conditions_matched: bool,
    #[serde(default)]
    pub actions: Vec<ActionOutcome>,
    pub duration: std::time::Duration,
    #[serde(default)]
    pub errors: Vec<String>,
}

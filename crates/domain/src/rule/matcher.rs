//! Payload matchers — pointwise predicates over the event payload.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operator applied between a resolved payload value and the
/// matcher's expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOp {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
    GreaterThan,
    LessThan,
    Exists,
    NotExists,
    Empty,
    NotEmpty,
}

impl MatchOp {
    /// Wire-format name of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Regex => "regex",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
            Self::Empty => "empty",
            Self::NotEmpty => "not_empty",
        }
    }
}

impl fmt::Display for MatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One predicate over a payload location.
///
/// `path` is JSON-path-like and must be rooted at `$` (or `@`), e.g.
/// `$.pull_request.number`. String comparisons fold case unless
/// `case_sensitive` is set; `regex` patterns get a `(?i)` prefix instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadMatcher {
    pub path: String,
    pub op: MatchOp,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl PayloadMatcher {
    /// Build a case-insensitive matcher.
    #[must_use]
    pub fn new(path: impl Into<String>, op: MatchOp, value: serde_json::Value) -> Self {
        Self {
            path: path.into(),
            op,
            value,
            case_sensitive: false,
        }
    }

    /// Toggle case-sensitive comparison.
    #[must_use]
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

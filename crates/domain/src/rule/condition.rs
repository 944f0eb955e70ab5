//! Condition tree — the predicate DSL a rule matches events with.
//!
//! Conditions are grouped into categories (event, repository, content,
//! time, payload) that are evaluated independently and folded with a
//! [`LogicalOp`]. The tree is recursive: `sub_conditions` nest whole
//! condition groups, each folded by its own operator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{EventAction, EventKind};
use crate::time::Timestamp;

use super::PayloadMatcher;

/// How the per-category verdicts of a [`RuleConditions`] fold into one
/// verdict.
///
/// `And` is true when at least one category was evaluated and none failed —
/// a tree with nothing configured is therefore false under `And`. `Or` is
/// true when at least one category matched. `Not` is true exactly when zero
/// categories matched; failed categories alone do not make `Not` true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOp {
    #[default]
    And,
    Or,
    Not,
}

impl LogicalOp {
    /// Wire-format name of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository visibility as reported by the hosting platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Internal,
}

impl Visibility {
    /// Wire-format name of the visibility.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Absolute time window, inclusive at the start and exclusive at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    /// True when `start <= at < end`.
    #[must_use]
    pub fn contains(&self, at: Timestamp) -> bool {
        at >= self.start && at < self.end
    }
}

/// The full predicate tree attached to a rule.
///
/// Every field is optional; an empty field means the corresponding
/// predicate is not configured and its category is skipped during
/// evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConditions {
    // Event category: identity of the happening itself.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub event_kinds: Vec<EventKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub event_actions: Vec<EventAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,

    // Repository category: attributes looked up from the platform.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repository_patterns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub visibility: Vec<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<bool>,

    // Content category: branch and file information from the payload.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branch_patterns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_patterns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path_patterns: Vec<String>,

    // Time category: when the event happened, in the evaluation timezone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// Days of the week, `0` = Sunday through `6` = Saturday.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<u8>,
    /// Hours of the day, `0..=23`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hours_of_day: Vec<u8>,
    pub business_hours: bool,

    // Payload category: pointwise matchers over the event payload.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub payload_matchers: Vec<PayloadMatcher>,

    pub operator: LogicalOp,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_conditions: Vec<RuleConditions>,
}

impl RuleConditions {
    /// True when any event-identity predicate is configured.
    #[must_use]
    pub fn has_event_conditions(&self) -> bool {
        !self.event_kinds.is_empty()
            || !self.event_actions.is_empty()
            || self.organization.is_some()
            || self.repository.is_some()
            || self.sender.is_some()
    }

    /// True when any repository-attribute predicate is configured.
    #[must_use]
    pub fn has_repository_conditions(&self) -> bool {
        !self.repository_patterns.is_empty()
            || !self.languages.is_empty()
            || !self.topics.is_empty()
            || !self.visibility.is_empty()
            || self.archived.is_some()
            || self.template.is_some()
    }

    /// True when any branch/file/path predicate is configured.
    #[must_use]
    pub fn has_content_conditions(&self) -> bool {
        !self.branch_patterns.is_empty()
            || !self.file_patterns.is_empty()
            || !self.path_patterns.is_empty()
    }

    /// True when any time-of-happening predicate is configured.
    #[must_use]
    pub fn has_time_conditions(&self) -> bool {
        self.time_range.is_some()
            || !self.days_of_week.is_empty()
            || !self.hours_of_day.is_empty()
            || self.business_hours
    }
}

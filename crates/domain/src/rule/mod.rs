//! Rule — condition tree → ordered action list, scoped to an organization.
//!
//! Rules are the unit of automation: when an [`Event`](crate::event::Event)
//! for the rule's organization satisfies its [`RuleConditions`], the rule's
//! [`Action`]s are executed in order and tracked as an
//! [`Execution`](crate::execution::Execution).

mod action;
mod condition;
mod matcher;

pub use action::{Action, ActionKind, FailurePolicy};
pub use condition::{LogicalOp, RuleConditions, TimeRange, Visibility};
pub use matcher::{MatchOp, PayloadMatcher};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RuleHubError, ValidationError};
use crate::event::EventKind;
use crate::id::RuleId;
use crate::time::Timestamp;

/// Priority assigned when a rule does not specify one.
pub const DEFAULT_PRIORITY: i64 = 100;

/// Free-form classification attached to a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleMetadata {
    pub category: String,
    pub environment: String,
    pub owner: String,
    pub custom: BTreeMap<String, serde_json::Value>,
}

/// An automation rule for one GitHub organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub organization: String,
    pub enabled: bool,
    /// Higher priorities are evaluated and listed first.
    pub priority: i64,
    /// Monotonic revision counter: 1 on create, +1 on every update.
    #[serde(default)]
    pub version: u64,
    pub conditions: RuleConditions,
    pub actions: Vec<Action>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub metadata: RuleMetadata,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub created_by: String,
}

impl Rule {
    /// Create a builder for constructing a [`Rule`].
    #[must_use]
    pub fn builder(name: impl Into<String>, organization: impl Into<String>) -> RuleBuilder {
        RuleBuilder {
            id: None,
            name: name.into(),
            description: String::new(),
            organization: organization.into(),
            enabled: None,
            priority: None,
            conditions: RuleConditions::default(),
            actions: Vec::new(),
            tags: BTreeMap::new(),
            metadata: RuleMetadata::default(),
            created_by: String::new(),
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `organization` is empty ([`ValidationError::EmptyOrganization`])
    /// - `actions` is empty ([`ValidationError::NoActions`])
    pub fn validate(&self) -> Result<(), RuleHubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.organization.is_empty() {
            return Err(ValidationError::EmptyOrganization.into());
        }
        if self.actions.is_empty() {
            return Err(ValidationError::NoActions.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Rule`].
#[derive(Debug)]
pub struct RuleBuilder {
    id: Option<RuleId>,
    name: String,
    description: String,
    organization: String,
    enabled: Option<bool>,
    priority: Option<i64>,
    conditions: RuleConditions,
    actions: Vec<Action>,
    tags: BTreeMap<String, String>,
    metadata: RuleMetadata,
    created_by: String,
}

impl RuleBuilder {
    #[must_use]
    pub fn id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn conditions(mut self, conditions: RuleConditions) -> Self {
        self.conditions = conditions;
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: RuleMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    /// Consume the builder, validate, and return a [`Rule`].
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Validation`] if required fields are missing
    /// or empty.
    pub fn build(self) -> Result<Rule, RuleHubError> {
        let now = crate::time::now();
        let rule = Rule {
            id: self.id.unwrap_or_default(),
            name: self.name,
            description: self.description,
            organization: self.organization,
            enabled: self.enabled.unwrap_or(true),
            priority: self.priority.unwrap_or(DEFAULT_PRIORITY),
            version: 1,
            conditions: self.conditions,
            actions: self.actions,
            tags: self.tags,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
            created_by: self.created_by,
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// Storage-level filter for rule listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleFilter {
    pub enabled: Option<bool>,
    pub category: Option<String>,
    pub created_by: Option<String>,
    pub event_kind: Option<EventKind>,
    /// Tag keys that must all be present on the rule.
    pub tags: Vec<String>,
}

impl RuleFilter {
    /// Filter that keeps only enabled rules.
    #[must_use]
    pub fn enabled_only() -> Self {
        Self {
            enabled: Some(true),
            ..Self::default()
        }
    }

    /// Whether `rule` passes this filter. A rule with no event-kind
    /// restriction passes any `event_kind` filter.
    #[must_use]
    pub fn matches(&self, rule: &Rule) -> bool {
        if self.enabled.is_some_and(|enabled| rule.enabled != enabled) {
            return false;
        }
        if self
            .category
            .as_ref()
            .is_some_and(|category| &rule.metadata.category != category)
        {
            return false;
        }
        if self
            .created_by
            .as_ref()
            .is_some_and(|creator| &rule.created_by != creator)
        {
            return false;
        }
        if self.event_kind.is_some_and(|kind| {
            !rule.conditions.event_kinds.is_empty() && !rule.conditions.event_kinds.contains(&kind)
        }) {
            return false;
        }
        self.tags.iter().all(|tag| rule.tags.contains_key(tag))
    }
}

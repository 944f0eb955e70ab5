//! Rule set — a named grouping of rules managed as one unit.

use serde::{Deserialize, Serialize};

use crate::id::RuleSetId;
use crate::rule::Rule;
use crate::time::{self, Timestamp};

/// A named collection of rules for one organization.
///
/// Sets are an organizational convenience: member rules still evaluate and
/// execute individually. Disabling a set is a bulk toggle, not a new
/// evaluation semantic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: RuleSetId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub organization: String,
    pub enabled: bool,
    pub rules: Vec<Rule>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub created_by: String,
}

impl RuleSet {
    /// Create an empty, enabled set.
    #[must_use]
    pub fn new(name: impl Into<String>, organization: impl Into<String>) -> Self {
        let now = time::now();
        Self {
            id: RuleSetId::new(),
            name: name.into(),
            description: String::new(),
            organization: organization.into(),
            enabled: true,
            rules: Vec::new(),
            created_at: now,
            updated_at: now,
            created_by: String::new(),
        }
    }

    /// Append a rule to the set.
    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Action, ActionKind};

    #[test]
    fn should_create_enabled_empty_set() {
        let set = RuleSet::new("hygiene", "acme");
        assert!(set.enabled);
        assert!(set.rules.is_empty());
        assert_eq!(set.organization, "acme");
    }

    #[test]
    fn should_collect_rules_in_insertion_order() {
        let first = Rule::builder("first", "acme")
            .action(Action::new(ActionKind::AddLabel, "label"))
            .build()
            .unwrap();
        let second = Rule::builder("second", "acme")
            .action(Action::new(ActionKind::CreateIssue, "file"))
            .build()
            .unwrap();
        let set = RuleSet::new("hygiene", "acme")
            .with_rule(first.clone())
            .with_rule(second.clone());
        assert_eq!(set.rules, vec![first, second]);
    }
}

//! Template — a parameterized rule body instantiated per organization.
//!
//! Template bodies are ordinary rules whose string fields may contain
//! `{{variable}}` placeholders. Instantiation substitutes declared
//! variables (typed replacement when a string is exactly one placeholder,
//! textual splice otherwise) and assigns the materialized rule a fresh
//! identity.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RuleHubError, ValidationError};
use crate::id::{RuleId, TemplateId};
use crate::rule::Rule;
use crate::time::{self, Timestamp};

/// Declared type of a template variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl VariableKind {
    /// Wire-format name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Whether `value` is of this kind.
    #[must_use]
    pub fn admits(self, value: &serde_json::Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One substitutable parameter of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVariable {
    pub name: String,
    pub kind: VariableKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
}

impl TemplateVariable {
    /// Declare an optional variable without a default.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            required: false,
            default_value: None,
        }
    }

    /// Mark the variable required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attach a default value.
    #[must_use]
    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// A reusable, parameterized rule body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub rule: Rule,
    #[serde(default)]
    pub variables: Vec<TemplateVariable>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub created_by: String,
}

impl Template {
    /// Create a template around an existing rule body.
    #[must_use]
    pub fn new(name: impl Into<String>, category: impl Into<String>, rule: Rule) -> Self {
        let now = time::now();
        Self {
            id: TemplateId::new(),
            name: name.into(),
            description: String::new(),
            category: category.into(),
            rule,
            variables: Vec::new(),
            created_at: now,
            updated_at: now,
            created_by: String::new(),
        }
    }

    /// Declare a variable.
    #[must_use]
    pub fn with_variable(mut self, variable: TemplateVariable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Check template invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Validation`] when the name is empty, a
    /// variable name is empty or duplicated, or a default value does not
    /// match its variable's declared kind.
    pub fn validate(&self) -> Result<(), RuleHubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let mut seen = BTreeMap::new();
        for (index, variable) in self.variables.iter().enumerate() {
            if variable.name.is_empty() {
                return Err(ValidationError::invalid(
                    format!("variables[{index}].name"),
                    "must not be empty",
                )
                .into());
            }
            if seen.insert(variable.name.as_str(), index).is_some() {
                return Err(ValidationError::invalid(
                    format!("variables[{index}].name"),
                    format!("duplicate variable name '{}'", variable.name),
                )
                .into());
            }
            if let Some(default) = &variable.default_value {
                if !variable.kind.admits(default) {
                    return Err(ValidationError::VariableType {
                        name: variable.name.clone(),
                        expected: variable.kind.as_str().to_string(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Materialize a rule from the template body.
    ///
    /// Provided `values` override declared defaults. The returned rule has
    /// a fresh id, version 1, and fresh timestamps; it is not persisted.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Validation`] when a required variable is
    /// missing ([`ValidationError::MissingVariable`]), a value does not
    /// match its variable's kind ([`ValidationError::VariableType`]), or
    /// substitution produced a body that no longer deserializes as a rule.
    pub fn instantiate(
        &self,
        values: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Rule, RuleHubError> {
        let mut resolved = BTreeMap::new();
        for variable in &self.variables {
            let value = values
                .get(&variable.name)
                .or(variable.default_value.as_ref());
            match value {
                Some(value) => {
                    if !variable.kind.admits(value) {
                        return Err(ValidationError::VariableType {
                            name: variable.name.clone(),
                            expected: variable.kind.as_str().to_string(),
                        }
                        .into());
                    }
                    resolved.insert(variable.name.clone(), value.clone());
                }
                None if variable.required => {
                    return Err(ValidationError::MissingVariable(variable.name.clone()).into());
                }
                None => {}
            }
        }

        let mut body = serde_json::to_value(&self.rule)
            .map_err(|err| ValidationError::invalid("rule", err.to_string()))?;
        substitute(&mut body, &resolved);
        let mut rule: Rule = serde_json::from_value(body).map_err(|err| {
            ValidationError::invalid("rule", format!("substitution produced an invalid rule: {err}"))
        })?;

        rule.id = RuleId::new();
        rule.version = 1;
        let now = time::now();
        rule.created_at = now;
        rule.updated_at = now;
        Ok(rule)
    }
}

/// Replace `{{name}}` placeholders throughout a JSON tree.
fn substitute(value: &mut serde_json::Value, vars: &BTreeMap<String, serde_json::Value>) {
    if let Some(replacement) = whole_replacement(value, vars) {
        *value = replacement;
        return;
    }
    match value {
        serde_json::Value::String(text) => {
            for (name, replacement) in vars {
                let placeholder = format!("{{{{{name}}}}}");
                if text.contains(&placeholder) {
                    *text = text.replace(&placeholder, &render(replacement));
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                substitute(item, vars);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values_mut() {
                substitute(item, vars);
            }
        }
        _ => {}
    }
}

/// Typed replacement when a string is exactly one placeholder.
fn whole_replacement(
    value: &serde_json::Value,
    vars: &BTreeMap<String, serde_json::Value>,
) -> Option<serde_json::Value> {
    let serde_json::Value::String(text) = value else {
        return None;
    };
    vars.iter().find_map(|(name, replacement)| {
        (text.as_str() == format!("{{{{{name}}}}}")).then(|| replacement.clone())
    })
}

/// Textual form of a value spliced into a larger string.
fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::rule::{Action, ActionKind, MatchOp, PayloadMatcher, RuleConditions};

    fn labeling_template() -> Template {
        let rule = Rule::builder("label {{team}} issues", "{{org}}")
            .conditions(RuleConditions {
                payload_matchers: vec![PayloadMatcher::new(
                    "$.issue.labels",
                    MatchOp::Contains,
                    json!("{{team}}"),
                )],
                ..RuleConditions::default()
            })
            .action(
                Action::new(ActionKind::AddLabel, "label")
                    .parameter("label", json!("team/{{team}}"))
                    .parameter("limit", json!("{{limit}}")),
            )
            .build()
            .unwrap();
        Template::new("team labeling", "hygiene", rule)
            .with_variable(TemplateVariable::new("org", VariableKind::String).required())
            .with_variable(TemplateVariable::new("team", VariableKind::String).required())
            .with_variable(
                TemplateVariable::new("limit", VariableKind::Number).default_value(json!(10)),
            )
    }

    #[test]
    fn should_substitute_variables_and_apply_defaults() {
        let template = labeling_template();
        let values = BTreeMap::from([
            ("org".to_string(), json!("acme")),
            ("team".to_string(), json!("platform")),
        ]);
        let rule = template.instantiate(&values).unwrap();
        assert_eq!(rule.name, "label platform issues");
        assert_eq!(rule.organization, "acme");
        let action = &rule.actions[0];
        assert_eq!(action.parameters.get("label"), Some(&json!("team/platform")));
        // Whole-placeholder strings take the variable's typed value.
        assert_eq!(action.parameters.get("limit"), Some(&json!(10)));
    }

    #[test]
    fn should_error_when_required_variable_is_missing() {
        let template = labeling_template();
        let values = BTreeMap::from([("org".to_string(), json!("acme"))]);
        let err = template.instantiate(&values).unwrap_err();
        assert!(
            err.to_string()
                .contains("required variable 'team' not provided")
        );
    }

    #[test]
    fn should_error_when_value_kind_mismatches() {
        let template = labeling_template();
        let values = BTreeMap::from([
            ("org".to_string(), json!("acme")),
            ("team".to_string(), json!(7)),
        ]);
        let err = template.instantiate(&values).unwrap_err();
        assert!(err.to_string().contains("expects a string value"));
    }

    #[test]
    fn should_assign_fresh_identity_to_instantiated_rule() {
        let template = labeling_template();
        let values = BTreeMap::from([
            ("org".to_string(), json!("acme")),
            ("team".to_string(), json!("platform")),
        ]);
        let rule = template.instantiate(&values).unwrap();
        assert_ne!(rule.id, template.rule.id);
        assert_eq!(rule.version, 1);
        assert!(rule.created_at >= template.created_at);
    }

    #[test]
    fn should_reject_duplicate_variable_names() {
        let template = labeling_template()
            .with_variable(TemplateVariable::new("team", VariableKind::String));
        let err = template.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate variable name 'team'"));
    }

    #[test]
    fn should_reject_default_value_of_wrong_kind() {
        let rule = labeling_template().rule;
        let template = Template::new("bad default", "hygiene", rule).with_variable(
            TemplateVariable::new("limit", VariableKind::Number).default_value(json!("ten")),
        );
        let err = template.validate().unwrap_err();
        assert!(err.to_string().contains("expects a number value"));
    }
}

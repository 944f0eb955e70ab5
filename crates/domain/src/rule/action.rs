//! Action — one side effect a rule performs when it matches.
//!
//! Actions carry an [`ActionKind`] plus free-form parameters; the actual
//! side effect lives behind the `ActionExecutor` port in the application
//! layer. The domain only knows ordering, enablement, and failure policy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::ActionId;

/// The action vocabulary supported by executors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Webhook,
    HttpRequest,
    CreateIssue,
    CloseIssue,
    AddLabel,
    RemoveLabel,
    AssignReviewer,
    MergePullRequest,
    CreateBranch,
    ProtectBranch,
    CreateRelease,
    SlackMessage,
    Email,
    TriggerWorkflow,
    RunScript,
    Custom,
}

impl ActionKind {
    /// Wire-format name of the action kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::HttpRequest => "http_request",
            Self::CreateIssue => "create_issue",
            Self::CloseIssue => "close_issue",
            Self::AddLabel => "add_label",
            Self::RemoveLabel => "remove_label",
            Self::AssignReviewer => "assign_reviewer",
            Self::MergePullRequest => "merge_pull_request",
            Self::CreateBranch => "create_branch",
            Self::ProtectBranch => "protect_branch",
            Self::CreateRelease => "create_release",
            Self::SlackMessage => "slack_message",
            Self::Email => "email",
            Self::TriggerWorkflow => "trigger_workflow",
            Self::RunScript => "run_script",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to the remaining actions when one fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and keep executing later actions.
    #[default]
    Continue,
    /// Abort the remaining actions; the execution is marked failed.
    Stop,
}

/// One configured side effect in a rule's ordered action list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub kind: ActionKind,
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

impl Action {
    /// Create an enabled action with empty parameters.
    #[must_use]
    pub fn new(kind: ActionKind, name: impl Into<String>) -> Self {
        Self {
            id: ActionId::new(),
            kind,
            name: name.into(),
            enabled: true,
            parameters: serde_json::Map::new(),
            on_failure: FailurePolicy::default(),
        }
    }

    /// Add one parameter.
    #[must_use]
    pub fn parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Toggle enablement.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the failure policy.
    #[must_use]
    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }
}

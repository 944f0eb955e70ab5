//! Action executor port — carries out rule actions.

use std::future::Future;

use rulehub_domain::context::ExecutionContext;
use rulehub_domain::error::RuleHubError;
use rulehub_domain::rule::{Action, ActionKind};

/// Structured output produced by executing one action.
pub type ActionOutput = serde_json::Map<String, serde_json::Value>;

/// Executes rule actions against the outside world (GitHub API calls,
/// webhooks, notifications).
pub trait ActionExecutor {
    /// Execute one action.
    fn execute_action(
        &self,
        action: &Action,
        context: &ExecutionContext,
    ) -> impl Future<Output = Result<ActionOutput, RuleHubError>> + Send;

    /// Check an action's kind and parameters without executing it.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Validation`] when the action cannot be
    /// executed as configured.
    fn validate_action(&self, action: &Action) -> Result<(), RuleHubError>;

    /// Action kinds this executor can carry out; empty means all.
    fn supported_actions(&self) -> Vec<ActionKind>;
}

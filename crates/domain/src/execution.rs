//! Execution — one tracked run of a rule's actions.
//!
//! Executions move `pending → running → {completed | failed | cancelled}`.
//! Terminal states are immutable; cancellation is only possible from
//! `pending` or `running`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{ActionId, EventId, ExecutionId, RuleId};
use crate::rule::ActionKind;
use crate::time::{self, Timestamp};

/// Lifecycle state of an [`Execution`] (and of each action outcome).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    /// Wire-format name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// True once the execution can no longer change state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What started an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Dispatched by the engine for a matching event.
    Event,
    /// Started by an operator.
    Manual,
    /// Started through the management API.
    Api,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Event => "event",
            Self::Manual => "manual",
            Self::Api => "api",
        };
        f.write_str(name)
    }
}

/// Result of one action within an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action_id: ActionId,
    pub kind: ActionKind,
    pub status: ExecutionStatus,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub output: serde_json::Map<String, serde_json::Value>,
    /// Set when the outcome was produced by a dry run instead of an
    /// executor.
    #[serde(default)]
    pub simulated: bool,
}

/// One tracked run of a rule's ordered action list.
///
/// The outcome list preserves rule order and never exceeds the rule's
/// action count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub rule_id: RuleId,
    pub trigger_event_id: Option<EventId>,
    pub trigger: TriggerKind,
    pub status: ExecutionStatus,
    pub actions: Vec<ActionOutcome>,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Execution {
    /// Create a pending execution for `rule_id`.
    #[must_use]
    pub fn pending(rule_id: RuleId, trigger: TriggerKind, trigger_event_id: Option<EventId>) -> Self {
        Self {
            id: ExecutionId::new(),
            rule_id,
            trigger_event_id,
            trigger,
            status: ExecutionStatus::Pending,
            actions: Vec::new(),
            started_at: time::now(),
            completed_at: None,
            error: None,
        }
    }

    /// Transition into `running`.
    pub fn mark_running(&mut self) {
        self.status = ExecutionStatus::Running;
        self.started_at = time::now();
    }

    /// Transition into the terminal `completed` state.
    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(time::now());
    }

    /// Transition into the terminal `failed` state.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(time::now());
    }

    /// Transition into the terminal `cancelled` state.
    pub fn cancel(&mut self) {
        self.status = ExecutionStatus::Cancelled;
        self.completed_at = Some(time::now());
    }

    /// Wall-clock duration, available once the execution is terminal.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|end| end - self.started_at)
    }
}

/// Storage-level filter for execution listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionFilter {
    pub rule_id: Option<RuleId>,
    pub status: Option<ExecutionStatus>,
    pub trigger: Option<TriggerKind>,
    pub started_after: Option<Timestamp>,
    pub started_before: Option<Timestamp>,
}

impl ExecutionFilter {
    /// Whether `execution` passes this filter.
    #[must_use]
    pub fn matches(&self, execution: &Execution) -> bool {
        if self.rule_id.is_some_and(|id| execution.rule_id != id) {
            return false;
        }
        if self.status.is_some_and(|status| execution.status != status) {
            return false;
        }
        if self.trigger.is_some_and(|trigger| execution.trigger != trigger) {
            return false;
        }
        if self
            .started_after
            .is_some_and(|after| execution.started_at < after)
        {
            return false;
        }
        !self
            .started_before
            .is_some_and(|before| execution.started_at >= before)
    }
}

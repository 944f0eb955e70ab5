//! Event — an immutable record of something that happened on GitHub.
//!
//! Events are produced by the webhook layer (an adapter behind the
//! `EventProcessor` port) and fan out through the automation engine to
//! every rule registered for the organization.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::EventId;
use crate::time::{self, Timestamp};

/// Ordered-key JSON object carried by an event.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// The webhook event vocabulary understood by the condition DSL.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Push,
    PullRequest,
    Issues,
    Repository,
    Release,
    Create,
    Delete,
    WorkflowRun,
    Deployment,
    Member,
    Team,
    Organization,
    Installation,
    InstallationRepositories,
}

impl EventKind {
    /// Wire-format name of the event kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::Issues => "issues",
            Self::Repository => "repository",
            Self::Release => "release",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::WorkflowRun => "workflow_run",
            Self::Deployment => "deployment",
            Self::Member => "member",
            Self::Team => "team",
            Self::Organization => "organization",
            Self::Installation => "installation",
            Self::InstallationRepositories => "installation_repositories",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The action qualifier carried by most webhook events.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Opened,
    Closed,
    Synchronize,
    Created,
    Deleted,
    Edited,
    Completed,
    Requested,
    Submitted,
    Published,
    Added,
    Removed,
}

impl EventAction {
    /// Wire-format name of the action.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
            Self::Synchronize => "synchronize",
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::Edited => "edited",
            Self::Completed => "completed",
            Self::Requested => "requested",
            Self::Submitted => "submitted",
            Self::Published => "published",
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable record of one GitHub happening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub kind: EventKind,
    pub action: Option<EventAction>,
    pub organization: String,
    pub repository: String,
    pub sender: String,
    pub timestamp: Timestamp,
    pub payload: Payload,
}

impl Event {
    /// Create a builder for constructing an [`Event`].
    #[must_use]
    pub fn builder(kind: EventKind, organization: impl Into<String>) -> EventBuilder {
        EventBuilder {
            id: None,
            kind,
            action: None,
            organization: organization.into(),
            repository: String::new(),
            sender: String::new(),
            timestamp: None,
            payload: Payload::new(),
        }
    }
}

/// Step-by-step builder for [`Event`].
#[derive(Debug)]
pub struct EventBuilder {
    id: Option<EventId>,
    kind: EventKind,
    action: Option<EventAction>,
    organization: String,
    repository: String,
    sender: String,
    timestamp: Option<Timestamp>,
    payload: Payload,
}

impl EventBuilder {
    #[must_use]
    pub fn id(mut self, id: EventId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn action(mut self, action: EventAction) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    #[must_use]
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    #[must_use]
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Replace the payload wholesale.
    #[must_use]
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Insert a single payload field.
    #[must_use]
    pub fn payload_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Consume the builder and return the [`Event`].
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: self.id.unwrap_or_default(),
            kind: self.kind,
            action: self.action,
            organization: self.organization,
            repository: self.repository,
            sender: self.sender,
            timestamp: self.timestamp.unwrap_or_else(time::now),
            payload: self.payload,
        }
    }
}

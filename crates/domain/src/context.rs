//! Evaluation and execution contexts — the surroundings a rule runs in.
//!
//! The evaluation context carries platform lookups (repository,
//! organization, user) that the repository condition category needs; the
//! execution context carries what action executors receive.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::rule::Visibility;

/// Repository attributes as reported by the hosting platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryInfo {
    pub name: String,
    pub full_name: String,
    pub default_branch: String,
    pub language: String,
    pub topics: Vec<String>,
    pub visibility: Visibility,
    pub archived: bool,
    pub template: bool,
    pub private: bool,
}

/// Organization attributes as reported by the hosting platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationInfo {
    pub login: String,
    pub plan: String,
    pub default_repository_permission: String,
    pub members_can_create_repos: bool,
}

/// User attributes as reported by the hosting platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub login: String,
    /// `"User"`, `"Bot"`, or `"Organization"`.
    pub kind: String,
    pub site_admin: bool,
}

/// Everything the condition evaluator may consult besides the event.
///
/// Transient — assembled per evaluation, never persisted. Absent lookups
/// leave their slot `None`; the matching category is then skipped with a
/// warning instead of failing.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    pub repository: Option<RepositoryInfo>,
    pub organization: Option<OrganizationInfo>,
    pub user: Option<UserInfo>,
    pub environment: String,
    pub variables: serde_json::Map<String, serde_json::Value>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Timezone for time conditions; UTC when unset.
    pub timezone: Option<FixedOffset>,
}

/// What an action executor receives alongside each action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionContext {
    pub event: Option<Event>,
    pub organization: String,
    pub user: String,
    pub environment: String,
    pub variables: serde_json::Map<String, serde_json::Value>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

//! Condition evaluation.
//!
//! A [`RuleConditions`] tree is evaluated category by category: event
//! identity, time of happening, repository attributes, payload content,
//! each payload matcher, and recursively each sub-condition. Each category
//! classifies as matched, failed, or skipped (nothing configured), and the
//! tree's [`LogicalOp`] folds the verdicts into one boolean. Evaluation
//! never aborts early: an error in one category is recorded and the rest
//! still evaluate.

mod payload;
mod validate;

use std::time::{Duration, Instant};

use chrono::{Datelike, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use payload::PayloadMatchOutcome;

use crate::context::{EvaluationContext, RepositoryInfo};
use crate::event::{Event, Payload};
use crate::rule::{LogicalOp, RuleConditions};
use crate::time::Timestamp;
use crate::validation::ValidationReport;

/// Outcome of evaluating one condition tree against one event.
///
/// Transient — assembled per evaluation, never persisted. Category names
/// are `event_conditions`, `time_conditions`, `repository_conditions`,
/// `content_conditions`, `payload_matcher_<i>`, and `sub_condition_<i>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub matched: bool,
    pub matched_conditions: Vec<String>,
    pub failed_conditions: Vec<String>,
    pub skipped_conditions: Vec<String>,
    pub duration: Duration,
    pub payload_results: Vec<PayloadMatchOutcome>,
    pub sub_results: Vec<EvaluationResult>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl EvaluationResult {
    /// An empty, non-matching result.
    #[must_use]
    pub fn unmatched() -> Self {
        Self::default()
    }

    /// How many categories produced a verdict (matched or failed).
    #[must_use]
    pub fn evaluated_count(&self) -> usize {
        self.matched_conditions.len() + self.failed_conditions.len()
    }
}

/// Evaluates condition trees against events. Pure and stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Evaluate `conditions` against `event` in `context`.
    ///
    /// Categories with nothing configured are skipped; repository
    /// conditions with no repository info in the context are skipped with
    /// a warning. Regex compile failures at evaluation time are recorded
    /// as errors and leave their category without a verdict.
    #[must_use]
    pub fn evaluate(
        &self,
        conditions: &RuleConditions,
        event: &Event,
        context: &EvaluationContext,
    ) -> EvaluationResult {
        let started = Instant::now();
        let mut result = EvaluationResult::unmatched();

        if conditions.has_event_conditions() {
            note(&mut result, "event_conditions", event_verdict(conditions, event));
        } else {
            result.skipped_conditions.push("event_conditions".to_string());
        }

        if conditions.has_time_conditions() {
            note(
                &mut result,
                "time_conditions",
                time_verdict(conditions, event.timestamp, context),
            );
        } else {
            result.skipped_conditions.push("time_conditions".to_string());
        }

        if conditions.has_repository_conditions() {
            if let Some(repository) = &context.repository {
                if let Some(matched) =
                    repository_verdict(conditions, repository, &mut result.errors)
                {
                    note(&mut result, "repository_conditions", matched);
                }
            } else {
                result
                    .skipped_conditions
                    .push("repository_conditions".to_string());
                result.warnings.push(
                    "repository conditions configured but no repository info in context"
                        .to_string(),
                );
            }
        } else {
            result
                .skipped_conditions
                .push("repository_conditions".to_string());
        }

        if conditions.has_content_conditions() {
            if let Some(matched) = content_verdict(conditions, &event.payload, &mut result.errors)
            {
                note(&mut result, "content_conditions", matched);
            }
        } else {
            result
                .skipped_conditions
                .push("content_conditions".to_string());
        }

        for (index, matcher) in conditions.payload_matchers.iter().enumerate() {
            let outcome = payload::evaluate_matcher(matcher, &event.payload);
            let name = format!("payload_matcher_{index}");
            if let Some(error) = &outcome.error {
                result.errors.push(format!("{name}: {error}"));
            } else {
                note(&mut result, &name, outcome.matched);
            }
            result.payload_results.push(outcome);
        }

        for (index, sub) in conditions.sub_conditions.iter().enumerate() {
            let sub_result = self.evaluate(sub, event, context);
            let name = format!("sub_condition_{index}");
            if sub_result.evaluated_count() == 0 {
                result.skipped_conditions.push(name);
            } else {
                note(&mut result, &name, sub_result.matched);
            }
            result.sub_results.push(sub_result);
        }

        result.matched = match conditions.operator {
            LogicalOp::And => {
                result.evaluated_count() > 0 && result.failed_conditions.is_empty()
            }
            LogicalOp::Or => !result.matched_conditions.is_empty(),
            LogicalOp::Not => result.matched_conditions.is_empty(),
        };
        result.duration = started.elapsed();
        result
    }

    /// Validate a condition tree without an event.
    #[must_use]
    pub fn validate(&self, conditions: &RuleConditions) -> ValidationReport {
        validate::validate_conditions(conditions)
    }
}

fn note(result: &mut EvaluationResult, name: &str, matched: bool) {
    if matched {
        result.matched_conditions.push(name.to_string());
    } else {
        result.failed_conditions.push(name.to_string());
    }
}

fn event_verdict(conditions: &RuleConditions, event: &Event) -> bool {
    if !conditions.event_kinds.is_empty() && !conditions.event_kinds.contains(&event.kind) {
        return false;
    }
    if !conditions.event_actions.is_empty()
        && !event
            .action
            .is_some_and(|action| conditions.event_actions.contains(&action))
    {
        return false;
    }
    if let Some(organization) = &conditions.organization {
        if !organization.eq_ignore_ascii_case(&event.organization) {
            return false;
        }
    }
    if let Some(repository) = &conditions.repository {
        if !repository.eq_ignore_ascii_case(&event.repository) {
            return false;
        }
    }
    if let Some(sender) = &conditions.sender {
        if !sender.eq_ignore_ascii_case(&event.sender) {
            return false;
        }
    }
    true
}

fn time_verdict(
    conditions: &RuleConditions,
    timestamp: Timestamp,
    context: &EvaluationContext,
) -> bool {
    if let Some(range) = conditions.time_range {
        if !range.contains(timestamp) {
            return false;
        }
    }
    // Wall-clock checks use the context timezone, UTC when unset.
    let local = match context.timezone {
        Some(timezone) => timestamp.with_timezone(&timezone).naive_local(),
        None => timestamp.naive_utc(),
    };
    if !conditions.days_of_week.is_empty() {
        let day = local.weekday().num_days_from_sunday();
        if !conditions.days_of_week.iter().any(|d| u32::from(*d) == day) {
            return false;
        }
    }
    if !conditions.hours_of_day.is_empty() {
        let hour = local.hour();
        if !conditions.hours_of_day.iter().any(|h| u32::from(*h) == hour) {
            return false;
        }
    }
    if conditions.business_hours {
        let on_weekend = matches!(local.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun);
        if on_weekend || !(9..17).contains(&local.hour()) {
            return false;
        }
    }
    true
}

fn repository_verdict(
    conditions: &RuleConditions,
    repository: &RepositoryInfo,
    errors: &mut Vec<String>,
) -> Option<bool> {
    let mut verdict = true;
    if !conditions.repository_patterns.is_empty() {
        let patterns =
            compile_patterns("repository_conditions", &conditions.repository_patterns, errors)?;
        verdict &= patterns.iter().any(|pattern| pattern.is_match(&repository.name));
    }
    if !conditions.languages.is_empty() {
        verdict &= conditions
            .languages
            .iter()
            .any(|language| language.eq_ignore_ascii_case(&repository.language));
    }
    if !conditions.topics.is_empty() {
        verdict &= conditions.topics.iter().any(|topic| {
            repository
                .topics
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(topic))
        });
    }
    if !conditions.visibility.is_empty() {
        verdict &= conditions.visibility.contains(&repository.visibility);
    }
    if let Some(archived) = conditions.archived {
        verdict &= repository.archived == archived;
    }
    if let Some(template) = conditions.template {
        verdict &= repository.template == template;
    }
    Some(verdict)
}

fn content_verdict(
    conditions: &RuleConditions,
    payload: &Payload,
    errors: &mut Vec<String>,
) -> Option<bool> {
    let mut verdict = true;
    if !conditions.branch_patterns.is_empty() {
        // Branch patterns only apply when the payload names a branch.
        if let Some(branch) = branch_from_payload(payload) {
            let patterns =
                compile_patterns("content_conditions", &conditions.branch_patterns, errors)?;
            verdict &= patterns.iter().any(|pattern| pattern.is_match(&branch));
        }
    }
    if !conditions.file_patterns.is_empty() || !conditions.path_patterns.is_empty() {
        let files = files_from_payload(payload);
        if !conditions.file_patterns.is_empty() {
            let patterns =
                compile_patterns("content_conditions", &conditions.file_patterns, errors)?;
            verdict &= files
                .iter()
                .any(|file| patterns.iter().any(|pattern| pattern.is_match(file)));
        }
        if !conditions.path_patterns.is_empty() {
            let patterns =
                compile_patterns("content_conditions", &conditions.path_patterns, errors)?;
            let paths = parent_dirs(&files);
            verdict &= paths
                .iter()
                .any(|path| patterns.iter().any(|pattern| pattern.is_match(path)));
        }
    }
    Some(verdict)
}

fn compile_patterns(
    category: &str,
    patterns: &[String],
    errors: &mut Vec<String>,
) -> Option<Vec<Regex>> {
    let mut compiled = Vec::with_capacity(patterns.len());
    let mut failed = false;
    for pattern in patterns {
        match Regex::new(pattern) {
            Ok(regex) => compiled.push(regex),
            Err(err) => {
                errors.push(format!("{category}: invalid regex '{pattern}': {err}"));
                failed = true;
            }
        }
    }
    (!failed).then_some(compiled)
}

/// Branch named by the payload: `ref` stripped of `refs/heads/`, else
/// `pull_request.head.ref`.
fn branch_from_payload(payload: &Payload) -> Option<String> {
    if let Some(serde_json::Value::String(reference)) = payload.get("ref") {
        let branch = reference.strip_prefix("refs/heads/").unwrap_or(reference);
        return Some(branch.to_string());
    }
    match payload::resolve(payload, "$.pull_request.head.ref") {
        Some(serde_json::Value::String(branch)) => Some(branch.clone()),
        _ => None,
    }
}

/// Changed files named by the payload: `commits[].added`/`modified` plus
/// `pull_request.files[].filename`, deduplicated.
fn files_from_payload(payload: &Payload) -> Vec<String> {
    let mut files = Vec::new();
    if let Some(serde_json::Value::Array(commits)) = payload.get("commits") {
        for commit in commits {
            for key in ["added", "modified"] {
                if let Some(serde_json::Value::Array(entries)) = commit.get(key) {
                    files.extend(
                        entries
                            .iter()
                            .filter_map(|entry| entry.as_str())
                            .map(str::to_string),
                    );
                }
            }
        }
    }
    if let Some(serde_json::Value::Array(entries)) = payload::resolve(payload, "$.pull_request.files")
    {
        files.extend(
            entries
                .iter()
                .filter_map(|entry| entry.get("filename").and_then(serde_json::Value::as_str))
                .map(str::to_string),
        );
    }
    files.sort();
    files.dedup();
    files
}

/// Parent directories of the changed files; top-level files map to `.`.
fn parent_dirs(files: &[String]) -> Vec<String> {
    let mut dirs: Vec<String> = files
        .iter()
        .filter_map(|file| std::path::Path::new(file).parent())
        .map(|parent| {
            let dir = parent.to_string_lossy();
            if dir.is_empty() {
                ".".to_string()
            } else {
                dir.into_owned()
            }
        })
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use crate::event::{EventAction, EventKind};
    use crate::rule::{MatchOp, PayloadMatcher, TimeRange, Visibility};

    use super::*;

    fn push_event() -> Event {
        Event::builder(EventKind::Push, "acme")
            .repository("api-gateway")
            .sender("octocat")
            .payload_field("ref", json!("refs/heads/main"))
            .payload_field(
                "commits",
                json!([{ "added": ["src/lib.rs"], "modified": ["Cargo.toml"] }]),
            )
            .build()
    }

    fn evaluator() -> ConditionEvaluator {
        ConditionEvaluator::new()
    }

    #[test]
    fn should_not_match_empty_tree_under_and() {
        let result = evaluator().evaluate(
            &RuleConditions::default(),
            &push_event(),
            &EvaluationContext::default(),
        );
        assert!(!result.matched);
        assert_eq!(result.evaluated_count(), 0);
        assert_eq!(
            result.skipped_conditions,
            vec![
                "event_conditions",
                "time_conditions",
                "repository_conditions",
                "content_conditions"
            ]
        );
    }

    #[test]
    fn should_match_event_category_case_insensitively() {
        let conditions = RuleConditions {
            event_kinds: vec![EventKind::Push],
            organization: Some("ACME".to_string()),
            sender: Some("Octocat".to_string()),
            ..RuleConditions::default()
        };
        let result =
            evaluator().evaluate(&conditions, &push_event(), &EvaluationContext::default());
        assert!(result.matched);
        assert_eq!(result.matched_conditions, vec!["event_conditions"]);
    }

    #[test]
    fn should_fail_event_category_on_kind_or_action_mismatch() {
        let conditions = RuleConditions {
            event_kinds: vec![EventKind::PullRequest],
            ..RuleConditions::default()
        };
        let result =
            evaluator().evaluate(&conditions, &push_event(), &EvaluationContext::default());
        assert!(!result.matched);
        assert_eq!(result.failed_conditions, vec!["event_conditions"]);

        // Configured actions never match an event without one.
        let conditions = RuleConditions {
            event_actions: vec![EventAction::Opened],
            ..RuleConditions::default()
        };
        let result =
            evaluator().evaluate(&conditions, &push_event(), &EvaluationContext::default());
        assert!(!result.matched);
    }

    #[test]
    fn should_fold_or_when_any_category_matches() {
        let conditions = RuleConditions {
            event_kinds: vec![EventKind::PullRequest],
            payload_matchers: vec![PayloadMatcher::new(
                "$.ref",
                MatchOp::Contains,
                json!("main"),
            )],
            operator: LogicalOp::Or,
            ..RuleConditions::default()
        };
        let result =
            evaluator().evaluate(&conditions, &push_event(), &EvaluationContext::default());
        assert!(result.matched);
        assert_eq!(result.failed_conditions, vec!["event_conditions"]);
        assert_eq!(result.matched_conditions, vec!["payload_matcher_0"]);
    }

    #[test]
    fn should_treat_not_as_nothing_matched() {
        let conditions = RuleConditions {
            event_kinds: vec![EventKind::PullRequest],
            operator: LogicalOp::Not,
            ..RuleConditions::default()
        };
        let result =
            evaluator().evaluate(&conditions, &push_event(), &EvaluationContext::default());
        // The event category failed, nothing matched: NOT holds.
        assert!(result.matched);

        let conditions = RuleConditions {
            event_kinds: vec![EventKind::Push],
            operator: LogicalOp::Not,
            ..RuleConditions::default()
        };
        let result =
            evaluator().evaluate(&conditions, &push_event(), &EvaluationContext::default());
        assert!(!result.matched);
    }

    #[test]
    fn should_match_business_hours_on_weekdays_only() {
        // 2024-03-05 is a Tuesday, 2024-03-03 a Sunday.
        let conditions = RuleConditions {
            business_hours: true,
            ..RuleConditions::default()
        };
        let tuesday = Event::builder(EventKind::Push, "acme")
            .timestamp(chrono::Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap())
            .build();
        let sunday = Event::builder(EventKind::Push, "acme")
            .timestamp(chrono::Utc.with_ymd_and_hms(2024, 3, 3, 10, 0, 0).unwrap())
            .build();
        let early = Event::builder(EventKind::Push, "acme")
            .timestamp(chrono::Utc.with_ymd_and_hms(2024, 3, 5, 8, 59, 0).unwrap())
            .build();
        let context = EvaluationContext::default();
        assert!(evaluator().evaluate(&conditions, &tuesday, &context).matched);
        assert!(!evaluator().evaluate(&conditions, &sunday, &context).matched);
        assert!(!evaluator().evaluate(&conditions, &early, &context).matched);
    }

    #[test]
    fn should_apply_context_timezone_to_wall_clock_checks() {
        let conditions = RuleConditions {
            business_hours: true,
            ..RuleConditions::default()
        };
        // 05:30 UTC is outside business hours; 10:30 at UTC+5 is inside.
        let event = Event::builder(EventKind::Push, "acme")
            .timestamp(chrono::Utc.with_ymd_and_hms(2024, 3, 5, 5, 30, 0).unwrap())
            .build();
        let utc = EvaluationContext::default();
        assert!(!evaluator().evaluate(&conditions, &event, &utc).matched);
        let shifted = EvaluationContext {
            timezone: chrono::FixedOffset::east_opt(5 * 3600),
            ..EvaluationContext::default()
        };
        assert!(evaluator().evaluate(&conditions, &event, &shifted).matched);
    }

    #[test]
    fn should_check_days_hours_and_absolute_range() {
        let start = chrono::Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let end = chrono::Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap();
        let conditions = RuleConditions {
            time_range: Some(TimeRange { start, end }),
            days_of_week: vec![2],
            hours_of_day: vec![10],
            ..RuleConditions::default()
        };
        let inside = Event::builder(EventKind::Push, "acme")
            .timestamp(chrono::Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap())
            .build();
        let wrong_hour = Event::builder(EventKind::Push, "acme")
            .timestamp(chrono::Utc.with_ymd_and_hms(2024, 3, 5, 11, 30, 0).unwrap())
            .build();
        let context = EvaluationContext::default();
        assert!(evaluator().evaluate(&conditions, &inside, &context).matched);
        assert!(!evaluator().evaluate(&conditions, &wrong_hour, &context).matched);
    }

    #[test]
    fn should_match_repository_attributes_from_context() {
        let conditions = RuleConditions {
            repository_patterns: vec!["^api-".to_string()],
            languages: vec!["rust".to_string()],
            topics: vec!["INFRA".to_string()],
            visibility: vec![Visibility::Public],
            archived: Some(false),
            ..RuleConditions::default()
        };
        let context = EvaluationContext {
            repository: Some(RepositoryInfo {
                name: "api-gateway".to_string(),
                language: "Rust".to_string(),
                topics: vec!["infra".to_string(), "gateway".to_string()],
                visibility: Visibility::Public,
                ..RepositoryInfo::default()
            }),
            ..EvaluationContext::default()
        };
        let result = evaluator().evaluate(&conditions, &push_event(), &context);
        assert!(result.matched);
        assert_eq!(result.matched_conditions, vec!["repository_conditions"]);
    }

    #[test]
    fn should_skip_repository_category_without_repository_info() {
        let conditions = RuleConditions {
            repository_patterns: vec!["^api-".to_string()],
            event_kinds: vec![EventKind::Push],
            ..RuleConditions::default()
        };
        let result =
            evaluator().evaluate(&conditions, &push_event(), &EvaluationContext::default());
        // The skip leaves AND to the remaining categories.
        assert!(result.matched);
        assert!(result
            .skipped_conditions
            .contains(&"repository_conditions".to_string()));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn should_record_bad_runtime_regex_as_error_without_verdict() {
        let conditions = RuleConditions {
            repository_patterns: vec!["[unclosed".to_string()],
            event_kinds: vec![EventKind::Push],
            ..RuleConditions::default()
        };
        let context = EvaluationContext {
            repository: Some(RepositoryInfo::default()),
            ..EvaluationContext::default()
        };
        let result = evaluator().evaluate(&conditions, &push_event(), &context);
        assert_eq!(result.errors.len(), 1);
        assert!(!result.matched_conditions.contains(&"repository_conditions".to_string()));
        assert!(!result.failed_conditions.contains(&"repository_conditions".to_string()));
        // The erroring category does not fail the fold.
        assert!(result.matched);
    }

    #[test]
    fn should_match_branch_file_and_path_patterns() {
        let conditions = RuleConditions {
            branch_patterns: vec!["^main$".to_string()],
            file_patterns: vec![r"\.rs$".to_string()],
            path_patterns: vec!["^src$".to_string()],
            ..RuleConditions::default()
        };
        let result =
            evaluator().evaluate(&conditions, &push_event(), &EvaluationContext::default());
        assert!(result.matched);
        assert_eq!(result.matched_conditions, vec!["content_conditions"]);
    }

    #[test]
    fn should_fail_file_patterns_when_payload_carries_no_files() {
        let conditions = RuleConditions {
            file_patterns: vec![r"\.rs$".to_string()],
            ..RuleConditions::default()
        };
        let event = Event::builder(EventKind::Issues, "acme").build();
        let result = evaluator().evaluate(&conditions, &event, &EvaluationContext::default());
        assert!(!result.matched);
        assert_eq!(result.failed_conditions, vec!["content_conditions"]);
    }

    #[test]
    fn should_ignore_branch_patterns_when_payload_names_no_branch() {
        let conditions = RuleConditions {
            branch_patterns: vec!["^main$".to_string()],
            event_kinds: vec![EventKind::Issues],
            ..RuleConditions::default()
        };
        let event = Event::builder(EventKind::Issues, "acme").build();
        let result = evaluator().evaluate(&conditions, &event, &EvaluationContext::default());
        assert!(result.matched);
        assert_eq!(
            result.matched_conditions,
            vec!["event_conditions", "content_conditions"]
        );
    }

    #[test]
    fn should_extract_branch_from_push_and_pull_request_payloads() {
        let push = push_event();
        assert_eq!(branch_from_payload(&push.payload).as_deref(), Some("main"));
        let pull = Event::builder(EventKind::PullRequest, "acme")
            .payload_field("pull_request", json!({ "head": { "ref": "feature/login" } }))
            .build();
        assert_eq!(
            branch_from_payload(&pull.payload).as_deref(),
            Some("feature/login")
        );
        let bare = Event::builder(EventKind::Issues, "acme").build();
        assert_eq!(branch_from_payload(&bare.payload), None);
    }

    #[test]
    fn should_collect_files_and_parent_dirs_from_payload() {
        let event = Event::builder(EventKind::PullRequest, "acme")
            .payload_field(
                "pull_request",
                json!({ "files": [{ "filename": "docs/guide/intro.md" }, { "filename": "README.md" }] }),
            )
            .build();
        let files = files_from_payload(&event.payload);
        assert_eq!(files, vec!["README.md", "docs/guide/intro.md"]);
        assert_eq!(parent_dirs(&files), vec![".", "docs/guide"]);
    }

    #[test]
    fn should_evaluate_sub_conditions_recursively() {
        let conditions = RuleConditions {
            operator: LogicalOp::Or,
            sub_conditions: vec![
                RuleConditions {
                    event_kinds: vec![EventKind::PullRequest],
                    ..RuleConditions::default()
                },
                RuleConditions {
                    payload_matchers: vec![PayloadMatcher::new(
                        "$.ref",
                        MatchOp::EndsWith,
                        json!("main"),
                    )],
                    ..RuleConditions::default()
                },
            ],
            ..RuleConditions::default()
        };
        let result =
            evaluator().evaluate(&conditions, &push_event(), &EvaluationContext::default());
        assert!(result.matched);
        assert_eq!(result.sub_results.len(), 2);
        assert_eq!(result.failed_conditions, vec!["sub_condition_0"]);
        assert_eq!(result.matched_conditions, vec!["sub_condition_1"]);
    }

    #[test]
    fn should_skip_sub_condition_with_nothing_configured() {
        let conditions = RuleConditions {
            sub_conditions: vec![RuleConditions::default()],
            ..RuleConditions::default()
        };
        let result =
            evaluator().evaluate(&conditions, &push_event(), &EvaluationContext::default());
        assert!(result
            .skipped_conditions
            .contains(&"sub_condition_0".to_string()));
        assert!(!result.matched);
    }

    #[test]
    fn should_record_matcher_outcomes_in_order() {
        let conditions = RuleConditions {
            payload_matchers: vec![
                PayloadMatcher::new("$.ref", MatchOp::Exists, json!(null)),
                PayloadMatcher::new("$.missing", MatchOp::Equals, json!("x")),
            ],
            ..RuleConditions::default()
        };
        let result =
            evaluator().evaluate(&conditions, &push_event(), &EvaluationContext::default());
        assert_eq!(result.payload_results.len(), 2);
        assert!(result.payload_results[0].matched);
        assert!(result.payload_results[1].error.is_some());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("payload_matcher_1:"));
    }

    #[test]
    fn should_return_the_same_verdict_on_repeated_evaluation() {
        let conditions = RuleConditions {
            event_kinds: vec![EventKind::Push],
            branch_patterns: vec!["^main$".to_string()],
            payload_matchers: vec![PayloadMatcher::new(
                "$.ref",
                MatchOp::EndsWith,
                json!("main"),
            )],
            ..RuleConditions::default()
        };
        let event = push_event();
        let context = EvaluationContext::default();

        let first = evaluator().evaluate(&conditions, &event, &context);
        let second = evaluator().evaluate(&conditions, &event, &context);
        assert!(first.matched);
        assert_eq!(first.matched, second.matched);
        assert_eq!(first.matched_conditions, second.matched_conditions);
        assert_eq!(first.failed_conditions, second.failed_conditions);
        assert_eq!(first.skipped_conditions, second.skipped_conditions);
        assert_eq!(first.payload_results, second.payload_results);
    }
}

//! Payload path resolution and matcher evaluation.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::event::Payload;
use crate::rule::{MatchOp, PayloadMatcher};

/// Outcome of one payload matcher against one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadMatchOutcome {
    pub path: String,
    pub op: MatchOp,
    pub expected: serde_json::Value,
    pub actual: Option<serde_json::Value>,
    pub matched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Walk a `$.a.b.c`-style path into the payload.
///
/// Numeric segments index arrays. Returns `None` when any segment is
/// absent or the path descends into a scalar.
pub(crate) fn resolve<'a>(payload: &'a Payload, path: &str) -> Option<&'a serde_json::Value> {
    let trimmed = path
        .strip_prefix("$.")
        .or_else(|| path.strip_prefix("@."))
        .or_else(|| path.strip_prefix('$'))
        .or_else(|| path.strip_prefix('@'))
        .unwrap_or(path);
    let mut segments = trimmed.split('.').filter(|segment| !segment.is_empty());
    let mut current = payload.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            serde_json::Value::Object(map) => map.get(segment)?,
            serde_json::Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Evaluate one matcher against the payload.
///
/// A missing path matches `not_exists`, fails `exists`, and is an error
/// for every other operator. A JSON `null` at the path counts as absent
/// for `exists`/`not_exists` and empty for `empty`/`not_empty`.
pub(crate) fn evaluate_matcher(matcher: &PayloadMatcher, payload: &Payload) -> PayloadMatchOutcome {
    let actual = resolve(payload, &matcher.path);
    let mut outcome = PayloadMatchOutcome {
        path: matcher.path.clone(),
        op: matcher.op,
        expected: matcher.value.clone(),
        actual: actual.cloned(),
        matched: false,
        error: None,
    };
    let Some(actual) = actual else {
        match matcher.op {
            MatchOp::NotExists => outcome.matched = true,
            MatchOp::Exists => {}
            _ => {
                outcome.error = Some(format!("path '{}' not found in payload", matcher.path));
            }
        }
        return outcome;
    };

    match matcher.op {
        MatchOp::Exists => outcome.matched = !actual.is_null(),
        MatchOp::NotExists => outcome.matched = actual.is_null(),
        MatchOp::Empty => outcome.matched = is_empty(actual),
        MatchOp::NotEmpty => outcome.matched = !is_empty(actual),
        MatchOp::Equals => {
            let (actual, expected) = comparison_texts(matcher, actual);
            outcome.matched = actual == expected;
        }
        MatchOp::NotEquals => {
            let (actual, expected) = comparison_texts(matcher, actual);
            outcome.matched = actual != expected;
        }
        MatchOp::Contains => {
            let (actual, expected) = comparison_texts(matcher, actual);
            outcome.matched = actual.contains(&expected);
        }
        MatchOp::NotContains => {
            let (actual, expected) = comparison_texts(matcher, actual);
            outcome.matched = !actual.contains(&expected);
        }
        MatchOp::StartsWith => {
            let (actual, expected) = comparison_texts(matcher, actual);
            outcome.matched = actual.starts_with(&expected);
        }
        MatchOp::EndsWith => {
            let (actual, expected) = comparison_texts(matcher, actual);
            outcome.matched = actual.ends_with(&expected);
        }
        MatchOp::Regex => match compile_pattern(matcher) {
            Ok(pattern) => outcome.matched = pattern.is_match(&value_text(actual)),
            Err(err) => outcome.error = Some(format!("invalid regex: {err}")),
        },
        MatchOp::GreaterThan => compare_numeric(matcher, actual, &mut outcome, |a, e| a > e),
        MatchOp::LessThan => compare_numeric(matcher, actual, &mut outcome, |a, e| a < e),
    }
    outcome
}

/// Textual form used by the string operators: raw for strings, JSON text
/// otherwise.
pub(crate) fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn comparison_texts(matcher: &PayloadMatcher, actual: &serde_json::Value) -> (String, String) {
    let actual = value_text(actual);
    let expected = value_text(&matcher.value);
    if matcher.case_sensitive {
        (actual, expected)
    } else {
        (actual.to_lowercase(), expected.to_lowercase())
    }
}

fn compile_pattern(matcher: &PayloadMatcher) -> Result<Regex, regex::Error> {
    let pattern = value_text(&matcher.value);
    if matcher.case_sensitive {
        Regex::new(&pattern)
    } else {
        Regex::new(&format!("(?i){pattern}"))
    }
}

fn compare_numeric(
    matcher: &PayloadMatcher,
    actual: &serde_json::Value,
    outcome: &mut PayloadMatchOutcome,
    compare: impl Fn(f64, f64) -> bool,
) {
    match (numeric_value(actual), numeric_value(&matcher.value)) {
        (Some(actual), Some(expected)) => outcome.matched = compare(actual, expected),
        (None, _) => {
            outcome.error = Some(format!("cannot convert '{}' to a number", value_text(actual)));
        }
        (_, None) => {
            outcome.error = Some(format!(
                "cannot convert '{}' to a number",
                value_text(&matcher.value)
            ));
        }
    }
}

/// Numbers and numeric strings coerce; everything else does not.
fn numeric_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn is_empty(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(text) => text.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Bool(_) | serde_json::Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(value: serde_json::Value) -> Payload {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("payload must be an object, got {other}"),
        }
    }

    #[test]
    fn should_resolve_nested_paths_and_array_indexes() {
        let payload = payload(json!({
            "pull_request": {
                "head": { "ref": "feature/login" },
                "labels": [{ "name": "bug" }, { "name": "urgent" }]
            }
        }));
        assert_eq!(
            resolve(&payload, "$.pull_request.head.ref"),
            Some(&json!("feature/login"))
        );
        assert_eq!(
            resolve(&payload, "$.pull_request.labels.1.name"),
            Some(&json!("urgent"))
        );
        assert_eq!(resolve(&payload, "$.pull_request.base.ref"), None);
        assert_eq!(resolve(&payload, "$.pull_request.labels.7"), None);
        assert_eq!(resolve(&payload, "$.pull_request.head.ref.deeper"), None);
    }

    #[test]
    fn should_accept_at_rooted_paths() {
        let payload = payload(json!({ "action": "opened" }));
        assert_eq!(resolve(&payload, "@.action"), Some(&json!("opened")));
    }

    #[test]
    fn should_fold_case_unless_sensitive() {
        let payload = payload(json!({ "action": "Opened" }));
        let insensitive = PayloadMatcher::new("$.action", MatchOp::Equals, json!("opened"));
        assert!(evaluate_matcher(&insensitive, &payload).matched);
        let sensitive = insensitive.clone().case_sensitive(true);
        assert!(!evaluate_matcher(&sensitive, &payload).matched);
    }

    #[test]
    fn should_compare_numbers_including_numeric_strings() {
        let payload = payload(json!({ "number": 123, "additions": "250" }));
        let matcher = PayloadMatcher::new("$.number", MatchOp::GreaterThan, json!(100));
        assert!(evaluate_matcher(&matcher, &payload).matched);
        let matcher = PayloadMatcher::new("$.additions", MatchOp::LessThan, json!(300));
        assert!(evaluate_matcher(&matcher, &payload).matched);
        let matcher = PayloadMatcher::new("$.number", MatchOp::LessThan, json!(100));
        assert!(!evaluate_matcher(&matcher, &payload).matched);
    }

    #[test]
    fn should_error_on_non_numeric_comparison() {
        let payload = payload(json!({ "title": "not a number" }));
        let matcher = PayloadMatcher::new("$.title", MatchOp::GreaterThan, json!(10));
        let outcome = evaluate_matcher(&matcher, &payload);
        assert!(!outcome.matched);
        assert_eq!(
            outcome.error.as_deref(),
            Some("cannot convert 'not a number' to a number")
        );
    }

    #[test]
    fn should_treat_missing_path_per_operator() {
        let payload = payload(json!({ "action": "opened" }));
        let exists = PayloadMatcher::new("$.label", MatchOp::Exists, json!(null));
        let outcome = evaluate_matcher(&exists, &payload);
        assert!(!outcome.matched);
        assert!(outcome.error.is_none());

        let not_exists = PayloadMatcher::new("$.label", MatchOp::NotExists, json!(null));
        assert!(evaluate_matcher(&not_exists, &payload).matched);

        let equals = PayloadMatcher::new("$.label", MatchOp::Equals, json!("bug"));
        let outcome = evaluate_matcher(&equals, &payload);
        assert!(!outcome.matched);
        assert_eq!(
            outcome.error.as_deref(),
            Some("path '$.label' not found in payload")
        );
    }

    #[test]
    fn should_treat_null_as_absent_and_empty() {
        let payload = payload(json!({ "assignee": null }));
        let exists = PayloadMatcher::new("$.assignee", MatchOp::Exists, json!(null));
        assert!(!evaluate_matcher(&exists, &payload).matched);
        let not_exists = PayloadMatcher::new("$.assignee", MatchOp::NotExists, json!(null));
        assert!(evaluate_matcher(&not_exists, &payload).matched);
        let empty = PayloadMatcher::new("$.assignee", MatchOp::Empty, json!(null));
        assert!(evaluate_matcher(&empty, &payload).matched);
    }

    #[test]
    fn should_detect_empty_strings_arrays_and_objects() {
        let payload = payload(json!({ "a": "", "b": [], "c": {}, "d": "x", "e": 0 }));
        for path in ["$.a", "$.b", "$.c"] {
            let matcher = PayloadMatcher::new(path, MatchOp::Empty, json!(null));
            assert!(evaluate_matcher(&matcher, &payload).matched, "{path}");
        }
        for path in ["$.d", "$.e"] {
            let matcher = PayloadMatcher::new(path, MatchOp::NotEmpty, json!(null));
            assert!(evaluate_matcher(&matcher, &payload).matched, "{path}");
        }
    }

    #[test]
    fn should_match_regex_case_insensitively_by_default() {
        let payload = payload(json!({ "title": "WIP: refactor login" }));
        let matcher = PayloadMatcher::new("$.title", MatchOp::Regex, json!("^wip:"));
        assert!(evaluate_matcher(&matcher, &payload).matched);
        let sensitive = matcher.clone().case_sensitive(true);
        assert!(!evaluate_matcher(&sensitive, &payload).matched);
    }

    #[test]
    fn should_report_invalid_regex_as_matcher_error() {
        let payload = payload(json!({ "title": "anything" }));
        let matcher = PayloadMatcher::new("$.title", MatchOp::Regex, json!("[unclosed"));
        let outcome = evaluate_matcher(&matcher, &payload);
        assert!(!outcome.matched);
        assert!(outcome.error.as_deref().is_some_and(|e| e.starts_with("invalid regex:")));
    }

    #[test]
    fn should_apply_string_operators_to_composite_values() {
        let payload = payload(json!({ "labels": ["bug", "Platform"] }));
        let matcher = PayloadMatcher::new("$.labels", MatchOp::Contains, json!("platform"));
        assert!(evaluate_matcher(&matcher, &payload).matched);
        let matcher = PayloadMatcher::new("$.labels", MatchOp::NotContains, json!("docs"));
        assert!(evaluate_matcher(&matcher, &payload).matched);
    }
}

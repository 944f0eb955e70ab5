//! Structural validation of a condition tree, without any event.

use regex::Regex;

use crate::rule::{MatchOp, RuleConditions};
use crate::validation::ValidationReport;

use super::payload::value_text;

/// Check everything about a condition tree that can fail before any event
/// arrives: regex compilation, matcher path roots, time bounds.
pub(crate) fn validate_conditions(conditions: &RuleConditions) -> ValidationReport {
    let mut report = ValidationReport::valid();

    check_patterns(&mut report, "repository_patterns", &conditions.repository_patterns);
    check_patterns(&mut report, "branch_patterns", &conditions.branch_patterns);
    check_patterns(&mut report, "file_patterns", &conditions.file_patterns);
    check_patterns(&mut report, "path_patterns", &conditions.path_patterns);

    for (index, matcher) in conditions.payload_matchers.iter().enumerate() {
        if !matcher.path.starts_with('$') && !matcher.path.starts_with('@') {
            report.error(
                format!("payload_matchers[{index}].path"),
                "must start with '$' or '@'",
            );
        }
        match matcher.op {
            MatchOp::Regex => {
                if let Err(err) = Regex::new(&value_text(&matcher.value)) {
                    report.error(
                        format!("payload_matchers[{index}].value"),
                        format!("invalid regex: {err}"),
                    );
                }
            }
            MatchOp::Equals | MatchOp::NotEquals => {
                if matcher.value.as_str().is_some_and(str::is_empty) {
                    report.warning(
                        format!("payload_matchers[{index}].value"),
                        "empty value in equality comparison",
                    );
                }
            }
            _ => {}
        }
    }

    if let Some(range) = conditions.time_range {
        if range.start >= range.end {
            report.error("time_range", "start must precede end");
        }
    }
    for (index, day) in conditions.days_of_week.iter().enumerate() {
        if *day > 6 {
            report.error(
                format!("days_of_week[{index}]"),
                "must be between 0 (Sunday) and 6 (Saturday)",
            );
        }
    }
    for (index, hour) in conditions.hours_of_day.iter().enumerate() {
        if *hour > 23 {
            report.error(format!("hours_of_day[{index}]"), "must be between 0 and 23");
        }
    }

    for (index, sub) in conditions.sub_conditions.iter().enumerate() {
        report.absorb(&format!("sub_conditions[{index}]."), validate_conditions(sub));
    }

    report
}

fn check_patterns(report: &mut ValidationReport, field: &str, patterns: &[String]) {
    for (index, pattern) in patterns.iter().enumerate() {
        if let Err(err) = Regex::new(pattern) {
            report.error(format!("{field}[{index}]"), format!("invalid regex: {err}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use crate::rule::{PayloadMatcher, TimeRange};

    use super::*;

    #[test]
    fn should_accept_a_default_tree() {
        let report = validate_conditions(&RuleConditions::default());
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn should_reject_patterns_that_do_not_compile() {
        let conditions = RuleConditions {
            repository_patterns: vec!["^api-.*$".to_string(), "[unclosed".to_string()],
            ..RuleConditions::default()
        };
        let report = validate_conditions(&conditions);
        assert!(!report.valid);
        assert_eq!(report.errors[0].field, "repository_patterns[1]");
        assert!(report.errors[0].message.starts_with("invalid regex:"));
    }

    #[test]
    fn should_reject_unrooted_matcher_paths_and_bad_matcher_regexes() {
        let conditions = RuleConditions {
            payload_matchers: vec![
                PayloadMatcher::new("action", MatchOp::Equals, json!("opened")),
                PayloadMatcher::new("$.title", MatchOp::Regex, json!("(broken")),
            ],
            ..RuleConditions::default()
        };
        let report = validate_conditions(&conditions);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].field, "payload_matchers[0].path");
        assert_eq!(report.errors[1].field, "payload_matchers[1].value");
    }

    #[test]
    fn should_reject_inverted_time_range_and_out_of_range_days_and_hours() {
        let at = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let conditions = RuleConditions {
            time_range: Some(TimeRange { start: at, end: at }),
            days_of_week: vec![1, 7],
            hours_of_day: vec![23, 24],
            ..RuleConditions::default()
        };
        let report = validate_conditions(&conditions);
        let fields: Vec<&str> = report.errors.iter().map(|issue| issue.field.as_str()).collect();
        assert_eq!(fields, vec!["time_range", "days_of_week[1]", "hours_of_day[1]"]);
    }

    #[test]
    fn should_warn_on_empty_equality_values() {
        let conditions = RuleConditions {
            payload_matchers: vec![PayloadMatcher::new("$.action", MatchOp::Equals, json!(""))],
            ..RuleConditions::default()
        };
        let report = validate_conditions(&conditions);
        assert!(report.valid);
        assert_eq!(report.warnings[0].field, "payload_matchers[0].value");
    }

    #[test]
    fn should_prefix_findings_from_nested_conditions() {
        let conditions = RuleConditions {
            sub_conditions: vec![RuleConditions {
                branch_patterns: vec!["[bad".to_string()],
                ..RuleConditions::default()
            }],
            ..RuleConditions::default()
        };
        let report = validate_conditions(&conditions);
        assert!(!report.valid);
        assert_eq!(report.errors[0].field, "sub_conditions[0].branch_patterns[0]");
    }
}

//! Storage ports — repository traits for persistence.

use std::future::Future;

use rulehub_domain::error::RuleHubError;
use rulehub_domain::execution::{Execution, ExecutionFilter};
use rulehub_domain::id::{ExecutionId, RuleId, RuleSetId, TemplateId};
use rulehub_domain::rule::{Rule, RuleFilter};
use rulehub_domain::rule_set::RuleSet;
use rulehub_domain::template::Template;

/// Repository for rules, rule sets, and execution records.
///
/// Rules and rule sets are scoped by organization; execution records are
/// scoped through their rule.
pub trait RuleRepository {
    /// Persist a new rule.
    fn create_rule(&self, rule: Rule) -> impl Future<Output = Result<Rule, RuleHubError>> + Send;

    /// Get a rule by organization and id.
    fn get_rule(
        &self,
        organization: &str,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<Rule>, RuleHubError>> + Send;

    /// List the organization's rules matching `filter`.
    fn list_rules(
        &self,
        organization: &str,
        filter: &RuleFilter,
    ) -> impl Future<Output = Result<Vec<Rule>, RuleHubError>> + Send;

    /// Replace an existing rule.
    fn update_rule(&self, rule: Rule) -> impl Future<Output = Result<Rule, RuleHubError>> + Send;

    /// Delete a rule by organization and id.
    fn delete_rule(
        &self,
        organization: &str,
        id: RuleId,
    ) -> impl Future<Output = Result<(), RuleHubError>> + Send;

    /// Persist a new rule set.
    fn create_rule_set(
        &self,
        rule_set: RuleSet,
    ) -> impl Future<Output = Result<RuleSet, RuleHubError>> + Send;

    /// Get a rule set by organization and id.
    fn get_rule_set(
        &self,
        organization: &str,
        id: RuleSetId,
    ) -> impl Future<Output = Result<Option<RuleSet>, RuleHubError>> + Send;

    /// List all of the organization's rule sets.
    fn list_rule_sets(
        &self,
        organization: &str,
    ) -> impl Future<Output = Result<Vec<RuleSet>, RuleHubError>> + Send;

    /// Replace an existing rule set.
    fn update_rule_set(
        &self,
        rule_set: RuleSet,
    ) -> impl Future<Output = Result<RuleSet, RuleHubError>> + Send;

    /// Delete a rule set by organization and id.
    fn delete_rule_set(
        &self,
        organization: &str,
        id: RuleSetId,
    ) -> impl Future<Output = Result<(), RuleHubError>> + Send;

    /// Persist an execution record, inserting or replacing by id.
    fn save_execution(
        &self,
        execution: Execution,
    ) -> impl Future<Output = Result<Execution, RuleHubError>> + Send;

    /// Get an execution record by id.
    fn get_execution(
        &self,
        id: ExecutionId,
    ) -> impl Future<Output = Result<Option<Execution>, RuleHubError>> + Send;

    /// List the organization's execution records matching `filter`.
    fn list_executions(
        &self,
        organization: &str,
        filter: &ExecutionFilter,
    ) -> impl Future<Output = Result<Vec<Execution>, RuleHubError>> + Send;
}

/// Repository for rule templates.
pub trait TemplateRepository {
    /// Persist a new template.
    fn create_template(
        &self,
        template: Template,
    ) -> impl Future<Output = Result<Template, RuleHubError>> + Send;

    /// Get a template by id.
    fn get_template(
        &self,
        id: TemplateId,
    ) -> impl Future<Output = Result<Option<Template>, RuleHubError>> + Send;

    /// List templates, optionally restricted to one category.
    fn list_templates(
        &self,
        category: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Template>, RuleHubError>> + Send;

    /// Replace an existing template.
    fn update_template(
        &self,
        template: Template,
    ) -> impl Future<Output = Result<Template, RuleHubError>> + Send;

    /// Delete a template by id.
    fn delete_template(
        &self,
        id: TemplateId,
    ) -> impl Future<Output = Result<(), RuleHubError>> + Send;
}

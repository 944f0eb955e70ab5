//! Rule manager — use-cases for rules, rule sets, templates, and executions.
//!
//! The manager owns the condition evaluator and talks to storage, the
//! action executor, and the platform API exclusively through ports.
//! Validation always precedes storage: invalid input never reaches a port.

use std::collections::BTreeMap;

use tracing::warn;

use rulehub_domain::context::{EvaluationContext, ExecutionContext};
use rulehub_domain::error::{ExecutionError, NotFoundError, RuleHubError, ValidationError};
use rulehub_domain::evaluate::{ConditionEvaluator, EvaluationResult};
use rulehub_domain::event::Event;
use rulehub_domain::execution::{
    ActionOutcome, Execution, ExecutionFilter, ExecutionStatus, TriggerKind,
};
use rulehub_domain::id::{ExecutionId, RuleId, RuleSetId, TemplateId};
use rulehub_domain::rule::{Action, DEFAULT_PRIORITY, FailurePolicy, Rule, RuleFilter};
use rulehub_domain::rule_set::RuleSet;
use rulehub_domain::template::Template;
use rulehub_domain::time;
use rulehub_domain::validation::{RuleTestReport, ValidationReport};

use crate::ports::{ActionExecutor, ActionOutput, ApiClient, RuleRepository, TemplateRepository};

/// Application service for the full rule lifecycle.
pub struct RuleManager<S, T, X, C> {
    storage: S,
    templates: T,
    executor: X,
    api: C,
    evaluator: ConditionEvaluator,
}

impl<S, T, X, C> RuleManager<S, T, X, C>
where
    S: RuleRepository,
    T: TemplateRepository,
    X: ActionExecutor,
    C: ApiClient,
{
    /// Create a manager backed by the given ports.
    pub fn new(storage: S, templates: T, executor: X, api: C) -> Self {
        Self {
            storage,
            templates,
            executor,
            api,
            evaluator: ConditionEvaluator::new(),
        }
    }

    // ── Rule CRUD ──────────────────────────────────────────────────

    /// Create a rule after validating structure, conditions, and actions.
    ///
    /// An unset (zero) priority defaults to 100; the stored rule starts at
    /// version 1 with fresh timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Validation`] when any check fails, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, rule), fields(rule_name = %rule.name, organization = %rule.organization))]
    pub async fn create_rule(&self, mut rule: Rule) -> Result<Rule, RuleHubError> {
        self.check_rule(&rule)?;
        if rule.priority == 0 {
            rule.priority = DEFAULT_PRIORITY;
        }
        rule.version = 1;
        let now = time::now();
        rule.created_at = now;
        rule.updated_at = now;
        self.storage.create_rule(rule).await
    }

    /// Look up a rule by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::NotFound`] when no rule with `id` exists in
    /// the organization, or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_rule(&self, organization: &str, id: RuleId) -> Result<Rule, RuleHubError> {
        self.storage.get_rule(organization, id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Rule",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List the organization's rules matching `filter`, ordered by priority
    /// descending, then creation time ascending.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_rules(
        &self,
        organization: &str,
        filter: &RuleFilter,
    ) -> Result<Vec<Rule>, RuleHubError> {
        let mut rules = self.storage.list_rules(organization, filter).await?;
        rules.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(rules)
    }

    /// Update an existing rule, bumping its version by exactly one.
    ///
    /// `created_at` and `created_by` are preserved from the stored rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Validation`] when any check fails,
    /// [`RuleHubError::NotFound`] when the rule does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, rule), fields(rule_id = %rule.id))]
    pub async fn update_rule(&self, mut rule: Rule) -> Result<Rule, RuleHubError> {
        self.check_rule(&rule)?;
        let existing = self.get_rule(&rule.organization, rule.id).await?;
        rule.created_at = existing.created_at;
        rule.created_by = existing.created_by;
        rule.version = existing.version + 1;
        rule.updated_at = time::now();
        self.storage.update_rule(rule).await
    }

    /// Delete a rule by id.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::NotFound`] when the rule does not exist, or
    /// a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, organization: &str, id: RuleId) -> Result<(), RuleHubError> {
        self.get_rule(organization, id).await?;
        self.storage.delete_rule(organization, id).await
    }

    /// Enable a rule. Counts as an update and bumps the version.
    ///
    /// # Errors
    ///
    /// Same conditions as [`update_rule`](Self::update_rule).
    pub async fn enable_rule(&self, organization: &str, id: RuleId) -> Result<Rule, RuleHubError> {
        self.set_enabled(organization, id, true).await
    }

    /// Disable a rule. Counts as an update and bumps the version.
    ///
    /// # Errors
    ///
    /// Same conditions as [`update_rule`](Self::update_rule).
    pub async fn disable_rule(
        &self,
        organization: &str,
        id: RuleId,
    ) -> Result<Rule, RuleHubError> {
        self.set_enabled(organization, id, false).await
    }

    async fn set_enabled(
        &self,
        organization: &str,
        id: RuleId,
        enabled: bool,
    ) -> Result<Rule, RuleHubError> {
        let mut rule = self.get_rule(organization, id).await?;
        rule.enabled = enabled;
        self.update_rule(rule).await
    }

    /// Fail-fast validation used by the write paths.
    fn check_rule(&self, rule: &Rule) -> Result<(), RuleHubError> {
        rule.validate()?;
        let report = self.evaluator.validate(&rule.conditions);
        if let Some(issue) = report.first_error() {
            return Err(ValidationError::invalid(
                format!("conditions.{}", issue.field),
                issue.message.clone(),
            )
            .into());
        }
        for action in &rule.actions {
            self.executor.validate_action(action)?;
        }
        Ok(())
    }

    // ── Evaluation ─────────────────────────────────────────────────

    /// Evaluate a rule's conditions against an event.
    ///
    /// Disabled rules short-circuit to a non-matching result without
    /// touching the evaluator or the API client.
    #[tracing::instrument(skip(self, rule, event), fields(rule_id = %rule.id, event_kind = %event.kind))]
    pub async fn evaluate_rule_conditions(&self, rule: &Rule, event: &Event) -> EvaluationResult {
        if !rule.enabled {
            return EvaluationResult::unmatched();
        }
        let context = self.build_evaluation_context(rule, event).await;
        self.evaluator.evaluate(&rule.conditions, event, &context)
    }

    /// Assemble the evaluation context from API lookups.
    ///
    /// A failed lookup logs a warning and leaves its slot empty; the
    /// matching condition category is then skipped rather than failed.
    async fn build_evaluation_context(&self, rule: &Rule, event: &Event) -> EvaluationContext {
        let mut context = EvaluationContext {
            environment: rule.metadata.environment.clone(),
            ..EvaluationContext::default()
        };
        if !event.repository.is_empty() {
            match self
                .api
                .get_repository(&event.organization, &event.repository)
                .await
            {
                Ok(repository) => context.repository = Some(repository),
                Err(err) => {
                    warn!(repository = %event.repository, error = %err, "repository lookup failed");
                }
            }
        }
        if !event.organization.is_empty() {
            match self.api.get_organization(&event.organization).await {
                Ok(organization) => context.organization = Some(organization),
                Err(err) => {
                    warn!(organization = %event.organization, error = %err, "organization lookup failed");
                }
            }
        }
        if !event.sender.is_empty() {
            match self.api.get_user(&event.sender).await {
                Ok(user) => context.user = Some(user),
                Err(err) => warn!(user = %event.sender, error = %err, "user lookup failed"),
            }
        }
        context
    }

    // ── Execution ──────────────────────────────────────────────────

    /// Run a rule's enabled actions in order and persist the execution.
    ///
    /// The record is persisted once `running` and again in its terminal
    /// state. A failing action marks the execution failed but later
    /// actions still run unless the action's failure policy is `stop`.
    ///
    /// # Errors
    ///
    /// Returns a storage error when persisting the execution fails. Action
    /// failures do not error; they are recorded on the execution.
    #[tracing::instrument(skip(self, rule, context), fields(rule_id = %rule.id, rule_name = %rule.name))]
    pub async fn execute_rule(
        &self,
        rule: &Rule,
        context: &ExecutionContext,
        trigger: TriggerKind,
    ) -> Result<Execution, RuleHubError> {
        let trigger_event_id = context.event.as_ref().map(|event| event.id);
        let mut execution = Execution::pending(rule.id, trigger, trigger_event_id);
        execution.mark_running();
        execution = self.storage.save_execution(execution).await?;

        let mut failed = 0usize;
        for action in rule.actions.iter().filter(|action| action.enabled) {
            let outcome = self.run_action(action, context).await;
            let aborts = outcome.status == ExecutionStatus::Failed
                && action.on_failure == FailurePolicy::Stop;
            if outcome.status == ExecutionStatus::Failed {
                failed += 1;
            }
            execution.actions.push(outcome);
            if aborts {
                break;
            }
        }

        if failed > 0 {
            execution.fail(format!("{failed} action(s) failed"));
        } else {
            execution.complete();
        }
        self.storage.save_execution(execution).await
    }

    async fn run_action(&self, action: &Action, context: &ExecutionContext) -> ActionOutcome {
        let started_at = time::now();
        match self.executor.execute_action(action, context).await {
            Ok(output) => ActionOutcome {
                action_id: action.id,
                kind: action.kind,
                status: ExecutionStatus::Completed,
                started_at,
                completed_at: Some(time::now()),
                error: None,
                output,
                simulated: false,
            },
            Err(err) => {
                warn!(action_name = %action.name, error = %err, "action failed");
                ActionOutcome {
                    action_id: action.id,
                    kind: action.kind,
                    status: ExecutionStatus::Failed,
                    started_at,
                    completed_at: Some(time::now()),
                    error: Some(err.to_string()),
                    output: ActionOutput::new(),
                    simulated: false,
                }
            }
        }
    }

    /// Cancel a pending or running execution.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Execution`] when the execution is already
    /// terminal, [`RuleHubError::NotFound`] when it does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_execution(&self, id: ExecutionId) -> Result<Execution, RuleHubError> {
        let mut execution = self.get_execution(id).await?;
        if execution.status.is_terminal() {
            return Err(ExecutionError::new(format!(
                "cannot cancel execution in status {}",
                execution.status
            ))
            .into());
        }
        execution.cancel();
        self.storage.save_execution(execution).await
    }

    /// Look up an execution record by id.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::NotFound`] when no execution with `id`
    /// exists, or a storage error from the repository.
    pub async fn get_execution(&self, id: ExecutionId) -> Result<Execution, RuleHubError> {
        self.storage.get_execution(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Execution",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List execution records matching `filter`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_executions(
        &self,
        organization: &str,
        filter: &ExecutionFilter,
    ) -> Result<Vec<Execution>, RuleHubError> {
        let mut executions = self.storage.list_executions(organization, filter).await?;
        executions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(executions)
    }

    // ── Dry runs ───────────────────────────────────────────────────

    /// Validate a rule, collecting every finding instead of failing fast.
    #[must_use]
    pub fn validate_rule(&self, rule: &Rule) -> ValidationReport {
        let mut report = ValidationReport::valid();
        if rule.name.is_empty() {
            report.error("name", "must not be empty");
        }
        if rule.organization.is_empty() {
            report.error("organization", "must not be empty");
        }
        if rule.actions.is_empty() {
            report.error("actions", "at least one action is required");
        } else if rule.actions.len() > 10 {
            report.warning("actions", "more than 10 actions may slow executions");
        }
        report.absorb("conditions.", self.evaluator.validate(&rule.conditions));
        let supported = self.executor.supported_actions();
        for (index, action) in rule.actions.iter().enumerate() {
            if !supported.is_empty() && !supported.contains(&action.kind) {
                report.error(
                    format!("actions[{index}].kind"),
                    format!("unsupported action kind '{}'", action.kind),
                );
            }
            if let Err(err) = self.executor.validate_action(action) {
                report.error(format!("actions[{index}]"), err.to_string());
            }
        }
        report
    }

    /// Dry-run a rule against a sample event.
    ///
    /// Conditions are evaluated for real; matching actions are simulated
    /// without touching the action executor, and nothing is persisted.
    pub async fn test_rule(&self, rule: &Rule, event: &Event) -> RuleTestReport {
        let started = std::time::Instant::now();
        let context = self.build_evaluation_context(rule, event).await;
        let evaluation = self.evaluator.evaluate(&rule.conditions, event, &context);
        let mut actions = Vec::new();
        if evaluation.matched {
            let now = time::now();
            for action in rule.actions.iter().filter(|action| action.enabled) {
                let mut output = ActionOutput::new();
                output.insert("simulated".to_string(), serde_json::Value::Bool(true));
                output.insert("test_mode".to_string(), serde_json::Value::Bool(true));
                actions.push(ActionOutcome {
                    action_id: action.id,
                    kind: action.kind,
                    status: ExecutionStatus::Completed,
                    started_at: now,
                    completed_at: Some(now),
                    error: None,
                    output,
                    simulated: true,
                });
            }
        }
        RuleTestReport {
            rule_id: rule.id,
            conditions_matched: evaluation.matched,
            actions,
            duration: started.elapsed(),
            errors: evaluation.errors,
        }
    }

    /// Fetch a stored rule and dry-run it against a sample event.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::NotFound`] when the rule does not exist, or
    /// a storage error from the repository.
    pub async fn dry_run_rule(
        &self,
        organization: &str,
        id: RuleId,
        event: &Event,
    ) -> Result<RuleTestReport, RuleHubError> {
        let rule = self.get_rule(organization, id).await?;
        Ok(self.test_rule(&rule, event).await)
    }

    // ── Rule sets ──────────────────────────────────────────────────

    /// Create a rule set after validating every member rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Validation`] when the set or any member is
    /// invalid, or a storage error from the repository.
    #[tracing::instrument(skip(self, rule_set), fields(rule_set_name = %rule_set.name))]
    pub async fn create_rule_set(&self, rule_set: RuleSet) -> Result<RuleSet, RuleHubError> {
        self.check_rule_set(&rule_set)?;
        self.storage.create_rule_set(rule_set).await
    }

    /// Look up a rule set by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::NotFound`] when no rule set with `id`
    /// exists in the organization, or a storage error from the repository.
    pub async fn get_rule_set(
        &self,
        organization: &str,
        id: RuleSetId,
    ) -> Result<RuleSet, RuleHubError> {
        self.storage
            .get_rule_set(organization, id)
            .await?
            .ok_or_else(|| {
                NotFoundError {
                    entity: "RuleSet",
                    id: id.to_string(),
                }
                .into()
            })
    }

    /// List all of the organization's rule sets.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_rule_sets(&self, organization: &str) -> Result<Vec<RuleSet>, RuleHubError> {
        self.storage.list_rule_sets(organization).await
    }

    /// Update an existing rule set, preserving its creation metadata.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Validation`] when the set or any member is
    /// invalid, [`RuleHubError::NotFound`] when it does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, rule_set), fields(rule_set_id = %rule_set.id))]
    pub async fn update_rule_set(&self, mut rule_set: RuleSet) -> Result<RuleSet, RuleHubError> {
        self.check_rule_set(&rule_set)?;
        let existing = self.get_rule_set(&rule_set.organization, rule_set.id).await?;
        rule_set.created_at = existing.created_at;
        rule_set.created_by = existing.created_by;
        rule_set.updated_at = time::now();
        self.storage.update_rule_set(rule_set).await
    }

    /// Delete a rule set by id.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::NotFound`] when the rule set does not
    /// exist, or a storage error from the repository.
    pub async fn delete_rule_set(
        &self,
        organization: &str,
        id: RuleSetId,
    ) -> Result<(), RuleHubError> {
        self.get_rule_set(organization, id).await?;
        self.storage.delete_rule_set(organization, id).await
    }

    fn check_rule_set(&self, rule_set: &RuleSet) -> Result<(), RuleHubError> {
        if rule_set.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if rule_set.organization.is_empty() {
            return Err(ValidationError::EmptyOrganization.into());
        }
        for rule in &rule_set.rules {
            self.check_rule(rule)?;
        }
        Ok(())
    }

    // ── Templates ──────────────────────────────────────────────────

    /// Create a template after validating its name and variables.
    ///
    /// The rule body is not condition-checked here: placeholders may make
    /// patterns uncompilable until instantiation.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Validation`] when the template is invalid,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self, template), fields(template_name = %template.name))]
    pub async fn create_template(&self, template: Template) -> Result<Template, RuleHubError> {
        template.validate()?;
        self.templates.create_template(template).await
    }

    /// Look up a template by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::NotFound`] when no template with `id`
    /// exists, or a storage error from the repository.
    pub async fn get_template(&self, id: TemplateId) -> Result<Template, RuleHubError> {
        self.templates.get_template(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Template",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List templates, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_templates(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<Template>, RuleHubError> {
        self.templates.list_templates(category).await
    }

    /// Update an existing template, preserving its creation metadata.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Validation`] when the template is invalid,
    /// [`RuleHubError::NotFound`] when it does not exist, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self, template), fields(template_id = %template.id))]
    pub async fn update_template(&self, mut template: Template) -> Result<Template, RuleHubError> {
        template.validate()?;
        let existing = self.get_template(template.id).await?;
        template.created_at = existing.created_at;
        template.created_by = existing.created_by;
        template.updated_at = time::now();
        self.templates.update_template(template).await
    }

    /// Delete a template by id.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::NotFound`] when the template does not
    /// exist, or a storage error from the repository.
    pub async fn delete_template(&self, id: TemplateId) -> Result<(), RuleHubError> {
        self.get_template(id).await?;
        self.templates.delete_template(id).await
    }

    /// Materialize a rule from a stored template.
    ///
    /// The returned rule is not persisted; pass it to
    /// [`create_rule`](Self::create_rule) to store it.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::NotFound`] when the template does not
    /// exist, or [`RuleHubError::Validation`] when required variables are
    /// missing or mistyped.
    #[tracing::instrument(skip(self, values))]
    pub async fn instantiate_template(
        &self,
        id: TemplateId,
        values: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Rule, RuleHubError> {
        let template = self.get_template(id).await?;
        template.instantiate(values)
    }
}

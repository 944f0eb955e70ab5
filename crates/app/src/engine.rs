//! Automation engine — asynchronous event intake and rule dispatch.
//!
//! The engine owns two bounded queues. Event workers drain the first,
//! match events against the organization's enabled rules, and push an
//! execution task per match onto the second; execution workers drain
//! that one and run the matched rule through the [`RuleManager`].
//! Intake never blocks the caller: a full event queue is reported as an
//! error instead of applying backpressure upstream.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use rulehub_domain::context::ExecutionContext;
use rulehub_domain::error::RuleHubError;
use rulehub_domain::event::{Event, EventKind};
use rulehub_domain::execution::{Execution, ExecutionStatus, TriggerKind};
use rulehub_domain::id::ExecutionId;
use rulehub_domain::rule::{Rule, RuleFilter};
use rulehub_domain::time;

use crate::metrics::EngineMetrics;
use crate::ports::{
    ActionExecutor, ApiClient, EventHandler, EventProcessor, RuleRepository, TemplateRepository,
};
use crate::rule_manager::RuleManager;

/// How long `stop` waits for workers before detaching them.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Cadence of the periodic metrics log line.
const METRICS_INTERVAL: Duration = Duration::from_secs(60);

/// First retry delay; later attempts multiply by the backoff factor.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Tunables for the engine's queues, workers, and retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of event workers. Execution workers are half as many,
    /// with a floor of one.
    pub max_workers: usize,
    /// Capacity of the bounded event queue.
    pub event_buffer_size: usize,
    /// Per-attempt wall-clock budget for one rule execution.
    pub execution_timeout: Duration,
    /// When false, matched rules run inline in the event worker.
    pub enable_async_execution: bool,
    /// When false, the processor's filter step is bypassed.
    pub enable_rule_filtering: bool,
    /// When false, the periodic metrics reporter is not started.
    pub enable_metrics: bool,
    /// Retries after a failed attempt; zero disables retrying.
    pub max_retries: u32,
    /// Multiplier applied to the retry delay per attempt.
    pub retry_backoff_factor: f64,
    /// Event kinds dropped before rule matching.
    pub excluded_event_kinds: Vec<EventKind>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            event_buffer_size: 1000,
            execution_timeout: Duration::from_secs(300),
            enable_async_execution: true,
            enable_rule_filtering: true,
            enable_metrics: true,
            max_retries: 3,
            retry_backoff_factor: 2.0,
            excluded_event_kinds: Vec::new(),
        }
    }
}

/// Errors surfaced by the engine's public surface.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine is already running")]
    AlreadyRunning,
    #[error("engine is not running")]
    NotRunning,
    #[error("event channel is full")]
    ChannelFull,
    #[error("event validation failed: {0}")]
    ValidationFailed(String),
    #[error(transparent)]
    Domain(#[from] RuleHubError),
}

/// A matched rule waiting for (or retrying) execution.
struct ExecutionTask {
    rule: Rule,
    context: ExecutionContext,
    /// 1-based; compared against `max_retries` + 1.
    attempt: u32,
}

type SharedReceiver<T> = Arc<tokio::sync::Mutex<mpsc::Receiver<T>>>;

/// Channels and worker handles that exist only while the engine runs.
struct EngineRuntime {
    event_tx: mpsc::Sender<Event>,
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

struct EngineInner<S, T, X, C, P> {
    manager: Arc<RuleManager<S, T, X, C>>,
    processor: P,
    config: EngineConfig,
    metrics: Mutex<EngineMetrics>,
    /// Engine-side view of in-flight executions; the authoritative
    /// records live in storage.
    active: Mutex<HashMap<ExecutionId, Execution>>,
    runtime: Mutex<Option<EngineRuntime>>,
}

/// Event-driven dispatcher over a [`RuleManager`].
///
/// Cheap to clone; all clones share the same queues, metrics, and
/// lifecycle.
pub struct AutomationEngine<S, T, X, C, P> {
    inner: Arc<EngineInner<S, T, X, C, P>>,
}

impl<S, T, X, C, P> Clone for AutomationEngine<S, T, X, C, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, T, X, C, P> AutomationEngine<S, T, X, C, P>
where
    S: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    X: ActionExecutor + Send + Sync + 'static,
    C: ApiClient + Send + Sync + 'static,
    P: EventProcessor + Send + Sync + 'static,
{
    /// Create a stopped engine around an existing manager.
    pub fn new(manager: Arc<RuleManager<S, T, X, C>>, processor: P, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                manager,
                processor,
                config,
                metrics: Mutex::new(EngineMetrics::default()),
                active: Mutex::new(HashMap::new()),
                runtime: Mutex::new(None),
            }),
        }
    }

    /// The manager this engine dispatches through.
    pub fn manager(&self) -> &RuleManager<S, T, X, C> {
        &self.inner.manager
    }

    /// Spawn the worker pools and open the queues.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyRunning`] when the engine has
    /// already been started.
    pub fn start(&self) -> Result<(), EngineError> {
        let mut runtime = lock(&self.inner.runtime);
        if runtime.is_some() {
            return Err(EngineError::AlreadyRunning);
        }

        let config = &self.inner.config;
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer_size.max(1));
        let (task_tx, task_rx) = mpsc::channel((config.max_workers * 2).max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let event_rx: SharedReceiver<Event> = Arc::new(tokio::sync::Mutex::new(event_rx));
        let task_rx: SharedReceiver<ExecutionTask> = Arc::new(tokio::sync::Mutex::new(task_rx));

        let mut workers = Vec::new();
        for worker_id in 0..config.max_workers {
            let engine = self.clone();
            let events = Arc::clone(&event_rx);
            let task_tx = task_tx.clone();
            let shutdown = shutdown_rx.clone();
            workers.push(tokio::spawn(async move {
                engine.event_worker(worker_id, events, task_tx, shutdown).await;
            }));
        }
        for worker_id in 0..(config.max_workers / 2).max(1) {
            let engine = self.clone();
            let tasks = Arc::clone(&task_rx);
            let task_tx = task_tx.clone();
            let shutdown = shutdown_rx.clone();
            workers.push(tokio::spawn(async move {
                engine.execution_worker(worker_id, tasks, task_tx, shutdown).await;
            }));
        }
        if config.enable_metrics {
            let engine = self.clone();
            let shutdown = shutdown_rx;
            workers.push(tokio::spawn(async move {
                engine.metrics_reporter(shutdown).await;
            }));
        }

        lock(&self.inner.metrics).started_at = Some(time::now());
        *runtime = Some(EngineRuntime {
            event_tx,
            shutdown_tx,
            workers,
        });
        info!(
            workers = config.max_workers,
            buffer = config.event_buffer_size,
            "engine started"
        );
        Ok(())
    }

    /// Signal shutdown and wait for the workers to finish.
    ///
    /// Workers that do not stop within thirty seconds are detached with
    /// a warning rather than aborted.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] when the engine is stopped.
    pub async fn stop(&self) -> Result<(), EngineError> {
        let runtime = lock(&self.inner.runtime).take();
        let Some(runtime) = runtime else {
            return Err(EngineError::NotRunning);
        };

        let _ = runtime.shutdown_tx.send(true);
        drop(runtime.event_tx);
        let drain = async {
            for worker in runtime.workers {
                let _ = worker.await;
            }
        };
        if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
            warn!("workers still busy after {DRAIN_TIMEOUT:?}, detaching");
        }
        info!("engine stopped");
        Ok(())
    }

    /// Whether the engine currently accepts events.
    pub fn is_running(&self) -> bool {
        lock(&self.inner.runtime).is_some()
    }

    /// Validate an event and enqueue it for dispatch.
    ///
    /// The event counts as processed once it is accepted into the
    /// queue; rejected and overflowing events leave the metrics
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] when the engine is stopped,
    /// [`EngineError::ValidationFailed`] when the processor rejects the
    /// event, or [`EngineError::ChannelFull`] when the queue is at
    /// capacity.
    pub async fn process_event(&self, event: Event) -> Result<(), EngineError> {
        let event_tx = {
            let runtime = lock(&self.inner.runtime);
            let Some(runtime) = runtime.as_ref() else {
                return Err(EngineError::NotRunning);
            };
            runtime.event_tx.clone()
        };

        self.inner
            .processor
            .validate_event(&event)
            .await
            .map_err(|err| EngineError::ValidationFailed(err.to_string()))?;

        let kind = event.kind;
        event_tx
            .try_send(event)
            .map_err(|_| EngineError::ChannelFull)?;
        lock(&self.inner.metrics).record_event(kind, time::now());
        Ok(())
    }

    /// Register an event handler with the underlying processor.
    ///
    /// # Errors
    ///
    /// Propagates the processor's registration error.
    pub async fn register_handler<H>(&self, handler: H) -> Result<(), RuleHubError>
    where
        H: EventHandler + Send + Sync + 'static,
    {
        self.inner.processor.register_handler(handler).await
    }

    /// Snapshot of the engine's counters.
    pub fn get_metrics(&self) -> EngineMetrics {
        lock(&self.inner.metrics).clone()
    }

    /// Snapshot of the executions currently inside a worker.
    pub fn get_active_executions(&self) -> Vec<Execution> {
        lock(&self.inner.active).values().cloned().collect()
    }

    async fn event_worker(
        &self,
        worker_id: usize,
        events: SharedReceiver<Event>,
        task_tx: mpsc::Sender<ExecutionTask>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        debug!(worker_id, "event worker started");
        loop {
            let event = tokio::select! {
                _ = shutdown.changed() => break,
                event = async { events.lock().await.recv().await } => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            if let Err(err) = self.handle_event(&task_tx, event).await {
                error!(worker_id, error = %err, "event handling failed");
            }
        }
        debug!(worker_id, "event worker stopped");
    }

    async fn execution_worker(
        &self,
        worker_id: usize,
        tasks: SharedReceiver<ExecutionTask>,
        task_tx: mpsc::Sender<ExecutionTask>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        debug!(worker_id, "execution worker started");
        loop {
            let task = tokio::select! {
                _ = shutdown.changed() => break,
                task = async { tasks.lock().await.recv().await } => match task {
                    Some(task) => task,
                    None => break,
                },
            };
            self.execute_task(&task_tx, task).await;
        }
        debug!(worker_id, "execution worker stopped");
    }

    /// Match one event against the organization's enabled rules.
    async fn handle_event(
        &self,
        task_tx: &mpsc::Sender<ExecutionTask>,
        event: Event,
    ) -> Result<(), RuleHubError> {
        let config = &self.inner.config;
        if config.excluded_event_kinds.contains(&event.kind) {
            debug!(event_kind = %event.kind, "event kind excluded");
            return Ok(());
        }
        if config.enable_rule_filtering && !self.inner.processor.filter_event(&event).await? {
            debug!(event_id = %event.id, "event dropped by processor filter");
            return Ok(());
        }

        let rules = self
            .inner
            .manager
            .list_rules(&event.organization, &RuleFilter::enabled_only())
            .await?;
        for rule in rules {
            {
                lock(&self.inner.metrics).rules_evaluated += 1;
            }
            let evaluation = self.inner.manager.evaluate_rule_conditions(&rule, &event).await;
            if !evaluation.matched {
                continue;
            }
            info!(rule_name = %rule.name, event_kind = %event.kind, "rule matched");
            let context = execution_context(&rule, &event);
            let task = ExecutionTask {
                rule,
                context,
                attempt: 1,
            };
            if config.enable_async_execution {
                if let Err(err) = task_tx.try_send(task) {
                    let dropped = err.into_inner();
                    warn!(rule_name = %dropped.rule.name, "execution queue full, dropping task");
                }
            } else {
                self.execute_task(task_tx, task).await;
            }
        }
        Ok(())
    }

    /// Run one attempt of a matched rule, scheduling a retry on failure.
    async fn execute_task(&self, task_tx: &mpsc::Sender<ExecutionTask>, task: ExecutionTask) {
        let ExecutionTask {
            rule,
            context,
            attempt,
        } = task;

        let mut in_flight = Execution::pending(
            rule.id,
            TriggerKind::Event,
            context.event.as_ref().map(|event| event.id),
        );
        in_flight.mark_running();
        let in_flight_id = in_flight.id;
        lock(&self.inner.active).insert(in_flight_id, in_flight);

        let started = std::time::Instant::now();
        let outcome = tokio::time::timeout(
            self.inner.config.execution_timeout,
            self.inner.manager.execute_rule(&rule, &context, TriggerKind::Event),
        )
        .await;
        lock(&self.inner.active).remove(&in_flight_id);
        let elapsed = started.elapsed();

        let failed = match &outcome {
            Ok(Ok(execution)) => {
                lock(&self.inner.metrics).record_execution(execution.status, elapsed);
                execution.status == ExecutionStatus::Failed
            }
            Ok(Err(err)) => {
                error!(rule_name = %rule.name, error = %err, "execution errored");
                lock(&self.inner.metrics).record_execution(ExecutionStatus::Failed, elapsed);
                true
            }
            Err(_) => {
                error!(
                    rule_name = %rule.name,
                    timeout = ?self.inner.config.execution_timeout,
                    "execution timed out"
                );
                lock(&self.inner.metrics).record_execution(ExecutionStatus::Failed, elapsed);
                true
            }
        };
        if !failed {
            return;
        }

        if attempt > self.inner.config.max_retries {
            lock(&self.inner.metrics).execution_errors += 1;
            error!(rule_name = %rule.name, attempt, "execution failed, retries exhausted");
            return;
        }
        let delay = retry_delay(self.inner.config.retry_backoff_factor, attempt);
        warn!(
            rule_name = %rule.name,
            attempt,
            delay_ms = delay.as_millis(),
            "scheduling retry"
        );
        let task_tx = task_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let retry = ExecutionTask {
                rule,
                context,
                attempt: attempt + 1,
            };
            if task_tx.send(retry).await.is_err() {
                warn!("engine stopped before the retry could run");
            }
        });
    }

    async fn metrics_reporter(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(METRICS_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    let metrics = lock(&self.inner.metrics).clone();
                    debug!(
                        events_processed = metrics.events_processed,
                        rules_evaluated = metrics.rules_evaluated,
                        rules_executed = metrics.rules_executed,
                        execution_errors = metrics.execution_errors,
                        "engine metrics"
                    );
                }
            }
        }
    }
}

/// Execution context for a rule matched by `event`.
fn execution_context(rule: &Rule, event: &Event) -> ExecutionContext {
    let mut variables = serde_json::Map::new();
    variables.insert(
        "event_id".to_string(),
        serde_json::Value::String(event.id.to_string()),
    );
    variables.insert(
        "event_type".to_string(),
        serde_json::Value::String(event.kind.to_string()),
    );
    if let Some(action) = event.action {
        variables.insert(
            "event_action".to_string(),
            serde_json::Value::String(action.to_string()),
        );
    }
    variables.insert(
        "repository".to_string(),
        serde_json::Value::String(event.repository.clone()),
    );
    variables.insert(
        "sender".to_string(),
        serde_json::Value::String(event.sender.clone()),
    );
    ExecutionContext {
        event: Some(event.clone()),
        organization: event.organization.clone(),
        user: event.sender.clone(),
        environment: rule.metadata.environment.clone(),
        variables,
        metadata: serde_json::Map::new(),
    }
}

fn retry_delay(factor: f64, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
    RETRY_BASE_DELAY.mul_f64(factor.powi(exponent))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

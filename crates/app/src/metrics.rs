//! Engine metrics — counters the engine maintains while dispatching.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use rulehub_domain::event::EventKind;
use rulehub_domain::execution::ExecutionStatus;
use rulehub_domain::time::Timestamp;

/// Counters and gauges describing engine activity since `started_at`.
///
/// `events_processed` counts events accepted into the queue (exactly once,
/// at enqueue); `rules_evaluated` counts per-rule evaluations;
/// `rules_executed` counts execution attempts, retries included;
/// `execution_errors` counts tasks whose retries were exhausted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineMetrics {
    pub events_processed: u64,
    pub rules_evaluated: u64,
    pub rules_executed: u64,
    pub execution_errors: u64,
    pub average_execution_time: Duration,
    pub event_type_distribution: BTreeMap<EventKind, u64>,
    pub executions_by_status: BTreeMap<ExecutionStatus, u64>,
    pub last_processed_event: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
}

impl EngineMetrics {
    /// Count one accepted event.
    pub fn record_event(&mut self, kind: EventKind, at: Timestamp) {
        self.events_processed += 1;
        *self.event_type_distribution.entry(kind).or_default() += 1;
        self.last_processed_event = Some(at);
    }

    /// Count one finished execution attempt.
    pub fn record_execution(&mut self, status: ExecutionStatus, elapsed: Duration) {
        self.rules_executed += 1;
        *self.executions_by_status.entry(status).or_default() += 1;
        // Rolling average, seeded by the first sample.
        self.average_execution_time = if self.average_execution_time.is_zero() {
            elapsed
        } else {
            (self.average_execution_time + elapsed) / 2
        };
    }
}

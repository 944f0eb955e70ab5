//! Event processor port — webhook intake and event gating.
//!
//! The processor sits between the raw webhook transport and the engine. It
//! verifies and parses deliveries into domain [`Event`]s, and gates which
//! events the engine dispatches at all.

use std::future::Future;

use rulehub_domain::error::RuleHubError;
use rulehub_domain::event::{Event, EventAction};

/// A registered consumer of processed events.
///
/// Handlers run inside the processor adapter, next to (not instead of) rule
/// dispatch — fixed integrations that want every matching event regardless
/// of rule configuration.
pub trait EventHandler {
    /// React to one event.
    fn handle_event(&self, event: &Event) -> impl Future<Output = Result<(), RuleHubError>> + Send;

    /// Actions this handler wants; empty means all.
    fn supported_actions(&self) -> Vec<EventAction>;

    /// Dispatch order among handlers; higher runs first.
    fn priority(&self) -> i64 {
        0
    }
}

/// Webhook intake and event gating.
pub trait EventProcessor {
    /// Check an event before it enters the dispatch queue.
    fn validate_event(
        &self,
        event: &Event,
    ) -> impl Future<Output = Result<(), RuleHubError>> + Send;

    /// Decide whether an accepted event should reach rule evaluation.
    fn filter_event(&self, event: &Event)
    -> impl Future<Output = Result<bool, RuleHubError>> + Send;

    /// Parse a raw webhook delivery into a domain event.
    ///
    /// `kind` is the transport-level event name (the `X-GitHub-Event`
    /// header value).
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Validation`] when the body is not a valid
    /// delivery of `kind`.
    fn parse_webhook(&self, kind: &str, body: &[u8]) -> Result<Event, RuleHubError>;

    /// Verify a delivery signature against the configured secret.
    ///
    /// # Errors
    ///
    /// Returns [`RuleHubError::Validation`] when the signature does not
    /// match.
    fn verify_signature(&self, body: &[u8], signature: &str) -> Result<(), RuleHubError>;

    /// Register a handler to run inside the processor for matching events.
    fn register_handler<H>(
        &self,
        handler: H,
    ) -> impl Future<Output = Result<(), RuleHubError>> + Send
    where
        H: EventHandler + Send + Sync + 'static;
}

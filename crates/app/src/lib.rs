//! # rulehub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `RuleRepository` — rules, rule sets, and execution records
//!   - `TemplateRepository` — rule templates
//!   - `ActionExecutor` — carries out rule actions against the outside world
//!   - `ApiClient` — read-only repository/organization/user lookups
//!   - `EventProcessor` — webhook parsing, validation, and event filtering
//! - Define **driving/inbound ports** as use-case structs:
//!   - `RuleManager` — rule/rule-set/template CRUD, evaluation, execution
//!   - `AutomationEngine` — dispatches events through workers to matching rules
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `rulehub-domain` only (plus `tokio::sync`/`tokio::time` for
//! channels and timeouts). Never imports adapter crates. Adapters depend on
//! *this* crate, not the reverse.

pub mod engine;
pub mod metrics;
pub mod ports;
pub mod rule_manager;

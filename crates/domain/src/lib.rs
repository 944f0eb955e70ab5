//! # rulehub-domain
//!
//! Pure domain model for the rulehub GitHub organization automation core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Events** (webhook-shaped records of GitHub happenings)
//! - Define **Rules** (condition tree → ordered action list, per organization)
//! - Define **Executions** (tracked runs of a rule's actions, with a status
//!   state machine)
//! - Define **Rule sets** and **Templates** (grouping and parameterized
//!   instantiation of rules)
//! - Evaluate and validate the condition DSL (`evaluate`) — pure and
//!   re-entrant, no shared state
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app` or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod context;
pub mod evaluate;
pub mod event;
pub mod execution;
pub mod rule;
pub mod rule_set;
pub mod template;
pub mod validation;

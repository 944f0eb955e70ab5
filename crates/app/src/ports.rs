//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod action_executor;
pub mod api_client;
pub mod event_processor;
pub mod storage;

pub use action_executor::{ActionExecutor, ActionOutput};
pub use api_client::ApiClient;
pub use event_processor::{EventHandler, EventProcessor};
pub use storage::{RuleRepository, TemplateRepository};

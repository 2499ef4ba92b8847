pub mod engine;
pub mod queries;
pub mod store;
pub mod tasks;
pub mod types;

pub use engine::{TransitionError, validate_draft};
pub use queries::PgStore;
pub use store::{MemoryStore, Mutation, WorkflowStore};
pub use tasks::{compute_stats, pending_tasks_for};
pub use types::*;

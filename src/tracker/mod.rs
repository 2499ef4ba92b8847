//! Dashboard-side workflow tracker: a typed API client plus the state a
//! dashboard renders from.

pub mod api;
pub mod error;
pub mod filter;
pub mod projection;
pub mod resource;
pub mod state;

pub use api::{HttpWorkflowApi, WorkflowApi};
pub use error::ApiError;
pub use filter::WorkflowFilter;
pub use projection::{StepVisual, WorkflowAction, available_actions, progress, project_steps};
pub use resource::Resource;
pub use state::WorkflowTracker;

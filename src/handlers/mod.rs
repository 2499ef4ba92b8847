pub mod api;
pub mod event_handlers;
pub mod settings_handlers;
pub mod workflow_handlers;

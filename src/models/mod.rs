pub mod setting;
pub mod workflow;

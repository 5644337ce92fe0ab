//! Presentation layer - UI-facing state holders

pub mod screen_controller;
pub mod workflow_controller;

pub use screen_controller::{DispatchOutcome, ScreenController, ScreenUiState};
pub use workflow_controller::{
    WorkflowController, WorkflowIntent, WorkflowUiState, WORKFLOW_ERROR_STATE_MESSAGE,
};

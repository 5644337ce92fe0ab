//! Workflow surface state
//!
//! Turns user intents into workflow calls and folds each outcome into a single
//! `WorkflowUiState` that a renderer can draw directly.

use std::sync::Arc;
use tokio::sync::watch;

use flowpilot_domain::{Context, ErrorCategory, ScreenData, StateType, WorkflowError, WorkflowState};

use crate::application::services::WorkflowManager;

/// Message shown when the server put the flow into its error state
pub const WORKFLOW_ERROR_STATE_MESSAGE: &str = "Workflow error state";

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowIntent {
    StartWorkflow(Option<String>),
    SendEvent { name: String, data: Context },
    UpdateContext(Context),
    ClearError,
    ResetWorkflow,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowUiState {
    pub is_loading: bool,
    pub current_state: Option<String>,
    pub state_type: Option<StateType>,
    pub screen: Option<ScreenData>,
    pub context: Context,
    /// Context without internal `__` keys
    pub visible_context: Context,
    pub error: Option<String>,
    pub error_category: Option<ErrorCategory>,
    pub session_id: Option<String>,
    pub workflow_id: Option<String>,
}

impl WorkflowUiState {
    /// Transient states render as loading; only screens are interactive.
    pub fn is_busy(&self) -> bool {
        self.is_loading || self.state_type.is_some_and(|t| t.is_transient())
    }

    fn apply_state(&mut self, state: WorkflowState) {
        self.is_loading = false;
        self.visible_context = state.visible_context();
        self.error = state
            .is_error
            .then(|| WORKFLOW_ERROR_STATE_MESSAGE.to_string());
        self.error_category = None;
        self.session_id = Some(state.session_id);
        if !state.workflow_id.is_empty() {
            self.workflow_id = Some(state.workflow_id);
        }
        self.current_state = Some(state.current_state);
        self.state_type = Some(state.state_type);
        self.screen = state.screen;
        self.context = state.context;
    }

    fn apply_error(&mut self, error: &WorkflowError) {
        let category = error.category();
        self.is_loading = false;
        self.error = Some(category.user_message().to_string());
        self.error_category = Some(category);
    }
}

pub struct WorkflowController {
    manager: Arc<WorkflowManager>,
    state: watch::Sender<WorkflowUiState>,
}

impl WorkflowController {
    pub fn new(manager: Arc<WorkflowManager>) -> Self {
        let (state, _) = watch::channel(WorkflowUiState {
            session_id: manager.current_session_id(),
            workflow_id: manager.current_workflow_id(),
            ..WorkflowUiState::default()
        });
        Self { manager, state }
    }

    pub fn observe(&self) -> watch::Receiver<WorkflowUiState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WorkflowUiState {
        self.state.borrow().clone()
    }

    /// Apply one intent and return the resulting state.
    pub async fn handle(&self, intent: WorkflowIntent) -> WorkflowUiState {
        let call = match intent {
            WorkflowIntent::ClearError => {
                self.state.send_modify(|ui| {
                    ui.error = None;
                    ui.error_category = None;
                });
                return self.state();
            }
            WorkflowIntent::ResetWorkflow => {
                self.manager.end_session();
                self.state.send_replace(WorkflowUiState {
                    workflow_id: self.manager.current_workflow_id(),
                    ..WorkflowUiState::default()
                });
                return self.state();
            }
            call => call,
        };

        self.state.send_modify(|ui| {
            ui.is_loading = true;
            ui.error = None;
            ui.error_category = None;
        });

        let result = match call {
            WorkflowIntent::StartWorkflow(workflow_id) => {
                self.manager.start_workflow(workflow_id, Context::new()).await
            }
            WorkflowIntent::SendEvent { name, data } => self.manager.send_event(name, data).await,
            WorkflowIntent::UpdateContext(updates) => self.manager.update_context(updates).await,
            WorkflowIntent::ClearError | WorkflowIntent::ResetWorkflow => return self.state(),
        };

        match result {
            Ok(state) => self.state.send_modify(|ui| ui.apply_state(state)),
            Err(e) => {
                tracing::warn!(error = %e, category = ?e.category(), "Workflow call failed");
                self.state.send_modify(|ui| ui.apply_error(&e));
            }
        }
        self.state()
    }
}

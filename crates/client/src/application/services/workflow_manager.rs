//! Workflow facade
//!
//! Thin orchestration over a [`WorkflowRepository`] for UI code: start, resume,
//! advance and end a session without touching ids or wire types.

use std::sync::Arc;
use tokio::sync::watch;

use flowpilot_domain::{Context, StateSet, WorkflowError, WorkflowState};

use super::workflow_repository::WorkflowRepository;
use crate::ports::outbound::ClockPort;

pub struct WorkflowManager {
    repository: Arc<dyn WorkflowRepository>,
    clock: Arc<dyn ClockPort>,
}

impl WorkflowManager {
    pub fn new(repository: Arc<dyn WorkflowRepository>, clock: Arc<dyn ClockPort>) -> Self {
        Self { repository, clock }
    }

    /// Start a workflow, sending `initial_context` with the first request.
    pub async fn start_workflow(
        &self,
        workflow_id: Option<String>,
        initial_context: Context,
    ) -> Result<WorkflowState, WorkflowError> {
        self.repository
            .start_workflow_with_context(workflow_id, initial_context)
            .await
    }

    pub async fn send_event(
        &self,
        event_name: impl Into<String>,
        event_data: Context,
    ) -> Result<WorkflowState, WorkflowError> {
        self.repository
            .send_event(event_name.into(), event_data)
            .await
    }

    pub async fn update_context(&self, updates: Context) -> Result<WorkflowState, WorkflowError> {
        self.repository.update_context(updates).await
    }

    /// Resume the stored session.
    ///
    /// Returns `None` when there is no session to resume; the caller should start
    /// a fresh flow instead. A passed `session_id` only counts as "a session
    /// exists": the stored session is what gets resumed.
    pub async fn restore_session(
        &self,
        session_id: Option<&str>,
    ) -> Option<Result<WorkflowState, WorkflowError>> {
        let resolved = session_id
            .map(str::to_string)
            .or_else(|| self.repository.current_session_id())?;

        tracing::info!(session_id = %resolved, "Restoring workflow session");
        Some(self.repository.start_workflow(None).await)
    }

    /// Forget the session; observers receive `None` next.
    pub fn end_session(&self) {
        self.repository.clear_session();
        tracing::info!("Workflow session ended");
    }

    pub async fn health_check(&self) -> Result<String, WorkflowError> {
        self.repository.health_check().await
    }

    /// Save a workflow definition; it becomes the stored workflow id.
    pub async fn save_workflow(
        &self,
        states: StateSet,
        predefined_context: Context,
    ) -> Result<String, WorkflowError> {
        self.repository
            .save_workflow(states, predefined_context)
            .await
    }

    pub fn observe_workflow_state(&self) -> watch::Receiver<Option<WorkflowState>> {
        self.repository.observe_workflow_state()
    }

    pub fn current_state(&self) -> Option<WorkflowState> {
        self.repository.current_state()
    }

    pub fn current_session_id(&self) -> Option<String> {
        self.repository.current_session_id()
    }

    pub fn current_workflow_id(&self) -> Option<String> {
        self.repository.current_workflow_id()
    }

    pub fn has_active_session(&self) -> bool {
        self.repository.current_session_id().is_some()
    }

    /// Readable session id: `session_{user|anonymous}_{millis}_{8 hex}`.
    pub fn generate_session_id(&self, user_id: Option<&str>) -> String {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        format!(
            "session_{}_{}_{}",
            user_id.unwrap_or("anonymous"),
            self.clock.now_millis(),
            &uuid[..8]
        )
    }
}

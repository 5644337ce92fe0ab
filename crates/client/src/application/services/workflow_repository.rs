//! Workflow session repository
//!
//! Keeps one workflow session alive across calls: resolves the session and
//! workflow ids, converts context between native and wire form, and republishes
//! the single current [`WorkflowState`] after every successful call.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use flowpilot_domain::{
    context_from_json, context_to_json, Context, StateSet, WorkflowError, WorkflowState,
};
use flowpilot_shared::{SaveWorkflowRequest, WorkflowExecutionRequest};

use super::session_store::SessionStore;
use crate::ports::outbound::WorkflowApiPort;

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Save a workflow definition and remember its id. Returns the id.
    async fn save_workflow(
        &self,
        states: StateSet,
        predefined_context: Context,
    ) -> Result<String, WorkflowError>;

    /// Start (or resume) a session. `None` falls back to the stored workflow id.
    async fn start_workflow(&self, workflow_id: Option<String>)
        -> Result<WorkflowState, WorkflowError>;

    /// Start (or resume) a session, sending `context` with the first request.
    async fn start_workflow_with_context(
        &self,
        workflow_id: Option<String>,
        context: Context,
    ) -> Result<WorkflowState, WorkflowError>;

    async fn send_event(
        &self,
        event_name: String,
        context: Context,
    ) -> Result<WorkflowState, WorkflowError>;

    /// Merge `context` into the session without firing an event.
    async fn update_context(&self, context: Context) -> Result<WorkflowState, WorkflowError>;

    /// Server health status string
    async fn health_check(&self) -> Result<String, WorkflowError>;

    /// Latest state; `None` before the first call and after `clear_session`.
    fn observe_workflow_state(&self) -> watch::Receiver<Option<WorkflowState>>;

    fn current_state(&self) -> Option<WorkflowState>;

    fn current_session_id(&self) -> Option<String>;

    fn current_workflow_id(&self) -> Option<String>;

    fn clear_session(&self);
}

/// Repository backed by the workflow server and the session store
pub struct WorkflowSessionRepository {
    api: Arc<dyn WorkflowApiPort>,
    sessions: Arc<SessionStore>,
    state: watch::Sender<Option<WorkflowState>>,
    // One server call at a time, so published states follow call order
    call_lock: Mutex<()>,
}

impl WorkflowSessionRepository {
    pub fn new(api: Arc<dyn WorkflowApiPort>, sessions: Arc<SessionStore>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            api,
            sessions,
            state,
            call_lock: Mutex::new(()),
        }
    }

    async fn execute(
        &self,
        workflow_id: Option<String>,
        event_name: Option<String>,
        context: Context,
    ) -> Result<WorkflowState, WorkflowError> {
        let _guard = self.call_lock.lock().await;

        let session_id = self.sessions.get_session_id();
        let mut request = WorkflowExecutionRequest::new(session_id)
            .with_workflow_id(workflow_id)
            .with_context(context_to_json(&context));
        if let Some(event_name) = event_name {
            request = request.with_event(event_name);
        }

        let response = self.api.execute_workflow(request).await?;

        // The server is authoritative for the session id once it answers
        self.sessions.update_session_id(&response.session_id);

        let state = WorkflowState::new(
            response.session_id,
            response.current_state,
            response.state_type,
            context_from_json(&response.context),
            response.screen,
        );
        self.state.send_replace(Some(state.clone()));

        tracing::debug!(
            session_id = %state.session_id,
            current_state = %state.current_state,
            state_type = %state.state_type,
            is_error = state.is_error,
            "Workflow state published"
        );
        Ok(state)
    }
}

#[async_trait]
impl WorkflowRepository for WorkflowSessionRepository {
    async fn save_workflow(
        &self,
        states: StateSet,
        predefined_context: Context,
    ) -> Result<String, WorkflowError> {
        let request = SaveWorkflowRequest {
            states,
            predefined_context: context_to_json(&predefined_context),
        };

        let response = self.api.save_workflow(request).await?;
        self.sessions.save_workflow_id(&response.wf_description_id);

        tracing::info!(
            workflow_id = %response.wf_description_id,
            status = %response.status,
            "Workflow saved"
        );
        Ok(response.wf_description_id)
    }

    async fn start_workflow(
        &self,
        workflow_id: Option<String>,
    ) -> Result<WorkflowState, WorkflowError> {
        self.start_workflow_with_context(workflow_id, Context::new()).await
    }

    async fn start_workflow_with_context(
        &self,
        workflow_id: Option<String>,
        context: Context,
    ) -> Result<WorkflowState, WorkflowError> {
        let effective_workflow_id = workflow_id.or_else(|| self.sessions.get_workflow_id());

        // Checked before any session id is minted: a failed start leaves no trace
        if effective_workflow_id.is_none() && !self.sessions.has_active_session() {
            return Err(WorkflowError::validation(
                "workflow_id is required for new session",
            ));
        }

        let state = self
            .execute(effective_workflow_id.clone(), None, context)
            .await?;

        if let Some(workflow_id) = &effective_workflow_id {
            self.sessions.save_workflow_id(workflow_id);
        }
        tracing::info!(
            session_id = %state.session_id,
            workflow_id = ?effective_workflow_id,
            current_state = %state.current_state,
            "Workflow session started"
        );
        Ok(state)
    }

    async fn send_event(
        &self,
        event_name: String,
        context: Context,
    ) -> Result<WorkflowState, WorkflowError> {
        tracing::debug!(
            event = %event_name,
            context_keys = context.len(),
            "Sending workflow event"
        );
        self.execute(self.sessions.get_workflow_id(), Some(event_name), context).await
    }

    async fn update_context(&self, context: Context) -> Result<WorkflowState, WorkflowError> {
        tracing::debug!(context_keys = context.len(), "Updating workflow context");
        self.execute(self.sessions.get_workflow_id(), None, context)
            .await
    }

    async fn health_check(&self) -> Result<String, WorkflowError> {
        self.api.health_check().await.map(|response| response.status)
    }

    fn observe_workflow_state(&self) -> watch::Receiver<Option<WorkflowState>> {
        self.state.subscribe()
    }

    fn current_state(&self) -> Option<WorkflowState> {
        self.state.borrow().clone()
    }

    fn current_session_id(&self) -> Option<String> {
        self.sessions.current_session_id()
    }

    fn current_workflow_id(&self) -> Option<String> {
        self.sessions.get_workflow_id()
    }

    fn clear_session(&self) {
        self.sessions.clear_session();
        self.state.send_replace(None);
        tracing::info!("Workflow session cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::ports::outbound::MockWorkflowApiPort;
    use flowpilot_domain::{ContextValue, StateModel, StateType};
    use flowpilot_shared::{SaveWorkflowResponse, WorkflowExecutionResponse};
    use serde_json::json;

    fn sessions() -> Arc<SessionStore> {
        Arc::new(SessionStore::new(Arc::new(InMemoryStorage::new())))
    }

    fn response(session_id: &str, state: &str, state_type: StateType) -> WorkflowExecutionResponse {
        WorkflowExecutionResponse {
            session_id: session_id.to_string(),
            context: json!({
                "__workflow_id": "wf-1",
                "__created_at": "2025-03-01T10:00:00Z",
                "profile": {"name": "Ann", "tags": ["a", "b"]},
                "age": 31
            })
            .as_object()
            .cloned()
            .unwrap_or_default(),
            current_state: state.to_string(),
            state_type,
            screen: None,
        }
    }

    #[tokio::test]
    async fn start_without_any_workflow_id_is_validation_error() {
        let mut api = MockWorkflowApiPort::new();
        api.expect_execute_workflow().times(0);
        let sessions = sessions();
        let repo = WorkflowSessionRepository::new(Arc::new(api), Arc::clone(&sessions));

        let result = repo.start_workflow(None).await;

        assert!(matches!(result, Err(WorkflowError::Validation(_))));
        assert!(!sessions.has_active_session());
        assert!(repo.current_state().is_none());
    }

    #[tokio::test]
    async fn start_sends_ids_and_adopts_server_session() {
        let mut api = MockWorkflowApiPort::new();
        api.expect_execute_workflow()
            .withf(|req| {
                req.client_workflow_id.as_deref() == Some("wf-1")
                    && req.event_name.is_none()
                    && !req.client_session_id.is_empty()
            })
            .times(1)
            .returning(|_| Ok(response("srv-7", "login", StateType::Screen)));

        let sessions = sessions();
        let repo = WorkflowSessionRepository::new(Arc::new(api), Arc::clone(&sessions));
        let mut observer = repo.observe_workflow_state();

        let state = repo.start_workflow(Some("wf-1".into())).await.unwrap();

        assert_eq!(state.session_id, "srv-7");
        assert_eq!(state.workflow_id, "wf-1");
        assert_eq!(state.created_at.as_deref(), Some("2025-03-01T10:00:00Z"));
        assert_eq!(sessions.current_session_id().as_deref(), Some("srv-7"));
        assert_eq!(sessions.get_workflow_id().as_deref(), Some("wf-1"));

        assert!(observer.has_changed().unwrap());
        let published = observer.borrow_and_update().clone();
        assert_eq!(published, Some(state));
    }

    #[tokio::test]
    async fn wire_context_is_narrowed_recursively() {
        let mut api = MockWorkflowApiPort::new();
        api.expect_execute_workflow()
            .returning(|_| Ok(response("s", "profile", StateType::Screen)));
        let repo = WorkflowSessionRepository::new(Arc::new(api), sessions());

        let state = repo.start_workflow(Some("wf-1".into())).await.unwrap();

        assert_eq!(state.context["age"], ContextValue::Integer(31));
        let profile = state.context["profile"].as_map().unwrap();
        assert_eq!(profile["name"].as_str(), Some("Ann"));
        assert_eq!(profile["tags"].as_list().map(<[ContextValue]>::len), Some(2));
        let visible: Vec<_> = state.visible_context().keys().cloned().collect();
        assert_eq!(visible, vec!["profile", "age"]);
    }

    #[tokio::test]
    async fn resume_is_allowed_with_active_session_only() {
        let mut api = MockWorkflowApiPort::new();
        api.expect_execute_workflow()
            .withf(|req| req.client_session_id == "existing" && req.client_workflow_id.is_none())
            .times(1)
            .returning(|_| Ok(response("existing", "step_2", StateType::Screen)));

        let sessions = sessions();
        sessions.update_session_id("existing");
        let repo = WorkflowSessionRepository::new(Arc::new(api), sessions);

        let state = repo.start_workflow(None).await.unwrap();
        assert_eq!(state.current_state, "step_2");
    }

    #[tokio::test]
    async fn send_event_carries_event_context_and_stored_workflow() {
        let mut api = MockWorkflowApiPort::new();
        api.expect_execute_workflow()
            .withf(|req| {
                req.event_name.as_deref() == Some("submit")
                    && req.client_workflow_id.as_deref() == Some("wf-1")
                    && req.context.get("email") == Some(&json!("a@b.c"))
                    && req.context.get("age") == Some(&json!(31))
            })
            .times(1)
            .returning(|_| Ok(response("s", "check_email", StateType::Technical)));

        let sessions = sessions();
        sessions.save_workflow_id("wf-1");
        let repo = WorkflowSessionRepository::new(Arc::new(api), sessions);

        let mut context = Context::new();
        context.insert("email".into(), "a@b.c".into());
        context.insert("age".into(), 31.into());

        let state = repo.send_event("submit".into(), context).await.unwrap();
        assert_eq!(state.state_type, StateType::Technical);
        assert!(state.screen.is_none());
    }

    #[tokio::test]
    async fn failure_keeps_previous_state() {
        let mut api = MockWorkflowApiPort::new();
        let mut seq = mockall::Sequence::new();
        api.expect_execute_workflow()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response("s", "login", StateType::Screen)));
        api.expect_execute_workflow()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(WorkflowError::SessionExpired));

        let repo = WorkflowSessionRepository::new(Arc::new(api), sessions());
        repo.start_workflow(Some("wf-1".into())).await.unwrap();

        let result = repo.update_context(Context::new()).await;

        assert_eq!(result, Err(WorkflowError::SessionExpired));
        assert_eq!(repo.current_state().unwrap().current_state, "login");
    }

    #[tokio::test]
    async fn error_sentinel_sets_error_flag() {
        let mut api = MockWorkflowApiPort::new();
        api.expect_execute_workflow()
            .returning(|_| Ok(response("s", "__error__", StateType::Service)));
        let repo = WorkflowSessionRepository::new(Arc::new(api), sessions());

        let state = repo.start_workflow(Some("wf-1".into())).await.unwrap();
        assert!(state.is_error);
    }

    #[tokio::test]
    async fn clear_session_publishes_none() {
        let mut api = MockWorkflowApiPort::new();
        api.expect_execute_workflow()
            .returning(|_| Ok(response("s", "login", StateType::Screen)));
        let sessions = sessions();
        let repo = WorkflowSessionRepository::new(Arc::new(api), Arc::clone(&sessions));
        repo.start_workflow(Some("wf-1".into())).await.unwrap();

        let mut observer = repo.observe_workflow_state();
        repo.clear_session();

        assert!(observer.has_changed().unwrap());
        assert!(observer.borrow_and_update().is_none());
        assert!(!sessions.has_active_session());
        assert_eq!(repo.current_session_id(), None);
    }

    #[tokio::test]
    async fn save_workflow_remembers_description_id() {
        let mut api = MockWorkflowApiPort::new();
        api.expect_save_workflow()
            .withf(|req| {
                req.states.states.len() == 1
                    && req.predefined_context["platform"] == json!("desktop")
            })
            .times(1)
            .returning(|_| {
                Ok(SaveWorkflowResponse {
                    status: "ok".into(),
                    wf_description_id: "wf-9".into(),
                    wf_context_id: "ctx-9".into(),
                })
            });
        let sessions = sessions();
        let repo = WorkflowSessionRepository::new(Arc::new(api), Arc::clone(&sessions));

        let mut predefined = Context::new();
        predefined.insert("platform".into(), "desktop".into());
        let states = StateSet {
            states: vec![StateModel::new("start", StateType::Screen).initial()],
        };

        let id = repo.save_workflow(states, predefined).await.unwrap();

        assert_eq!(id, "wf-9");
        assert_eq!(repo.current_workflow_id().as_deref(), Some("wf-9"));
    }
}

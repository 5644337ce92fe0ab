//! Request and response bodies for the workflow endpoints

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use flowpilot_domain::{ScreenData, StateSet, StateType};

/// Context as it travels on the wire: string keys, raw JSON values, wire order kept.
pub type WireContext = Map<String, Value>;

// =============================================================================
// Save
// =============================================================================

/// Body of `POST /workflow/save`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveWorkflowRequest {
    pub states: StateSet,
    #[serde(default)]
    pub predefined_context: WireContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveWorkflowResponse {
    pub status: String,
    /// Id to pass as `client_workflow_id` when starting a session
    pub wf_description_id: String,
    pub wf_context_id: String,
}

// =============================================================================
// Execute
// =============================================================================

/// Body of `POST /client/workflow`
///
/// Without `event_name` the server starts (or resumes) the session; with it,
/// the event is applied to the current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecutionRequest {
    pub client_session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_workflow_id: Option<String>,
    #[serde(default)]
    pub context: WireContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
}

impl WorkflowExecutionRequest {
    pub fn new(client_session_id: impl Into<String>) -> Self {
        Self {
            client_session_id: client_session_id.into(),
            client_workflow_id: None,
            context: WireContext::new(),
            event_name: None,
        }
    }

    pub fn with_workflow_id(mut self, workflow_id: Option<String>) -> Self {
        self.client_workflow_id = workflow_id;
        self
    }

    pub fn with_context(mut self, context: WireContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_event(mut self, event_name: impl Into<String>) -> Self {
        self.event_name = Some(event_name.into());
        self
    }

    pub fn is_event(&self) -> bool {
        self.event_name.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecutionResponse {
    /// Authoritative session id; may differ from the one the client sent
    pub session_id: String,
    #[serde(default)]
    pub context: WireContext,
    pub current_state: String,
    pub state_type: StateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<ScreenData>,
}

// =============================================================================
// Health
// =============================================================================

/// Body of `GET /healthcheck`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowpilot_domain::{StateModel, Transition};
    use serde_json::json;

    #[test]
    fn execution_request_omits_absent_optionals() {
        let request = WorkflowExecutionRequest::new("s-1");
        let wire = serde_json::to_value(&request).unwrap();

        assert_eq!(wire, json!({"client_session_id": "s-1", "context": {}}));
    }

    #[test]
    fn execution_request_carries_event_and_workflow() {
        let mut context = WireContext::new();
        context.insert("email".into(), json!("a@b.c"));

        let request = WorkflowExecutionRequest::new("s-1")
            .with_workflow_id(Some("wf-1".into()))
            .with_context(context)
            .with_event("submit");

        assert!(request.is_event());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "client_session_id": "s-1",
                "client_workflow_id": "wf-1",
                "context": {"email": "a@b.c"},
                "event_name": "submit"
            })
        );
    }

    #[test]
    fn execution_response_decodes_screen_state() {
        let response: WorkflowExecutionResponse = serde_json::from_value(json!({
            "session_id": "srv-9",
            "context": {"__workflow_id": "wf-1", "step": 1},
            "current_state": "login",
            "state_type": "screen",
            "screen": {"title": "Sign in"}
        }))
        .unwrap();

        assert_eq!(response.session_id, "srv-9");
        assert_eq!(response.state_type, StateType::Screen);
        assert_eq!(response.screen.unwrap().title.as_deref(), Some("Sign in"));
        let keys: Vec<_> = response.context.keys().cloned().collect();
        assert_eq!(keys, vec!["__workflow_id", "step"]);
    }

    #[test]
    fn execution_response_rejects_unknown_state_type() {
        let result = serde_json::from_value::<WorkflowExecutionResponse>(json!({
            "session_id": "s",
            "context": {},
            "current_state": "x",
            "state_type": "quantum"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn save_request_uses_server_field_names() {
        let states = StateSet {
            states: vec![StateModel::new("start", StateType::Screen)
                .initial()
                .with_transition(Transition::on_event("next", "done"))],
        };
        let request = SaveWorkflowRequest {
            states,
            predefined_context: WireContext::new(),
        };

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["states"]["states"][0]["name"], json!("start"));
        assert_eq!(
            wire["states"]["states"][0]["transitions"][0]["event_name"],
            json!("next")
        );
        assert_eq!(wire["predefined_context"], json!({}));

        let response: SaveWorkflowResponse = serde_json::from_value(json!({
            "status": "ok",
            "wf_description_id": "wf-1",
            "wf_context_id": "ctx-1"
        }))
        .unwrap();
        assert_eq!(response.wf_description_id, "wf-1");
    }
}

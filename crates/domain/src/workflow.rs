//! Workflow FSM vocabulary
//!
//! Definition side (`StateSet` and friends) is what gets saved to the server;
//! runtime side (`WorkflowState`, `ScreenData`) is what comes back from execution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Context;

/// Context key holding the server-side workflow id
pub const WORKFLOW_ID_KEY: &str = "__workflow_id";
/// Context key holding the session creation timestamp
pub const CREATED_AT_KEY: &str = "__created_at";
/// Service state the server enters when a step fails
pub const ERROR_STATE: &str = "__error__";
/// Service state a fresh session starts in
pub const INIT_STATE: &str = "__init__";
/// Prefix marking internal context keys
pub const RESERVED_PREFIX: &str = "__";

// =============================================================================
// State types
// =============================================================================

/// Classification of an FSM state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    /// Server evaluates expressions over context, then moves on by itself
    Technical,
    /// Server calls an external API, then moves on by itself
    Integration,
    /// Carries renderable `ScreenData`; waits for a user event
    Screen,
    /// System states such as `__init__`, `__error__` and completion markers
    Service,
}

impl StateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Integration => "integration",
            Self::Screen => "screen",
            Self::Service => "service",
        }
    }

    /// The client shows a loading indicator while in these states.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Technical | Self::Integration)
    }

    /// Only screen states are presented as interactive.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Screen)
    }
}

impl std::fmt::Display for StateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Workflow definition
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSet {
    pub states: Vec<StateModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateModel {
    pub state_type: StateType,
    pub name: String,
    #[serde(default)]
    pub transitions: Vec<Transition>,
    #[serde(default)]
    pub expressions: Vec<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_config: Option<IntegrationConfig>,
    #[serde(default)]
    pub initial_state: bool,
    #[serde(default)]
    pub final_state: bool,
}

impl StateModel {
    pub fn new(name: impl Into<String>, state_type: StateType) -> Self {
        Self {
            state_type,
            name: name.into(),
            transitions: Vec::new(),
            expressions: Vec::new(),
            integration_config: None,
            initial_state: false,
            final_state: false,
        }
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn with_expression(mut self, expression: Expression) -> Self {
        self.expressions.push(expression);
        self
    }

    pub fn with_integration(mut self, config: IntegrationConfig) -> Self {
        self.integration_config = Some(config);
        self
    }

    pub fn initial(mut self) -> Self {
        self.initial_state = true;
        self
    }

    pub fn terminal(mut self) -> Self {
        self.final_state = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub target_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
}

impl Transition {
    /// Unconditional transition, taken automatically
    pub fn to(target_state: impl Into<String>) -> Self {
        Self {
            target_state: target_state.into(),
            condition: None,
            event_name: None,
        }
    }

    /// Transition taken when the client sends `event_name`
    pub fn on_event(event_name: impl Into<String>, target_state: impl Into<String>) -> Self {
        Self {
            target_state: target_state.into(),
            condition: None,
            event_name: Some(event_name.into()),
        }
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// Server-evaluated assignment `variable = expression`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    pub variable: String,
    #[serde(default)]
    pub dependent_variables: Vec<String>,
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub variable: String,
    pub url: String,
    #[serde(default)]
    pub params: HashMap<String, String>,
    #[serde(default = "default_integration_method")]
    pub method: String,
}

fn default_integration_method() -> String {
    "get".to_string()
}

// =============================================================================
// Screen data (payload of screen states)
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<ButtonData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ComponentData>>,
}

/// Input field. `field_type` is one of text, email, password, number, date, phone, checkbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldData {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkData>,
}

/// Server-supplied validation hints. The client displays them, it does not enforce business rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkData {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonData {
    pub id: String,
    pub label: String,
    /// Event sent to the workflow when pressed
    pub event: String,
    #[serde(default = "default_button_style")]
    pub style: String,
    /// Enable condition, may contain `{{variables}}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<String>,
}

fn default_button_style() -> String {
    "primary".to_string()
}

/// Informational component: text, card_list, status_badge, progress_bar, conditional, image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentData {
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<CardItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_map: Option<HashMap<String, StatusStyle>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_true: Option<Box<ComponentData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_false: Option<Box<ComponentData>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default)]
    pub highlighted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionData>,
}

/// Workflow event attached to a card, with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionData {
    pub event: String,
    #[serde(default)]
    pub params: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusStyle {
    pub label: String,
    pub color: String,
}

// =============================================================================
// Runtime state
// =============================================================================

/// Client snapshot of one workflow session after a server call.
///
/// Replaced wholesale after every call; never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowState {
    pub session_id: String,
    /// Taken from `__workflow_id` in context, empty when absent
    pub workflow_id: String,
    pub current_state: String,
    pub state_type: StateType,
    pub context: Context,
    /// Present only for `StateType::Screen`
    pub screen: Option<ScreenData>,
    /// Taken from `__created_at` in context
    pub created_at: Option<String>,
    pub is_error: bool,
}

impl WorkflowState {
    /// Build a snapshot from a server response, deriving the reserved-key fields.
    pub fn new(
        session_id: impl Into<String>,
        current_state: impl Into<String>,
        state_type: StateType,
        context: Context,
        screen: Option<ScreenData>,
    ) -> Self {
        let current_state = current_state.into();
        let workflow_id = context
            .get(WORKFLOW_ID_KEY)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let created_at = context
            .get(CREATED_AT_KEY)
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let is_error = current_state == ERROR_STATE;
        let screen = screen.filter(|_| state_type == StateType::Screen);

        Self {
            session_id: session_id.into(),
            workflow_id,
            current_state,
            state_type,
            context,
            screen,
            created_at,
            is_error,
        }
    }

    /// Whether the flow reached the given completion state.
    ///
    /// `Service` alone does not tell success from failure, so completion is
    /// detected by the state's literal name.
    pub fn is_completed(&self, completion_state: &str) -> bool {
        !self.is_error && self.current_state == completion_state
    }

    pub fn visible_context(&self) -> Context {
        filter_user_visible_context(&self.context)
    }
}

/// Drop internal `__`-prefixed keys, keeping the order of the rest.
pub fn filter_user_visible_context(context: &Context) -> Context {
    context
        .iter()
        .filter(|(key, _)| !key.starts_with(RESERVED_PREFIX))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{context_from_json, ContextValue};
    use serde_json::json;

    fn server_context() -> Context {
        let wire = json!({
            "__workflow_id": "wf-1",
            "__created_at": "2025-03-01T10:00:00Z",
            "email": "a@b.c",
            "attempts": 2
        });
        context_from_json(wire.as_object().unwrap())
    }

    #[test]
    fn state_type_uses_lowercase_wire_tokens() {
        for (state_type, token) in [
            (StateType::Technical, "technical"),
            (StateType::Integration, "integration"),
            (StateType::Screen, "screen"),
            (StateType::Service, "service"),
        ] {
            assert_eq!(serde_json::to_value(state_type).unwrap(), json!(token));
            let back: StateType = serde_json::from_value(json!(token)).unwrap();
            assert_eq!(back, state_type);
        }
        assert!(serde_json::from_value::<StateType>(json!("SCREEN")).is_err());
    }

    #[test]
    fn state_type_classification() {
        assert!(StateType::Technical.is_transient());
        assert!(StateType::Integration.is_transient());
        assert!(!StateType::Screen.is_transient());
        assert!(StateType::Screen.is_interactive());
        assert!(!StateType::Service.is_interactive());
    }

    #[test]
    fn filter_keeps_only_user_keys() {
        let visible = filter_user_visible_context(&server_context());
        let keys: Vec<_> = visible.keys().cloned().collect();
        assert_eq!(keys, vec!["email", "attempts"]);
    }

    #[test]
    fn new_extracts_reserved_keys() {
        let state = WorkflowState::new("s-1", "login", StateType::Screen, server_context(), None);

        assert_eq!(state.workflow_id, "wf-1");
        assert_eq!(state.created_at.as_deref(), Some("2025-03-01T10:00:00Z"));
        assert!(!state.is_error);
        assert_eq!(state.context["attempts"], ContextValue::Integer(2));
    }

    #[test]
    fn missing_workflow_id_is_empty() {
        let state = WorkflowState::new("s-1", "login", StateType::Screen, Context::new(), None);
        assert_eq!(state.workflow_id, "");
        assert!(state.created_at.is_none());
    }

    #[test]
    fn error_flag_tracks_error_sentinel_only() {
        let error = WorkflowState::new("s", ERROR_STATE, StateType::Service, Context::new(), None);
        assert!(error.is_error);
        assert!(!error.is_completed(ERROR_STATE));

        let done = WorkflowState::new("s", "done", StateType::Service, Context::new(), None);
        assert!(!done.is_error);
        assert!(done.is_completed("done"));

        let init = WorkflowState::new("s", INIT_STATE, StateType::Service, Context::new(), None);
        assert!(!init.is_error);
        assert!(!init.is_completed("done"));
    }

    #[test]
    fn screen_only_kept_for_screen_states() {
        let screen = ScreenData {
            title: Some("Login".into()),
            ..ScreenData::default()
        };
        let shown = WorkflowState::new(
            "s",
            "login",
            StateType::Screen,
            Context::new(),
            Some(screen.clone()),
        );
        assert_eq!(shown.screen, Some(screen.clone()));

        let dropped =
            WorkflowState::new("s", "check", StateType::Technical, Context::new(), Some(screen));
        assert!(dropped.screen.is_none());
    }

    #[test]
    fn screen_data_decodes_with_defaults_and_ignores_unknown_fields() {
        let screen: ScreenData = serde_json::from_value(json!({
            "title": "Sign in",
            "fields": [{
                "id": "email",
                "type": "email",
                "label": "Email",
                "validation": {"minLength": 3, "errorMessage": "Too short"},
                "unexpected": true
            }],
            "buttons": [{"id": "next", "label": "Next", "event": "submit"}],
            "components": [{
                "type": "conditional",
                "condition": "{{vip}}",
                "ifTrue": {"type": "text", "content": "Welcome back"},
                "statusMap": {"ok": {"label": "OK", "color": "green"}}
            }]
        }))
        .unwrap();

        let field = &screen.fields.as_ref().unwrap()[0];
        assert!(!field.required);
        let validation = field.validation.as_ref().unwrap();
        assert_eq!(validation.min_length, Some(3));
        assert_eq!(validation.error_message.as_deref(), Some("Too short"));

        assert_eq!(screen.buttons.as_ref().unwrap()[0].style, "primary");

        let component = &screen.components.as_ref().unwrap()[0];
        assert_eq!(
            component.if_true.as_ref().unwrap().content.as_deref(),
            Some("Welcome back")
        );
        assert_eq!(component.status_map.as_ref().unwrap()["ok"].color, "green");
    }

    #[test]
    fn state_model_serializes_with_snake_case_keys() {
        let model = StateModel::new("check_age", StateType::Technical)
            .initial()
            .with_expression(Expression {
                variable: "adult".into(),
                dependent_variables: vec!["age".into()],
                expression: "age >= 18".into(),
            })
            .with_transition(Transition::to("welcome").when("adult"));

        let wire = serde_json::to_value(&model).unwrap();
        assert_eq!(wire["state_type"], json!("technical"));
        assert_eq!(wire["initial_state"], json!(true));
        assert_eq!(wire["expressions"][0]["dependent_variables"], json!(["age"]));
        assert_eq!(wire["transitions"][0]["target_state"], json!("welcome"));
        assert!(wire.get("integration_config").is_none());
    }

    #[test]
    fn integration_method_defaults_to_get() {
        let config: IntegrationConfig =
            serde_json::from_value(json!({"variable": "rates", "url": "https://api/rates"}))
                .unwrap();
        assert_eq!(config.method, "get");
        assert!(config.params.is_empty());
    }
}

//! FlowPilot Domain - the render-agnostic object model of a server-driven client.
//!
//! This crate holds everything the client needs to *understand* the server without
//! doing any I/O itself:
//! - Screen schema trees (`ScreenSchema`, `SchemaNode`)
//! - UI actions and their JSON parser (`UiAction`, `parse_action`)
//! - Workflow FSM vocabulary (`StateType`, `ScreenData`, `StateSet`, `WorkflowState`)
//! - Dynamic context values and their JSON conversion (`ContextValue`, `Context`)
//! - The workflow error taxonomy (`WorkflowError`)

pub mod action;
pub mod action_parser;
pub mod context;
pub mod error;
pub mod schema;
pub mod workflow;

pub use action::{
    ApiCall, Batch, Navigate, NavigateExternal, SetState, Share, ShowDialog, ShowSnackbar,
    ToggleState, UiAction,
};
pub use action_parser::parse_action;
pub use context::{context_from_json, context_to_json, Context, ContextValue};
pub use error::{ErrorCategory, RecoveryAction, WorkflowError};
pub use schema::{
    DocumentMeta, JsonObject, Position, SchemaNode, ScreenDefinition, ScreenSchema,
    ScreenSections, FALLBACK_NODE_TYPE,
};
pub use workflow::{
    filter_user_visible_context, ActionData, ButtonData, CardItem, ComponentData, Expression,
    FieldData, IntegrationConfig, LinkData, ScreenData, StateModel, StateSet, StateType,
    StatusStyle, Transition, ValidationConfig, WorkflowState, CREATED_AT_KEY, ERROR_STATE,
    INIT_STATE, RESERVED_PREFIX, WORKFLOW_ID_KEY,
};

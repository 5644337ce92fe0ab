//! FlowPilot Shared - wire contract with the workflow server
//!
//! This crate contains the JSON request/response bodies exchanged over HTTP and
//! the endpoint paths they travel on. Field names are fixed by the server.
//!
//! # Design Principles
//!
//! 1. **No business logic** - Pure data types and serialization
//! 2. **Wire context stays JSON** - DTOs carry `serde_json` maps; conversion to
//!    native context values happens in the client
//! 3. **Vocabulary from domain** - `StateSet`, `StateType`, `ScreenData` are reused as-is

pub mod api;
pub mod paths;

pub use api::{
    HealthCheckResponse, SaveWorkflowRequest, SaveWorkflowResponse, WireContext,
    WorkflowExecutionRequest, WorkflowExecutionResponse,
};
pub use paths::{
    screen_url, HEALTHCHECK_PATH, SCREENS_SEGMENT, WORKFLOW_EXECUTE_PATH, WORKFLOW_SAVE_PATH,
};

//! Workflow server transport port
//!
//! Stateless request/response mapping to the save, execute and healthcheck
//! endpoints. Implementations map every transport failure into `WorkflowError`.

use async_trait::async_trait;

use flowpilot_domain::WorkflowError;
use flowpilot_shared::{
    HealthCheckResponse, SaveWorkflowRequest, SaveWorkflowResponse, WorkflowExecutionRequest,
    WorkflowExecutionResponse,
};

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait WorkflowApiPort: Send + Sync {
    /// `POST /workflow/save`
    async fn save_workflow(
        &self,
        request: SaveWorkflowRequest,
    ) -> Result<SaveWorkflowResponse, WorkflowError>;

    /// `POST /client/workflow` - start a session or apply an event
    async fn execute_workflow(
        &self,
        request: WorkflowExecutionRequest,
    ) -> Result<WorkflowExecutionResponse, WorkflowError>;

    /// `GET /healthcheck`
    async fn health_check(&self) -> Result<HealthCheckResponse, WorkflowError>;
}

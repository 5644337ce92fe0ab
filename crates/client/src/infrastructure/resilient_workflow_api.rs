//! Resilient workflow API wrapper with exponential backoff retry
//!
//! Wraps any `WorkflowApiPort` and retries transient failures (network errors
//! and 5xx). Event requests are sent once: the server may already have applied
//! the event when the response was lost, and replaying it could advance the
//! flow twice.

use async_trait::async_trait;
use std::sync::Arc;

use flowpilot_domain::WorkflowError;
use flowpilot_shared::{
    HealthCheckResponse, SaveWorkflowRequest, SaveWorkflowResponse, WorkflowExecutionRequest,
    WorkflowExecutionResponse,
};

use crate::application::services::retry::{retry_io_if, RetryPolicy};
use crate::ports::outbound::WorkflowApiPort;

/// Wrapper that adds retry logic to any workflow transport
pub struct RetryingWorkflowApi {
    inner: Arc<dyn WorkflowApiPort>,
    policy: RetryPolicy,
}

impl RetryingWorkflowApi {
    pub fn new(inner: Arc<dyn WorkflowApiPort>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl WorkflowApiPort for RetryingWorkflowApi {
    async fn save_workflow(
        &self,
        request: SaveWorkflowRequest,
    ) -> Result<SaveWorkflowResponse, WorkflowError> {
        retry_io_if(&self.policy, WorkflowError::is_retryable, || {
            self.inner.save_workflow(request.clone())
        })
        .await
    }

    async fn execute_workflow(
        &self,
        request: WorkflowExecutionRequest,
    ) -> Result<WorkflowExecutionResponse, WorkflowError> {
        if request.is_event() {
            return self.inner.execute_workflow(request).await;
        }
        retry_io_if(&self.policy, WorkflowError::is_retryable, || {
            self.inner.execute_workflow(request.clone())
        })
        .await
    }

    async fn health_check(&self) -> Result<HealthCheckResponse, WorkflowError> {
        retry_io_if(&self.policy, WorkflowError::is_retryable, || {
            self.inner.health_check()
        })
        .await
    }
}

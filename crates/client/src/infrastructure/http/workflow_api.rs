//! reqwest transport for the workflow endpoints

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use flowpilot_domain::WorkflowError;
use flowpilot_shared::{
    HealthCheckResponse, SaveWorkflowRequest, SaveWorkflowResponse, WorkflowExecutionRequest,
    WorkflowExecutionResponse, HEALTHCHECK_PATH, WORKFLOW_EXECUTE_PATH, WORKFLOW_SAVE_PATH,
};

use super::{build_client, join_url, status_error, transport_error, HttpTimeouts};
use crate::ports::outbound::WorkflowApiPort;

/// Client for the workflow server's JSON API
#[derive(Clone)]
pub struct HttpWorkflowApi {
    client: Client,
    base_url: String,
}

impl HttpWorkflowApi {
    /// Fails only when the HTTP client cannot be built with `timeouts`.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, WorkflowError> {
        Ok(Self {
            client: build_client(timeouts).map_err(transport_error)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl WorkflowApiPort for HttpWorkflowApi {
    async fn save_workflow(
        &self,
        request: SaveWorkflowRequest,
    ) -> Result<SaveWorkflowResponse, WorkflowError> {
        tracing::debug!(
            states = request.states.states.len(),
            context_keys = request.predefined_context.len(),
            "POST {}",
            WORKFLOW_SAVE_PATH
        );
        let response = self
            .client
            .post(join_url(&self.base_url, WORKFLOW_SAVE_PATH))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    async fn execute_workflow(
        &self,
        request: WorkflowExecutionRequest,
    ) -> Result<WorkflowExecutionResponse, WorkflowError> {
        tracing::debug!(
            session_id = %request.client_session_id,
            workflow_id = ?request.client_workflow_id,
            event = ?request.event_name,
            context_keys = request.context.len(),
            "POST {}",
            WORKFLOW_EXECUTE_PATH
        );
        let response = self
            .client
            .post(join_url(&self.base_url, WORKFLOW_EXECUTE_PATH))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let body: WorkflowExecutionResponse = decode(response).await?;
        tracing::debug!(
            session_id = %body.session_id,
            current_state = %body.current_state,
            state_type = %body.state_type,
            "Workflow step received"
        );
        Ok(body)
    }

    async fn health_check(&self) -> Result<HealthCheckResponse, WorkflowError> {
        let response = self
            .client
            .get(join_url(&self.base_url, HEALTHCHECK_PATH))
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }
}

/// Check the status, then decode the body as `T`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, WorkflowError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "Workflow server returned error status");
        return Err(status_error(status.as_u16(), &body));
    }

    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| WorkflowError::parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let api = HttpWorkflowApi::new("http://localhost:8000/", HttpTimeouts::default()).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let api = HttpWorkflowApi::new("http://127.0.0.1:9", HttpTimeouts::default()).unwrap();
        let result = api.health_check().await;
        assert!(matches!(result, Err(WorkflowError::Network(_))), "{result:?}");
    }
}

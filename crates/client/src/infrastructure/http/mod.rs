//! HTTP adapters for the workflow server and the screen endpoint
//!
//! Every reqwest failure is classified here, at the transport boundary, so
//! nothing above this module sees a raw `reqwest::Error`.

mod screen_source;
mod workflow_api;

pub use screen_source::HttpScreenSource;
pub use workflow_api::HttpWorkflowApi;

use reqwest::Client;
use std::time::Duration;

use flowpilot_domain::WorkflowError;

/// Default connect timeout in milliseconds
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Default whole-request timeout in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

/// Longest server error body carried into an error message
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Transport timeouts, enforced by the HTTP client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            request: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

/// Client with `timeouts` applied; never falls back to an unbounded client.
pub(crate) fn build_client(timeouts: HttpTimeouts) -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.request)
        .build()
        .inspect_err(|e| tracing::error!(error = %e, "Failed to build HTTP client"))
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Map a non-2xx status into the workflow error taxonomy.
pub fn status_error(code: u16, body: &str) -> WorkflowError {
    let message = error_message(code, body);
    match code {
        400 | 422 => WorkflowError::validation(message),
        401 | 403 | 410 => WorkflowError::SessionExpired,
        _ => WorkflowError::server(code, message),
    }
}

/// Map a reqwest failure into the workflow error taxonomy.
pub(crate) fn transport_error(error: reqwest::Error) -> WorkflowError {
    if error.is_decode() {
        WorkflowError::parse(error.to_string())
    } else if let Some(status) = error.status() {
        status_error(status.as_u16(), "")
    } else if error.is_timeout() || error.is_connect() || error.is_request() || error.is_body() {
        WorkflowError::network(error.to_string())
    } else {
        WorkflowError::unknown(error.to_string())
    }
}

fn error_message(code: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return reqwest::StatusCode::from_u16(code)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unexpected status")
            .to_string();
    }
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

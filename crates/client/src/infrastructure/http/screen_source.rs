//! reqwest source for screen schemas

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use flowpilot_domain::ScreenSchema;
use flowpilot_shared::screen_url;

use super::{build_client, HttpTimeouts};
use crate::ports::outbound::{ScreenFetchError, ScreenSource};

/// Fetches `GET {base_url}/screens/{id}`
#[derive(Clone)]
pub struct HttpScreenSource {
    client: Client,
    base_url: Url,
}

impl HttpScreenSource {
    /// Fails when `base_url` cannot carry a path or the client cannot be built.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ScreenFetchError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ScreenFetchError::Parse(format!("invalid screens URL: {base_url}")))?;
        let client =
            build_client(timeouts).map_err(|e| ScreenFetchError::Network(e.to_string()))?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl ScreenSource for HttpScreenSource {
    async fn fetch_screen(&self, screen_id: &str) -> Result<ScreenSchema, ScreenFetchError> {
        let url = screen_url(&self.base_url, screen_id).ok_or_else(|| {
            ScreenFetchError::Parse(format!("invalid screens URL: {}", self.base_url))
        })?;
        tracing::debug!(screen_id = %screen_id, "GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScreenFetchError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(ScreenFetchError::NotFound(screen_id.to_string())),
            status if !status.is_success() => {
                return Err(ScreenFetchError::Status(status.as_u16()))
            }
            _ => {}
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ScreenFetchError::Network(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ScreenFetchError::Parse(e.to_string()))
    }
}

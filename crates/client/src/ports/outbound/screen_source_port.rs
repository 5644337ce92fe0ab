//! Screen schema source port

use async_trait::async_trait;

use flowpilot_domain::ScreenSchema;

/// Failure to obtain a screen schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScreenFetchError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Screen endpoint returned status {0}")]
    Status(u16),
    #[error("Invalid screen schema: {0}")]
    Parse(String),
    #[error("Screen not found: {0}")]
    NotFound(String),
    #[error("Screen source panicked: {0}")]
    Panicked(String),
}

impl ScreenFetchError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status(code) => *code >= 500,
            Self::Parse(_) | Self::NotFound(_) | Self::Panicked(_) => false,
        }
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ScreenSource: Send + Sync {
    async fn fetch_screen(&self, screen_id: &str) -> Result<ScreenSchema, ScreenFetchError>;
}

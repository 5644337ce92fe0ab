//! Workflow error taxonomy
//!
//! Every failure that crosses the transport boundary is mapped into one of these
//! variants, so the presentation layer never sees raw HTTP or decode errors.

use thiserror::Error;

/// Unified error type for workflow and transport operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Transport-level I/O failure (connect, timeout, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with a non-2xx status
    #[error("Server error ({code}): {message}")]
    Server { code: u16, message: String },

    /// A local precondition is missing, or the server rejected the request body
    #[error("Validation error: {0}")]
    Validation(String),

    /// The server no longer recognizes the session
    #[error("Workflow session expired")]
    SessionExpired,

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Anything uncategorized
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl WorkflowError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn server(code: u16, msg: impl Into<String>) -> Self {
        Self::Server {
            code,
            message: msg.into(),
        }
    }

    /// Creates a validation error for a missing local precondition.
    ///
    /// # Example
    /// ```ignore
    /// if workflow_id.is_none() && !sessions.has_active_session() {
    ///     return Err(WorkflowError::validation("workflow_id is required for new session"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Message category used to pick user-facing copy and a recovery action.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) => ErrorCategory::Network,
            Self::Server { .. } => ErrorCategory::Server,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::SessionExpired => ErrorCategory::Session,
            Self::Parse(_) => ErrorCategory::Parse,
            Self::Unknown(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether repeating the same request may succeed.
    ///
    /// Network failures and 5xx responses are transient; everything else
    /// will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { code, .. } => *code >= 500,
            _ => false,
        }
    }
}

/// Coarse error category for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Network,
    Server,
    Session,
    Validation,
    Parse,
    Unknown,
}

/// What the user can do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryAction {
    /// Repeat the same request
    Retry,
    /// Sign in again before continuing
    Reauthenticate,
    /// Abandon the session and start the flow from the beginning
    RestartFlow,
    /// Nothing to do beyond acknowledging the message
    Dismiss,
}

impl ErrorCategory {
    /// Non-technical message shown to the user. Each category has its own copy.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network => "Connection problem. Check your internet connection and try again.",
            Self::Server => "The service is temporarily unavailable. Please try again later.",
            Self::Session => "Your session has expired. Please sign in again.",
            Self::Validation => {
                "Some information is missing or incorrect. Please review and try again."
            }
            Self::Parse => "We received an unexpected response. Please restart and try again.",
            Self::Unknown => "Something went wrong. Please try again.",
        }
    }

    pub fn recovery(&self) -> RecoveryAction {
        match self {
            Self::Network | Self::Server | Self::Unknown => RecoveryAction::Retry,
            Self::Session => RecoveryAction::Reauthenticate,
            Self::Parse => RecoveryAction::RestartFlow,
            Self::Validation => RecoveryAction::Dismiss,
        }
    }
}

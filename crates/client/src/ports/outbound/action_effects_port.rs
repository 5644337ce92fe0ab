//! Side effects an action dispatcher can trigger
//!
//! The dispatcher decides *what* to do; implementations of this port (a screen
//! controller, a UI shell) decide *how*. None of these perform HTTP I/O on the
//! dispatcher's behalf except `api_call`, which is the injected API invoker.

use async_trait::async_trait;

use flowpilot_domain::{ApiCall, Share, ShowDialog, ShowSnackbar};

/// Failure of a dispatched action
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Action callback failed: {0}")]
    Callback(String),
    #[error("API call failed: {0}")]
    Api(String),
    #[error("Action handler panicked: {0}")]
    Panicked(String),
}

pub type DispatchResult = Result<(), DispatchError>;

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ActionEffects: Send + Sync {
    fn navigate(&self, screen_id: &str, clear_stack: bool) -> DispatchResult;

    fn navigate_back(&self) -> DispatchResult;

    fn open_external(&self, url: &str) -> DispatchResult;

    fn show_snackbar(&self, snackbar: &ShowSnackbar) -> DispatchResult;

    fn show_dialog(&self, dialog: &ShowDialog) -> DispatchResult;

    /// Reload the current screen
    fn refresh(&self) -> DispatchResult;

    fn share(&self, share: &Share) -> DispatchResult;

    async fn api_call(&self, call: &ApiCall) -> DispatchResult;
}

//! UI actions
//!
//! A closed set of user intents a schema node or server response can carry.
//! Payload structs are `#[non_exhaustive]`: outside this crate they are only
//! produced by [`crate::parse_action`].

use crate::schema::JsonObject;

/// A parsed, typed user intent.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Navigate(Navigate),
    NavigateBack,
    NavigateExternal(NavigateExternal),
    ApiCall(ApiCall),
    SetState(SetState),
    ToggleState(ToggleState),
    ShowSnackbar(ShowSnackbar),
    ShowDialog(ShowDialog),
    Refresh,
    Share(Share),
    Batch(Batch),
}

impl UiAction {
    /// Short lowercase tag, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Navigate(_) => "navigate",
            Self::NavigateBack => "navigate_back",
            Self::NavigateExternal(_) => "navigate_external",
            Self::ApiCall(_) => "api_call",
            Self::SetState(_) => "set_state",
            Self::ToggleState(_) => "toggle_state",
            Self::ShowSnackbar(_) => "show_snackbar",
            Self::ShowDialog(_) => "show_dialog",
            Self::Refresh => "refresh",
            Self::Share(_) => "share",
            Self::Batch(_) => "batch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Navigate {
    pub screen_id: String,
    /// Drop the navigation history before showing the target
    pub clear_stack: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct NavigateExternal {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct ApiCall {
    pub endpoint: String,
    /// Uppercased HTTP method, `GET` when absent
    pub method: String,
    pub body: Option<JsonObject>,
    pub on_success: Option<String>,
    pub on_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct SetState {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ToggleState {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ShowSnackbar {
    pub message: String,
    /// Display time in milliseconds
    pub duration: Option<u64>,
    pub action_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ShowDialog {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: Option<String>,
    pub on_confirm: Option<String>,
    pub on_cancel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Share {
    pub text: String,
    pub url: Option<String>,
}

/// Ordered actions, run one after another. Never empty.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Batch {
    pub actions: Vec<UiAction>,
}

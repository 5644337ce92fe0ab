//! JSON → [`UiAction`] parser
//!
//! Parsing never fails loudly: an unknown `type`, a missing required field, or a
//! malformed value yields `None`, and the caller simply does not run anything.
//!
//! ```json
//! { "type": "navigate", "screenId": "details", "clearStack": false }
//! ```

use serde_json::Value;

use crate::action::{
    ApiCall, Batch, Navigate, NavigateExternal, SetState, Share, ShowDialog, ShowSnackbar,
    ToggleState, UiAction,
};
use crate::schema::JsonObject;

const DEFAULT_METHOD: &str = "GET";
const DEFAULT_CONFIRM_LABEL: &str = "OK";

/// Parse an action definition. Returns `None` for anything that is not a valid action.
pub fn parse_action(json: &Value) -> Option<UiAction> {
    let obj = json.as_object()?;
    let kind = text(obj, "type")?.to_lowercase();

    match kind.as_str() {
        "navigate" => parse_navigate(obj),
        "navigate_back" | "navigateback" | "back" => Some(UiAction::NavigateBack),
        "navigate_external" | "navigateexternal" | "open_url" => parse_navigate_external(obj),
        "api_call" | "apicall" | "fetch" => parse_api_call(obj),
        "set_state" | "setstate" | "update" => parse_set_state(obj),
        "toggle_state" | "togglestate" | "toggle" => parse_toggle_state(obj),
        "show_snackbar" | "showsnackbar" | "snackbar" => parse_show_snackbar(obj),
        "show_dialog" | "showdialog" | "dialog" => parse_show_dialog(obj),
        "refresh" | "reload" => Some(UiAction::Refresh),
        "share" => parse_share(obj),
        "batch" | "sequence" => parse_batch(obj),
        _ => None,
    }
}

fn parse_navigate(obj: &JsonObject) -> Option<UiAction> {
    let screen_id = text(obj, "screenId").or_else(|| text(obj, "target"))?;
    Some(UiAction::Navigate(Navigate {
        screen_id,
        clear_stack: flag(obj, "clearStack"),
    }))
}

fn parse_navigate_external(obj: &JsonObject) -> Option<UiAction> {
    Some(UiAction::NavigateExternal(NavigateExternal {
        url: text(obj, "url")?,
    }))
}

fn parse_api_call(obj: &JsonObject) -> Option<UiAction> {
    let endpoint = text(obj, "endpoint")?;
    let method = text(obj, "method")
        .map(|m| m.to_uppercase())
        .unwrap_or_else(|| DEFAULT_METHOD.to_string());
    let body = obj.get("body").and_then(Value::as_object).cloned();

    Some(UiAction::ApiCall(ApiCall {
        endpoint,
        method,
        body,
        on_success: text(obj, "onSuccess"),
        on_error: text(obj, "onError"),
    }))
}

fn parse_set_state(obj: &JsonObject) -> Option<UiAction> {
    let key = text(obj, "key")?;
    // Structured values are kept as their JSON text
    let value = match obj.get("value") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    Some(UiAction::SetState(SetState { key, value }))
}

fn parse_toggle_state(obj: &JsonObject) -> Option<UiAction> {
    Some(UiAction::ToggleState(ToggleState {
        key: text(obj, "key")?,
    }))
}

fn parse_show_snackbar(obj: &JsonObject) -> Option<UiAction> {
    let message = text(obj, "message")?;
    let duration = match obj.get("duration") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    Some(UiAction::ShowSnackbar(ShowSnackbar {
        message,
        duration,
        action_label: text(obj, "actionLabel"),
    }))
}

fn parse_show_dialog(obj: &JsonObject) -> Option<UiAction> {
    let message = text(obj, "message")?;
    Some(UiAction::ShowDialog(ShowDialog {
        title: text(obj, "title").unwrap_or_default(),
        message,
        confirm_label: text(obj, "confirmLabel")
            .unwrap_or_else(|| DEFAULT_CONFIRM_LABEL.to_string()),
        cancel_label: text(obj, "cancelLabel"),
        on_confirm: text(obj, "onConfirm"),
        on_cancel: text(obj, "onCancel"),
    }))
}

fn parse_share(obj: &JsonObject) -> Option<UiAction> {
    Some(UiAction::Share(Share {
        text: text(obj, "text")?,
        url: text(obj, "url"),
    }))
}

fn parse_batch(obj: &JsonObject) -> Option<UiAction> {
    let actions: Vec<UiAction> = obj
        .get("actions")?
        .as_array()?
        .iter()
        .filter_map(parse_action)
        .collect();

    if actions.is_empty() {
        None
    } else {
        Some(UiAction::Batch(Batch { actions }))
    }
}

/// Scalar field as text. Null, objects and arrays count as missing.
fn text(obj: &JsonObject, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn flag(obj: &JsonObject, key: &str) -> bool {
    match obj.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

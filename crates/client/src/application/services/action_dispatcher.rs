//! Action dispatcher
//!
//! Executes a parsed [`UiAction`] against injected [`ActionEffects`]. Local
//! `SetState`/`ToggleState` values live in a scratch map owned by this instance
//! only; they are never persisted or shared with other dispatchers.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};

use flowpilot_domain::UiAction;

use crate::ports::outbound::{ActionEffects, DispatchError, DispatchResult};

pub struct ActionDispatcher {
    effects: Arc<dyn ActionEffects>,
    state: Mutex<HashMap<String, String>>,
}

impl ActionDispatcher {
    pub fn new(effects: Arc<dyn ActionEffects>) -> Self {
        Self {
            effects,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Run an action to completion.
    ///
    /// A panic anywhere in the action (including inside a callback) is caught and
    /// reported as [`DispatchError::Panicked`].
    pub async fn handle(&self, action: &UiAction) -> DispatchResult {
        let result = match AssertUnwindSafe(self.execute(action)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(DispatchError::Panicked(panic_message(panic))),
        };

        if let Err(e) = &result {
            tracing::warn!(action = action.kind(), error = %e, "Action failed");
        }
        result
    }

    /// Local value set by `SetState`/`ToggleState`
    pub fn get_state(&self, key: &str) -> Option<String> {
        self.scratch().get(key).cloned()
    }

    pub fn all_state(&self) -> HashMap<String, String> {
        self.scratch().clone()
    }

    fn execute<'a>(&'a self, action: &'a UiAction) -> BoxFuture<'a, DispatchResult> {
        async move {
            tracing::debug!(action = action.kind(), "Dispatching action");
            match action {
                UiAction::Navigate(nav) => self.effects.navigate(&nav.screen_id, nav.clear_stack),
                UiAction::NavigateBack => self.effects.navigate_back(),
                UiAction::NavigateExternal(ext) => self.effects.open_external(&ext.url),
                UiAction::ApiCall(call) => self.effects.api_call(call).await,
                UiAction::SetState(set) => {
                    self.scratch().insert(set.key.clone(), set.value.clone());
                    Ok(())
                }
                UiAction::ToggleState(toggle) => {
                    let mut state = self.scratch();
                    let current = state
                        .get(&toggle.key)
                        .map(|v| v == "true")
                        .unwrap_or(false);
                    state.insert(toggle.key.clone(), (!current).to_string());
                    Ok(())
                }
                UiAction::ShowSnackbar(snackbar) => self.effects.show_snackbar(snackbar),
                UiAction::ShowDialog(dialog) => self.effects.show_dialog(dialog),
                UiAction::Refresh => self.effects.refresh(),
                UiAction::Share(share) => self.effects.share(share),
                UiAction::Batch(batch) => {
                    // Strictly in order; the first failure stops the batch
                    for step in &batch.actions {
                        self.execute(step).await?;
                    }
                    Ok(())
                }
            }
        }
        .boxed()
    }

    fn scratch(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MockActionEffects;
    use async_trait::async_trait;
    use flowpilot_domain::{parse_action, ApiCall, Share, ShowDialog, ShowSnackbar};
    use mockall::Sequence;
    use serde_json::{json, Value};

    fn action(json: Value) -> UiAction {
        parse_action(&json).unwrap()
    }

    fn batch_abc() -> UiAction {
        action(json!({
            "type": "batch",
            "actions": [
                {"type": "navigate", "screenId": "a"},
                {"type": "navigate", "screenId": "b"},
                {"type": "navigate", "screenId": "c"}
            ]
        }))
    }

    #[tokio::test]
    async fn batch_runs_all_in_order() {
        let mut effects = MockActionEffects::new();
        let mut seq = Sequence::new();
        for id in ["a", "b", "c"] {
            effects
                .expect_navigate()
                .withf(move |screen, _| screen == id)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }

        let dispatcher = ActionDispatcher::new(Arc::new(effects));
        assert_eq!(dispatcher.handle(&batch_abc()).await, Ok(()));
    }

    #[tokio::test]
    async fn batch_stops_at_first_failure() {
        let mut effects = MockActionEffects::new();
        let mut seq = Sequence::new();
        effects
            .expect_navigate()
            .withf(|screen, _| screen == "a")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        effects
            .expect_navigate()
            .withf(|screen, _| screen == "b")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(DispatchError::Callback("b failed".into())));
        effects
            .expect_navigate()
            .withf(|screen, _| screen == "c")
            .times(0);

        let dispatcher = ActionDispatcher::new(Arc::new(effects));
        assert_eq!(
            dispatcher.handle(&batch_abc()).await,
            Err(DispatchError::Callback("b failed".into()))
        );
    }

    #[tokio::test]
    async fn toggle_flips_from_unset_false() {
        let dispatcher = ActionDispatcher::new(Arc::new(MockActionEffects::new()));
        let toggle = action(json!({"type": "toggle", "key": "agree"}));

        assert_eq!(dispatcher.get_state("agree"), None);
        dispatcher.handle(&toggle).await.unwrap();
        assert_eq!(dispatcher.get_state("agree").as_deref(), Some("true"));
        dispatcher.handle(&toggle).await.unwrap();
        assert_eq!(dispatcher.get_state("agree").as_deref(), Some("false"));
        dispatcher.handle(&toggle).await.unwrap();
        assert_eq!(dispatcher.get_state("agree").as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn toggle_treats_unparseable_as_false() {
        let dispatcher = ActionDispatcher::new(Arc::new(MockActionEffects::new()));
        dispatcher
            .handle(&action(json!({"type": "set_state", "key": "k", "value": "maybe"})))
            .await
            .unwrap();
        dispatcher
            .handle(&action(json!({"type": "toggle", "key": "k"})))
            .await
            .unwrap();
        assert_eq!(dispatcher.get_state("k").as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn toggle_only_reads_lowercase_true() {
        let dispatcher = ActionDispatcher::new(Arc::new(MockActionEffects::new()));
        dispatcher
            .handle(&action(json!({"type": "set_state", "key": "k", "value": "TRUE"})))
            .await
            .unwrap();
        dispatcher
            .handle(&action(json!({"type": "toggle", "key": "k"})))
            .await
            .unwrap();
        assert_eq!(dispatcher.get_state("k").as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn scratch_state_is_per_instance() {
        let first = ActionDispatcher::new(Arc::new(MockActionEffects::new()));
        let second = ActionDispatcher::new(Arc::new(MockActionEffects::new()));

        first
            .handle(&action(json!({"type": "set_state", "key": "name", "value": "Ann"})))
            .await
            .unwrap();

        assert_eq!(first.all_state().len(), 1);
        assert!(second.all_state().is_empty());
    }

    #[tokio::test]
    async fn api_call_delegates_to_injected_callback() {
        let mut effects = MockActionEffects::new();
        effects
            .expect_api_call()
            .withf(|call| call.endpoint == "/orders" && call.method == "POST")
            .times(1)
            .returning(|_| Err(DispatchError::Api("HTTP 500".into())));

        let dispatcher = ActionDispatcher::new(Arc::new(effects));
        let result = dispatcher
            .handle(&action(json!({"type": "api_call", "endpoint": "/orders", "method": "post"})))
            .await;

        assert_eq!(result, Err(DispatchError::Api("HTTP 500".into())));
    }

    /// Effects whose every callback panics
    struct PanickingEffects;

    #[async_trait]
    impl ActionEffects for PanickingEffects {
        fn navigate(&self, _: &str, _: bool) -> DispatchResult {
            panic!("navigation exploded")
        }
        fn navigate_back(&self) -> DispatchResult {
            panic!("back exploded")
        }
        fn open_external(&self, _: &str) -> DispatchResult {
            panic!("external exploded")
        }
        fn show_snackbar(&self, _: &ShowSnackbar) -> DispatchResult {
            panic!("snackbar exploded")
        }
        fn show_dialog(&self, _: &ShowDialog) -> DispatchResult {
            panic!("dialog exploded")
        }
        fn refresh(&self) -> DispatchResult {
            panic!("refresh exploded")
        }
        fn share(&self, _: &Share) -> DispatchResult {
            panic!("share exploded")
        }
        async fn api_call(&self, _: &ApiCall) -> DispatchResult {
            panic!("api exploded")
        }
    }

    #[tokio::test]
    async fn panics_become_failed_results() {
        let dispatcher = ActionDispatcher::new(Arc::new(PanickingEffects));

        let result = dispatcher
            .handle(&action(json!({"type": "navigate", "screenId": "x"})))
            .await;
        assert_eq!(
            result,
            Err(DispatchError::Panicked("navigation exploded".into()))
        );

        let result = dispatcher
            .handle(&action(json!({"type": "fetch", "endpoint": "/x"})))
            .await;
        assert!(matches!(result, Err(DispatchError::Panicked(_))));
    }
}

//! Backend-driven screen surface
//!
//! Holds the UI state of one screen surface, fed by the screen cache, and runs
//! the actions embedded in its schema. Loads and dispatches run on tasks owned
//! by the controller; dropping it (or calling [`ScreenController::shutdown`])
//! aborts all of them.

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

use flowpilot_domain::{
    parse_action, ApiCall, SchemaNode, ScreenSchema, Share, ShowDialog, ShowSnackbar, UiAction,
};

use crate::application::services::{ActionDispatcher, ScreenCache, ScreenResult};
use crate::ports::outbound::{ActionEffects, DispatchResult};

/// What the surface currently shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenUiState {
    pub screen_id: Option<String>,
    pub is_loading: bool,
    pub schema: Option<Arc<ScreenSchema>>,
    /// Epoch milliseconds of the last successful load
    pub last_updated: Option<i64>,
    pub error: Option<String>,
}

impl ScreenUiState {
    fn for_screen(screen_id: &str) -> Self {
        Self {
            screen_id: Some(screen_id.to_string()),
            ..Self::default()
        }
    }

    fn apply(&mut self, result: &ScreenResult) {
        match result {
            ScreenResult::Idle => {}
            ScreenResult::Loading => {
                self.is_loading = true;
                self.error = None;
            }
            ScreenResult::Success {
                schema,
                received_at,
            } => {
                self.is_loading = false;
                self.schema = Some(Arc::clone(schema));
                self.last_updated = Some(*received_at);
                self.error = None;
            }
            ScreenResult::Error(e) => {
                self.is_loading = false;
                self.error = Some(e.to_string());
            }
        }
    }
}

/// Result of one dispatched action, in dispatch order
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub action: &'static str,
    pub result: DispatchResult,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Apply `result` only if load `generation` is still the latest one.
///
/// The check runs under the watch lock, so a load that was superseded after it
/// read its result cannot write into the next screen's state.
fn apply_if_current(
    state: &watch::Sender<ScreenUiState>,
    latest: &AtomicU64,
    generation: u64,
    result: &ScreenResult,
) -> bool {
    state.send_if_modified(|ui| {
        if latest.load(Ordering::SeqCst) != generation {
            return false;
        }
        ui.apply(result);
        true
    })
}

/// Screen state plus navigation history, shared with the action effects
struct Surface {
    cache: ScreenCache,
    state: Arc<watch::Sender<ScreenUiState>>,
    load_generation: Arc<AtomicU64>,
    active_load: Mutex<Option<JoinHandle<()>>>,
    back_stack: Mutex<Vec<String>>,
}

impl Surface {
    fn current_screen(&self) -> Option<String> {
        self.state.borrow().screen_id.clone()
    }

    fn load_screen(&self, screen_id: &str, refresh: bool) {
        let mut active = lock(&self.active_load);
        if let Some(previous) = active.take() {
            previous.abort();
        }
        // Abort lands at the next await; the generation fences anything sooner
        let generation = self.load_generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.state.send_if_modified(|ui| {
            if ui.screen_id.as_deref() == Some(screen_id) {
                return false;
            }
            *ui = ScreenUiState::for_screen(screen_id);
            true
        });

        let mut results = self.cache.stream_screen(screen_id, refresh);
        let state = Arc::clone(&self.state);
        let latest = Arc::clone(&self.load_generation);
        *active = Some(tokio::spawn(async move {
            loop {
                let result = results.borrow_and_update().clone();
                if !apply_if_current(&state, &latest, generation, &result) {
                    break;
                }
                if results.changed().await.is_err() {
                    break;
                }
            }
        }));
    }

    fn navigate(&self, screen_id: &str, clear_stack: bool) {
        {
            let mut back_stack = lock(&self.back_stack);
            if clear_stack {
                back_stack.clear();
            } else if let Some(current) = self.current_screen() {
                if current != screen_id {
                    back_stack.push(current);
                }
            }
        }
        if clear_stack {
            self.state.send_replace(ScreenUiState::default());
        }

        let needs_fetch = matches!(
            self.cache.get_current(screen_id),
            None | Some(ScreenResult::Idle)
        );
        self.load_screen(screen_id, needs_fetch);
    }

    /// Pop one screen off the history; `false` when there is none.
    fn navigate_back(&self) -> bool {
        let previous = lock(&self.back_stack).pop();
        match previous {
            Some(screen_id) => {
                self.load_screen(&screen_id, false);
                true
            }
            None => false,
        }
    }

    fn reload(&self) {
        if let Some(screen_id) = self.current_screen() {
            drop(self.cache.refresh(&screen_id));
        }
    }

    fn stop(&self) {
        self.load_generation.fetch_add(1, Ordering::SeqCst);
        if let Some(load) = lock(&self.active_load).take() {
            load.abort();
        }
    }
}

/// Routes navigation and refresh to the surface, everything else to the host.
struct SurfaceEffects {
    surface: Arc<Surface>,
    host: Arc<dyn ActionEffects>,
}

#[async_trait]
impl ActionEffects for SurfaceEffects {
    fn navigate(&self, screen_id: &str, clear_stack: bool) -> DispatchResult {
        self.surface.navigate(screen_id, clear_stack);
        Ok(())
    }

    fn navigate_back(&self) -> DispatchResult {
        if self.surface.navigate_back() {
            Ok(())
        } else {
            self.host.navigate_back()
        }
    }

    fn open_external(&self, url: &str) -> DispatchResult {
        self.host.open_external(url)
    }

    fn show_snackbar(&self, snackbar: &ShowSnackbar) -> DispatchResult {
        self.host.show_snackbar(snackbar)
    }

    fn show_dialog(&self, dialog: &ShowDialog) -> DispatchResult {
        self.host.show_dialog(dialog)
    }

    fn refresh(&self) -> DispatchResult {
        self.surface.reload();
        Ok(())
    }

    fn share(&self, share: &Share) -> DispatchResult {
        self.host.share(share)
    }

    async fn api_call(&self, call: &ApiCall) -> DispatchResult {
        self.host.api_call(call).await
    }
}

pub struct ScreenController {
    surface: Arc<Surface>,
    dispatcher: Arc<ActionDispatcher>,
    actions: Mutex<Option<mpsc::UnboundedSender<UiAction>>>,
    outcomes: Mutex<Option<mpsc::UnboundedReceiver<DispatchOutcome>>>,
    tasks: Mutex<JoinSet<()>>,
}

impl ScreenController {
    /// Must be called within a Tokio runtime.
    ///
    /// `host` receives every effect the surface does not handle itself.
    pub fn new(cache: ScreenCache, host: Arc<dyn ActionEffects>) -> Self {
        let (state, _) = watch::channel(ScreenUiState::default());
        let surface = Arc::new(Surface {
            cache,
            state: Arc::new(state),
            load_generation: Arc::new(AtomicU64::new(0)),
            active_load: Mutex::new(None),
            back_stack: Mutex::new(Vec::new()),
        });
        let dispatcher = Arc::new(ActionDispatcher::new(Arc::new(SurfaceEffects {
            surface: Arc::clone(&surface),
            host,
        })));

        let (action_tx, mut action_rx) = mpsc::unbounded_channel::<UiAction>();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        // One worker so actions run, and report, strictly in dispatch order
        let mut tasks = JoinSet::new();
        let worker = Arc::clone(&dispatcher);
        tasks.spawn(async move {
            while let Some(action) = action_rx.recv().await {
                let result = worker.handle(&action).await;
                let outcome = DispatchOutcome {
                    action: action.kind(),
                    result,
                };
                if outcome_tx.send(outcome).is_err() {
                    tracing::debug!("Dispatch outcome dropped, no receiver");
                }
            }
        });

        Self {
            surface,
            dispatcher,
            actions: Mutex::new(Some(action_tx)),
            outcomes: Mutex::new(Some(outcome_rx)),
            tasks: Mutex::new(tasks),
        }
    }

    pub fn observe(&self) -> watch::Receiver<ScreenUiState> {
        self.surface.state.subscribe()
    }

    pub fn state(&self) -> ScreenUiState {
        self.surface.state.borrow().clone()
    }

    /// Show `screen_id`, replacing the active load.
    pub fn load_screen(&self, screen_id: &str, refresh: bool) {
        tracing::debug!(screen_id = %screen_id, refresh, "Loading screen");
        self.surface.load_screen(screen_id, refresh);
    }

    pub fn reload(&self) {
        self.surface.reload();
    }

    /// Queue an action. Returns `false` after shutdown.
    pub fn dispatch(&self, action: UiAction) -> bool {
        match lock(&self.actions).as_ref() {
            Some(actions) => actions.send(action).is_ok(),
            None => false,
        }
    }

    /// Parse and queue a raw action object; unparseable actions are ignored.
    pub fn dispatch_json(&self, action: &Value) -> bool {
        match parse_action(action) {
            Some(action) => self.dispatch(action),
            None => {
                tracing::debug!("Ignoring unparseable action");
                false
            }
        }
    }

    /// Queue the action attached to a node, if it has one.
    pub fn dispatch_node(&self, node: &SchemaNode) -> bool {
        node.parsed_action()
            .map(|action| self.dispatch(action))
            .unwrap_or(false)
    }

    /// Receiver of dispatch outcomes; available once.
    pub fn take_outcomes(&self) -> Option<mpsc::UnboundedReceiver<DispatchOutcome>> {
        lock(&self.outcomes).take()
    }

    /// Local state set by `SetState`/`ToggleState` actions
    pub fn local_state(&self, key: &str) -> Option<String> {
        self.dispatcher.get_state(key)
    }

    /// Abort the active load and all dispatch work.
    pub fn shutdown(&self) {
        lock(&self.actions).take();
        lock(&self.tasks).abort_all();
        self.surface.stop();
    }
}

impl Drop for ScreenController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

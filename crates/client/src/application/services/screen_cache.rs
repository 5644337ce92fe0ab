//! Per-screen reactive result cache
//!
//! One `watch` channel per screen id, created lazily. Observers always see the
//! latest `ScreenResult` immediately on subscribe. A `refresh` publishes
//! `Loading` right away, fetches, then publishes `Success` or `Error`.
//!
//! Overlapping refreshes of the same id are last-started-wins: starting a refresh
//! aborts the one in flight, and a generation check under the entry lock keeps a
//! stale fetch from publishing even if it finished before the abort landed.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

use flowpilot_domain::ScreenSchema;

use super::action_dispatcher::panic_message;
use super::retry::{retry_io_if, RetryPolicy};
use crate::ports::outbound::{ClockPort, ScreenFetchError, ScreenSource};

/// State of one screen's most recent fetch
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenResult {
    Idle,
    Loading,
    Success {
        schema: Arc<ScreenSchema>,
        /// Epoch milliseconds when the schema arrived
        received_at: i64,
    },
    Error(Arc<ScreenFetchError>),
}

impl ScreenResult {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error(_))
    }

    pub fn schema(&self) -> Option<&Arc<ScreenSchema>> {
        match self {
            Self::Success { schema, .. } => Some(schema),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ScreenFetchError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }
}

struct Entry {
    sender: watch::Sender<ScreenResult>,
    generation: u64,
    in_flight: Option<AbortHandle>,
}

impl Entry {
    fn new() -> Self {
        let (sender, _) = watch::channel(ScreenResult::Idle);
        Self {
            sender,
            generation: 0,
            in_flight: None,
        }
    }
}

struct CacheInner {
    source: Arc<dyn ScreenSource>,
    clock: Arc<dyn ClockPort>,
    retry: RetryPolicy,
    entries: Mutex<HashMap<String, Entry>>,
}

impl CacheInner {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cheap to clone; clones share entries.
#[derive(Clone)]
pub struct ScreenCache {
    inner: Arc<CacheInner>,
}

impl ScreenCache {
    /// Cache without retries: one fetch attempt per refresh.
    pub fn new(source: Arc<dyn ScreenSource>, clock: Arc<dyn ClockPort>) -> Self {
        Self::with_retry(source, clock, RetryPolicy::none())
    }

    /// Cache that retries transient fetch failures with `retry`.
    pub fn with_retry(
        source: Arc<dyn ScreenSource>,
        clock: Arc<dyn ClockPort>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                clock,
                retry,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Observe a screen, optionally kicking off a refresh first.
    ///
    /// Must be called within a Tokio runtime when `refresh` is true.
    pub fn stream_screen(&self, screen_id: &str, refresh: bool) -> watch::Receiver<ScreenResult> {
        let receiver = self
            .inner
            .entries()
            .entry(screen_id.to_string())
            .or_insert_with(Entry::new)
            .sender
            .subscribe();

        if refresh {
            // Observers read the latest value; the handle is not needed here
            drop(self.refresh(screen_id));
        }
        receiver
    }

    /// Publish `Loading`, then fetch and publish the terminal result.
    ///
    /// The returned handle completes once the fetch has been published (or was
    /// superseded by a newer refresh). Dropping it does not cancel the fetch.
    pub fn refresh(&self, screen_id: &str) -> JoinHandle<()> {
        let mut entries = self.inner.entries();
        let entry = entries
            .entry(screen_id.to_string())
            .or_insert_with(Entry::new);

        if let Some(previous) = entry.in_flight.take() {
            previous.abort();
        }
        entry.generation += 1;
        let generation = entry.generation;
        entry.sender.send_replace(ScreenResult::Loading);
        tracing::debug!(screen_id = %screen_id, generation, "Screen refresh started");

        let inner = Arc::clone(&self.inner);
        let id = screen_id.to_string();
        let handle = tokio::spawn(async move {
            let fetch = retry_io_if(&inner.retry, ScreenFetchError::is_retryable, || {
                inner.source.fetch_screen(&id)
            });
            // A panicking source still has to leave observers a terminal result
            let outcome = AssertUnwindSafe(fetch)
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(ScreenFetchError::Panicked(panic_message(panic))));

            let result = match outcome {
                Ok(schema) => ScreenResult::Success {
                    schema: Arc::new(schema),
                    received_at: inner.clock.now_millis(),
                },
                Err(e) => {
                    tracing::warn!(screen_id = %id, error = %e, "Screen fetch failed");
                    ScreenResult::Error(Arc::new(e))
                }
            };

            let mut entries = inner.entries();
            if let Some(entry) = entries.get_mut(&id) {
                if entry.generation == generation {
                    entry.in_flight = None;
                    entry.sender.send_replace(result);
                    tracing::debug!(screen_id = %id, generation, "Screen refresh published");
                } else {
                    tracing::debug!(
                        screen_id = %id,
                        generation,
                        "Superseded screen refresh dropped"
                    );
                }
            }
        });

        entry.in_flight = Some(handle.abort_handle());
        handle
    }

    /// Latest result for a screen, `None` if it was never requested.
    pub fn get_current(&self, screen_id: &str) -> Option<ScreenResult> {
        self.inner
            .entries()
            .get(screen_id)
            .map(|entry| entry.sender.borrow().clone())
    }
}

//! Canned screen source for offline runs and tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use flowpilot_domain::ScreenSchema;

use crate::ports::outbound::{ScreenFetchError, ScreenSource};

/// Serves a fixed set of schemas, optionally after an artificial delay.
#[derive(Clone, Default)]
pub struct StaticScreenSource {
    screens: HashMap<String, ScreenSchema>,
    delay: Option<Duration>,
}

impl StaticScreenSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under its own `screen.id`.
    pub fn with_screen(mut self, schema: ScreenSchema) -> Self {
        self.screens.insert(schema.screen.id.clone(), schema);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn screen_ids(&self) -> impl Iterator<Item = &str> {
        self.screens.keys().map(String::as_str)
    }
}

#[async_trait]
impl ScreenSource for StaticScreenSource {
    async fn fetch_screen(&self, screen_id: &str) -> Result<ScreenSchema, ScreenFetchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.screens
            .get(screen_id)
            .cloned()
            .ok_or_else(|| ScreenFetchError::NotFound(screen_id.to_string()))
    }
}

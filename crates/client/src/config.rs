//! Client configuration

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::services::retry::{
    RetryPolicy, DEFAULT_BACKOFF_FACTOR, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_DELAY_MS,
    DEFAULT_RETRY_TIMES,
};
use crate::infrastructure::http::{
    HttpTimeouts, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS,
};
use crate::infrastructure::storage::FileStorage;

/// Workflow server used when `FLOWPILOT_BASE_URL` is unset
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Client configuration loaded from environment
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Workflow API base URL
    pub base_url: String,
    /// Screen schema base URL
    pub screens_url: String,
    pub timeouts: HttpTimeouts,
    /// Session file
    pub storage_path: PathBuf,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("FLOWPILOT_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        validate_url(&base_url).context("FLOWPILOT_BASE_URL must be a valid http(s) URL")?;

        let screens_url = lookup("FLOWPILOT_SCREENS_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| base_url.clone());
        validate_url(&screens_url).context("FLOWPILOT_SCREENS_URL must be a valid http(s) URL")?;

        let storage_path = lookup("FLOWPILOT_STORAGE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(FileStorage::default_path);

        Ok(Self {
            base_url,
            screens_url,
            timeouts: HttpTimeouts {
                connect: Duration::from_millis(env_u64(
                    &lookup,
                    "FLOWPILOT_CONNECT_TIMEOUT_MS",
                    DEFAULT_CONNECT_TIMEOUT_MS,
                )),
                request: Duration::from_millis(env_u64(
                    &lookup,
                    "FLOWPILOT_REQUEST_TIMEOUT_MS",
                    DEFAULT_REQUEST_TIMEOUT_MS,
                )),
            },
            storage_path,
            retry: RetryPolicy::new(
                env_u64(&lookup, "FLOWPILOT_RETRY_TIMES", u64::from(DEFAULT_RETRY_TIMES))
                    .try_into()
                    .unwrap_or(DEFAULT_RETRY_TIMES),
                Duration::from_millis(env_u64(
                    &lookup,
                    "FLOWPILOT_RETRY_INITIAL_DELAY_MS",
                    DEFAULT_INITIAL_DELAY_MS,
                )),
                DEFAULT_BACKOFF_FACTOR,
                Duration::from_millis(env_u64(
                    &lookup,
                    "FLOWPILOT_RETRY_MAX_DELAY_MS",
                    DEFAULT_MAX_DELAY_MS,
                )),
            ),
        })
    }
}

fn env_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(
                key,
                value = %raw,
                default,
                "Invalid number in configuration, using default"
            );
            default
        }),
    }
}

fn validate_url(raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw).with_context(|| format!("invalid URL: {raw}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => anyhow::bail!("unsupported URL scheme: {other}"),
    }
}

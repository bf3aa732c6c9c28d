//! Client configuration with environment overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the service base URL.
pub const API_URL_ENV: &str = "LEADERBOARD_API_URL";
/// Older name for [`API_URL_ENV`], still honoured.
pub const LEGACY_API_URL_ENV: &str = "REACT_APP_API_URL";
pub const POLL_INTERVAL_ENV: &str = "LEADERBOARD_POLL_INTERVAL_MS";
pub const REFRESH_SETTLE_ENV: &str = "LEADERBOARD_REFRESH_SETTLE_MS";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Settings shared by every leaderboard component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the scoring service
    pub base_url: String,
    /// Delay between scheduled leaderboard fetches
    pub poll_interval_ms: u64,
    /// Wait after a successful submission before refreshing
    pub refresh_settle_ms: u64,
    /// Per-request timeout
    pub request_timeout_seconds: u64,
    /// Extra attempts for idempotent reads that fail in transport
    pub read_retry_attempts: usize,
    /// Outbound request budget
    pub rate_limit_requests_per_second: u32,
}

impl ClientConfig {
    /// Defaults overlaid with whatever the environment provides.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).or_else(|| lookup(LEGACY_API_URL_ENV)) {
            let url = url.trim();
            if !url.is_empty() {
                self.base_url = url.to_string();
            }
        }

        if let Some(raw) = lookup(POLL_INTERVAL_ENV) {
            self.poll_interval_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{POLL_INTERVAL_ENV} must be a number of milliseconds"))?;
        }

        if let Some(raw) = lookup(REFRESH_SETTLE_ENV) {
            self.refresh_settle_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{REFRESH_SETTLE_ENV} must be a number of milliseconds"))?;
        }

        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn refresh_settle(&self) -> Duration {
        Duration::from_millis(self.refresh_settle_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 5_000,
            refresh_settle_ms: 1_000,
            request_timeout_seconds: 10,
            read_retry_attempts: 2,
            rate_limit_requests_per_second: 20,
        }
    }
}

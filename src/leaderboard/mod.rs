//! Leaderboard module - client-side synchronization core.
//!
//! Three independent components talk to the scoring service through the
//! [`LeaderboardApi`] seam:
//! - [`LeaderboardSync`] polls the top players and caches the last good snapshot
//! - [`ScoreSubmitter`] validates and submits scores, then refreshes the sync once
//! - [`RankQuery`] looks up a single player's rank on demand

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod rank_query;
pub mod submitter;
pub mod sync;
pub mod throttle;

pub use api::{HttpLeaderboardApi, LeaderboardApi};
pub use config::ClientConfig;
pub use error::ClientError;
pub use identity::{derive_user_id, HashedIdentity, IdentityProvider};
pub use rank_query::{RankQuery, RankState};
pub use submitter::{
    ScoreSubmitter, StatusMessage, SubmissionDraft, SubmitPhase, SubmitReceipt, SubmitterState,
};
pub use sync::{LeaderboardSync, SyncPhase, SyncState};
pub use throttle::RequestThrottle;

use std::sync::Arc;

/// The three components wired together.
pub struct LeaderboardClient {
    pub sync: LeaderboardSync,
    pub submitter: ScoreSubmitter,
    pub rank_query: RankQuery,
}

/// Client builder for convenient construction with sensible defaults.
pub struct ClientBuilder {
    config: ClientConfig,
    identity: Arc<dyn IdentityProvider>,
}

impl ClientBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::from_config(ClientConfig::default())
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            identity: Arc::new(HashedIdentity),
        }
    }

    /// Set the scoring service base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn with_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.config.poll_interval_ms = interval_ms;
        self
    }

    /// Set the wait between a successful submission and its refresh.
    pub fn with_refresh_settle_ms(mut self, settle_ms: u64) -> Self {
        self.config.refresh_settle_ms = settle_ms;
        self
    }

    pub fn with_request_timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.request_timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_read_retries(mut self, attempts: usize) -> Self {
        self.config.read_retry_attempts = attempts;
        self
    }

    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.config.rate_limit_requests_per_second = requests_per_second;
        self
    }

    /// Replace the username hash with another identity scheme.
    pub fn with_identity_provider(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    pub fn build_config(self) -> ClientConfig {
        self.config
    }

    /// Build against the HTTP service named in the configuration.
    pub fn build(self) -> anyhow::Result<LeaderboardClient> {
        let api = Arc::new(HttpLeaderboardApi::from_config(&self.config)?);
        Ok(self.build_with_api(api))
    }

    /// Build against any transport.
    pub fn build_with_api(self, api: Arc<dyn LeaderboardApi>) -> LeaderboardClient {
        let sync = LeaderboardSync::new(api.clone(), self.config.poll_interval());
        let submitter = ScoreSubmitter::new(api.clone(), self.identity)
            .with_refresh_target(sync.clone(), self.config.refresh_settle());
        let rank_query = RankQuery::new(api);

        LeaderboardClient {
            sync,
            submitter,
            rank_query,
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

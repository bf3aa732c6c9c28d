//! Transport seam between the components and the scoring service.
//!
//! Components only see [`LeaderboardApi`]; [`HttpLeaderboardApi`] is the
//! reqwest-backed implementation used outside of tests.

use crate::leaderboard::config::ClientConfig;
use crate::leaderboard::error::ClientError;
use crate::leaderboard::throttle::RequestThrottle;
use crate::types::{
    ErrorBody, LeaderboardEntry, RankResult, SubmitScoreRequest, SubmitScoreResponse, UserId,
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, instrument, warn};

pub const TOP_PATH: &str = "/api/leaderboard/top/";
pub const SUBMIT_PATH: &str = "/api/leaderboard/submit/";

pub fn rank_path(user_id: UserId) -> String {
    format!("/api/leaderboard/rank/{user_id}/")
}

/// The three endpoints of the scoring service.
#[async_trait]
pub trait LeaderboardApi: Send + Sync {
    /// Top players in server rank order.
    async fn fetch_top(&self) -> Result<Vec<LeaderboardEntry>, ClientError>;

    /// Record a score and return the player's new total.
    async fn submit_score(
        &self,
        request: &SubmitScoreRequest,
    ) -> Result<SubmitScoreResponse, ClientError>;

    /// Rank of a single player. Unknown players yield [`ClientError::NotFound`].
    async fn fetch_rank(&self, user_id: UserId) -> Result<RankResult, ClientError>;
}

pub struct HttpLeaderboardApi {
    http_client: Client,
    base_url: String,
    throttle: RequestThrottle,
    read_retry_attempts: usize,
}

impl HttpLeaderboardApi {
    pub fn new(http_client: Client, config: &ClientConfig) -> Self {
        Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            throttle: RequestThrottle::new(config.rate_limit_requests_per_second),
            read_retry_attempts: config.read_retry_attempts,
        }
    }

    /// Build with a fresh HTTP client using the configured timeout.
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::new(http_client, config))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET with retries on transport failures only.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        let retry_strategy = ExponentialBackoff::from_millis(2)
            .factor(50)
            .max_delay(Duration::from_secs(2))
            .take(self.read_retry_attempts);

        RetryIf::spawn(
            retry_strategy,
            || self.get_json_once(&url),
            |err: &ClientError| {
                if err.is_transient() {
                    debug!("Retrying {} after transport failure: {}", url, err);
                }
                err.is_transient()
            },
        )
        .await
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        self.throttle.acquire().await;

        let response = self.http_client.get(url).send().await?;
        decode(response).await
    }
}

#[async_trait]
impl LeaderboardApi for HttpLeaderboardApi {
    #[instrument(skip(self))]
    async fn fetch_top(&self) -> Result<Vec<LeaderboardEntry>, ClientError> {
        self.get_json(TOP_PATH).await
    }

    #[instrument(skip(self, request), fields(user_id = request.user_id, game_mode = %request.game_mode))]
    async fn submit_score(
        &self,
        request: &SubmitScoreRequest,
    ) -> Result<SubmitScoreResponse, ClientError> {
        self.throttle.acquire().await;

        let response = self
            .http_client
            .post(self.url(SUBMIT_PATH))
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    #[instrument(skip(self))]
    async fn fetch_rank(&self, user_id: UserId) -> Result<RankResult, ClientError> {
        self.get_json(&rank_path(user_id))
            .await
            .map_err(|err| match err {
                ClientError::Server { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
                    ClientError::NotFound
                }
                other => other,
            })
    }
}

/// Turn a response into the success body or a [`ClientError::Server`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();

    if !status.is_success() {
        // a missing or non-JSON body is fine, the caller falls back to a generic message
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error);
        warn!("Leaderboard service returned {}: {:?}", status, message);
        return Err(ClientError::Server {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|err| ClientError::Transport(format!("malformed response: {err}")))
}

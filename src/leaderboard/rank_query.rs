//! RankQuery - on-demand rank lookup for a single player.

use crate::leaderboard::api::LeaderboardApi;
use crate::leaderboard::error::ClientError;
use crate::types::{RankResult, UserId};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

pub const INVALID_USER_ID_MESSAGE: &str = "Please enter a valid user ID";
pub const NOT_FOUND_MESSAGE: &str = "User not found in leaderboard";
pub const RANK_FAILED_MESSAGE: &str = "Failed to fetch player rank";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankState {
    Idle,
    Searching { user_id: UserId },
    Found(RankResult),
    NotFound,
    Error(String),
}

impl RankState {
    pub fn result(&self) -> Option<&RankResult> {
        match self {
            RankState::Found(result) => Some(result),
            _ => None,
        }
    }

    /// Error sentence to display, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            RankState::NotFound => Some(NOT_FOUND_MESSAGE),
            RankState::Error(message) => Some(message),
            _ => None,
        }
    }
}

pub struct RankQuery {
    api: Arc<dyn LeaderboardApi>,
    state: watch::Sender<RankState>,
}

impl RankQuery {
    pub fn new(api: Arc<dyn LeaderboardApi>) -> Self {
        let (state, _) = watch::channel(RankState::Idle);
        Self { api, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<RankState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> RankState {
        self.state.borrow().clone()
    }

    /// Look up the rank for the id typed by the user.
    ///
    /// Blank, non-numeric or non-positive input is rejected without a request.
    #[instrument(skip(self))]
    pub async fn query(&self, input: &str) -> Result<RankResult, ClientError> {
        let user_id = match input.trim().parse::<UserId>() {
            Ok(user_id) if user_id >= 1 => user_id,
            _ => {
                self.state
                    .send_replace(RankState::Error(INVALID_USER_ID_MESSAGE.to_string()));
                return Err(ClientError::Validation(INVALID_USER_ID_MESSAGE.to_string()));
            }
        };

        // drop whatever was shown before the request goes out
        self.state.send_replace(RankState::Searching { user_id });

        let result = self.api.fetch_rank(user_id).await;

        let next = match &result {
            Ok(rank) => {
                debug!("User {} is ranked #{}", rank.user_id, rank.rank);
                RankState::Found(*rank)
            }
            Err(ClientError::NotFound) => RankState::NotFound,
            Err(err) => {
                warn!("Error fetching player rank: {}", err);
                RankState::Error(RANK_FAILED_MESSAGE.to_string())
            }
        };
        self.state.send_replace(next);

        result
    }

    /// Hide a displayed error, e.g. once the user edits the input.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| {
            if state.message().is_some() {
                *state = RankState::Idle;
                true
            } else {
                false
            }
        });
    }

    pub fn reset(&self) {
        self.state.send_replace(RankState::Idle);
    }
}

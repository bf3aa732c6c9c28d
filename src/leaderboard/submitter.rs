//! ScoreSubmitter - validates a draft, derives the player id and submits.
//!
//! A successful submission resets the draft and schedules exactly one
//! leaderboard refresh after a settle delay, giving the service time to
//! persist the new total.

use crate::leaderboard::api::LeaderboardApi;
use crate::leaderboard::error::ClientError;
use crate::leaderboard::identity::IdentityProvider;
use crate::leaderboard::sync::LeaderboardSync;
use crate::types::{GameMode, SubmitScoreRequest, UserId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all fields.";
pub const NEGATIVE_SCORE_MESSAGE: &str = "Score must be non-negative.";
pub const SCORE_TOO_LARGE_MESSAGE: &str = "Score is too large.";
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit score";

/// The form being filled in. Score stays raw text until validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionDraft {
    pub username: String,
    pub score: String,
    pub game_mode: GameMode,
}

impl SubmissionDraft {
    pub fn new(username: impl Into<String>, score: impl ToString, game_mode: GameMode) -> Self {
        Self {
            username: username.into(),
            score: score.to_string(),
            game_mode,
        }
    }

    /// Check the draft in order, first failure wins.
    pub fn validate(&self) -> Result<ValidSubmission, ClientError> {
        let username = self.username.trim();
        let raw_score = self.score.trim();

        if username.is_empty() || raw_score.is_empty() {
            return Err(ClientError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
        }

        Ok(ValidSubmission {
            username: username.to_string(),
            score: parse_score(raw_score)?,
            game_mode: self.game_mode,
        })
    }
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub username: String,
    pub score: i64,
    pub game_mode: GameMode,
}

/// Integers are taken as is; decimals are truncated toward zero.
fn parse_score(raw: &str) -> Result<i64, ClientError> {
    let negative = || ClientError::Validation(NEGATIVE_SCORE_MESSAGE.to_string());

    let score = match raw.parse::<i64>() {
        Ok(score) => score,
        Err(_) => {
            let value = raw.parse::<f64>().map_err(|_| negative())?;
            if !value.is_finite() || value < 0.0 {
                return Err(negative());
            }
            if value >= i64::MAX as f64 {
                return Err(ClientError::Validation(SCORE_TOO_LARGE_MESSAGE.to_string()));
            }
            value.trunc() as i64
        }
    };

    if score < 0 {
        return Err(negative());
    }
    Ok(score)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Idle,
    Submitting,
}

/// Outcome line shown under the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Success(String),
    Error(String),
}

impl StatusMessage {
    pub fn text(&self) -> &str {
        match self {
            StatusMessage::Success(text) | StatusMessage::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StatusMessage::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitterState {
    pub draft: SubmissionDraft,
    pub phase: SubmitPhase,
    pub status: Option<StatusMessage>,
}

impl Default for SubmitterState {
    fn default() -> Self {
        Self {
            draft: SubmissionDraft::default(),
            phase: SubmitPhase::Idle,
            status: None,
        }
    }
}

/// What a successful submission produced.
#[derive(Debug)]
pub struct SubmitReceipt {
    pub user_id: UserId,
    pub total_score: i64,
    /// The delayed leaderboard refresh, when a sync is attached
    pub refresh: Option<JoinHandle<()>>,
}

/// User-facing sentence for a failed submission.
pub fn submit_error_message(err: &ClientError) -> String {
    match err {
        ClientError::Validation(message) => message.clone(),
        ClientError::Server {
            message: Some(message),
            ..
        } => message.clone(),
        ClientError::Transport(detail) => format!("{SUBMIT_FAILED_MESSAGE}: {detail}"),
        ClientError::Server { message: None, .. } | ClientError::NotFound | ClientError::Busy => {
            SUBMIT_FAILED_MESSAGE.to_string()
        }
    }
}

pub struct ScoreSubmitter {
    api: Arc<dyn LeaderboardApi>,
    identity: Arc<dyn IdentityProvider>,
    refresh_target: Option<LeaderboardSync>,
    settle_delay: Duration,
    state: watch::Sender<SubmitterState>,
}

/// Puts the phase back to `Idle` however the submission ends, including
/// the future being dropped mid-request.
struct SubmittingGuard<'a> {
    state: &'a watch::Sender<SubmitterState>,
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|state| {
            if state.phase == SubmitPhase::Submitting {
                state.phase = SubmitPhase::Idle;
                true
            } else {
                false
            }
        });
    }
}

enum Admission {
    Busy,
    Rejected(ClientError),
    Accepted(ValidSubmission),
}

impl ScoreSubmitter {
    pub fn new(api: Arc<dyn LeaderboardApi>, identity: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(SubmitterState::default());

        Self {
            api,
            identity,
            refresh_target: None,
            settle_delay: Duration::from_secs(1),
            state,
        }
    }

    /// Refresh `sync` once, `settle_delay` after each successful submission.
    pub fn with_refresh_target(mut self, sync: LeaderboardSync, settle_delay: Duration) -> Self {
        self.refresh_target = Some(sync);
        self.settle_delay = settle_delay;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmitterState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SubmitterState {
        self.state.borrow().clone()
    }

    pub fn draft(&self) -> SubmissionDraft {
        self.state.borrow().draft.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.state.borrow().phase == SubmitPhase::Submitting
    }

    pub fn update_draft<F>(&self, edit: F)
    where
        F: FnOnce(&mut SubmissionDraft),
    {
        self.state.send_modify(|state| edit(&mut state.draft));
    }

    pub fn set_username(&self, username: impl Into<String>) {
        let username = username.into();
        self.update_draft(|draft| draft.username = username);
    }

    pub fn set_score(&self, score: impl ToString) {
        let score = score.to_string();
        self.update_draft(|draft| draft.score = score);
    }

    pub fn set_game_mode(&self, game_mode: GameMode) {
        self.update_draft(|draft| draft.game_mode = game_mode);
    }

    /// Validate and submit the current draft.
    ///
    /// Returns [`ClientError::Busy`] without touching the status if a
    /// submission is already running.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<SubmitReceipt, ClientError> {
        let mut admission = Admission::Busy;
        self.state.send_if_modified(|state| {
            if state.phase == SubmitPhase::Submitting {
                return false;
            }
            match state.draft.validate() {
                Ok(valid) => {
                    state.phase = SubmitPhase::Submitting;
                    state.status = None;
                    admission = Admission::Accepted(valid);
                }
                Err(err) => {
                    state.status = Some(StatusMessage::Error(submit_error_message(&err)));
                    admission = Admission::Rejected(err);
                }
            }
            true
        });

        let submission = match admission {
            Admission::Accepted(submission) => submission,
            Admission::Rejected(err) => return Err(err),
            Admission::Busy => {
                warn!("Submission already in progress, ignoring");
                return Err(ClientError::Busy);
            }
        };

        let _guard = SubmittingGuard { state: &self.state };

        let request = SubmitScoreRequest {
            user_id: self.identity.identify(&submission.username),
            score: submission.score,
            game_mode: submission.game_mode,
        };

        match self.api.submit_score(&request).await {
            Ok(response) => {
                info!(
                    "Score {} submitted for user {} ({}), total now {}",
                    request.score, request.user_id, request.game_mode, response.total_score
                );
                self.state.send_modify(|state| {
                    state.phase = SubmitPhase::Idle;
                    state.draft = SubmissionDraft::default();
                    state.status = Some(StatusMessage::Success(format!(
                        "Score submitted successfully! Total score: {}",
                        response.total_score
                    )));
                });

                Ok(SubmitReceipt {
                    user_id: request.user_id,
                    total_score: response.total_score,
                    refresh: self.schedule_refresh(),
                })
            }
            Err(err) => {
                warn!("Error submitting score: {}", err);
                // draft is kept so the player can retry
                self.state.send_modify(|state| {
                    state.phase = SubmitPhase::Idle;
                    state.status = Some(StatusMessage::Error(submit_error_message(&err)));
                });
                Err(err)
            }
        }
    }

    fn schedule_refresh(&self) -> Option<JoinHandle<()>> {
        let sync = self.refresh_target.clone()?;
        let delay = self.settle_delay;

        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(refresh) = sync.refresh_now() {
                let _ = refresh.await;
            }
        }))
    }
}

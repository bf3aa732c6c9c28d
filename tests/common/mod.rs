//! Scripted in-memory leaderboard service shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use leaderboard_client::leaderboard::{ClientError, LeaderboardApi};
use leaderboard_client::types::{
    LeaderboardEntry, RankResult, SubmitScoreRequest, SubmitScoreResponse, UserId,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// One canned reply, delivered after `delay`.
pub struct Scripted<T> {
    pub delay: Duration,
    pub result: Result<T, ClientError>,
}

impl<T> Scripted<T> {
    pub fn ok(value: T) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(value),
        }
    }

    pub fn err(err: ClientError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(err),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub enum Call {
    Top(Instant),
    Submit(SubmitScoreRequest, Instant),
    Rank(UserId, Instant),
}

/// Pops scripted replies per endpoint; `fetch_top` falls back to a fixed
/// reply once its queue is empty.
#[derive(Default)]
pub struct ScriptedApi {
    top: Mutex<VecDeque<Scripted<Vec<LeaderboardEntry>>>>,
    top_fallback: Mutex<Option<Vec<LeaderboardEntry>>>,
    submits: Mutex<VecDeque<Scripted<SubmitScoreResponse>>>,
    ranks: Mutex<VecDeque<Scripted<RankResult>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_top(&self, reply: Scripted<Vec<LeaderboardEntry>>) {
        self.top.lock().unwrap().push_back(reply);
    }

    pub fn set_top_fallback(&self, entries: Vec<LeaderboardEntry>) {
        *self.top_fallback.lock().unwrap() = Some(entries);
    }

    pub fn push_submit(&self, reply: Scripted<SubmitScoreResponse>) {
        self.submits.lock().unwrap().push_back(reply);
    }

    pub fn push_rank(&self, reply: Scripted<RankResult>) {
        self.ranks.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn top_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Top(_)))
            .count()
    }

    pub fn submitted(&self) -> Vec<SubmitScoreRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Submit(request, _) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn next_top(&self) -> Scripted<Vec<LeaderboardEntry>> {
        if let Some(reply) = self.top.lock().unwrap().pop_front() {
            return reply;
        }
        match self.top_fallback.lock().unwrap().clone() {
            Some(entries) => Scripted::ok(entries),
            None => unscripted("top"),
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

async fn deliver<T>(reply: Scripted<T>) -> Result<T, ClientError> {
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    reply.result
}

fn unscripted<T>(endpoint: &str) -> Scripted<T> {
    Scripted::err(ClientError::Transport(format!("no scripted reply for {endpoint}")))
}

#[async_trait]
impl LeaderboardApi for ScriptedApi {
    async fn fetch_top(&self) -> Result<Vec<LeaderboardEntry>, ClientError> {
        self.record(Call::Top(Instant::now()));
        let reply = self.next_top();
        deliver(reply).await
    }

    async fn submit_score(
        &self,
        request: &SubmitScoreRequest,
    ) -> Result<SubmitScoreResponse, ClientError> {
        self.record(Call::Submit(request.clone(), Instant::now()));
        let reply = self.submits.lock().unwrap().pop_front();
        let reply = reply.unwrap_or_else(|| unscripted("submit"));
        deliver(reply).await
    }

    async fn fetch_rank(&self, user_id: UserId) -> Result<RankResult, ClientError> {
        self.record(Call::Rank(user_id, Instant::now()));
        let reply = self.ranks.lock().unwrap().pop_front();
        let reply = reply.unwrap_or_else(|| unscripted("rank"));
        deliver(reply).await
    }
}

pub fn entry(rank: u32, username: &str, total_score: u64) -> LeaderboardEntry {
    LeaderboardEntry {
        user_id: i64::from(rank) * 10,
        username: username.to_string(),
        total_score,
        rank,
    }
}

pub fn submitted(total_score: i64) -> SubmitScoreResponse {
    SubmitScoreResponse {
        total_score,
        message: Some("Score submitted successfully".to_string()),
    }
}

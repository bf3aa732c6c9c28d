//! leaderboard-client - client for a remote leaderboard scoring service
//!
//! Keeps a polled, stale-tolerant view of the top players, submits scores
//! under a username-derived id, and answers single-player rank queries.

pub mod leaderboard;
pub mod render;
pub mod types;

// Re-export main types for convenience
pub use leaderboard::{ClientBuilder, ClientConfig, ClientError, LeaderboardClient};
pub use types::{GameMode, LeaderboardEntry, LeaderboardSnapshot, RankResult};

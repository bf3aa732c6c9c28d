//! Core types and wire structures shared by the leaderboard client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric identifier of a player as understood by the scoring service.
pub type UserId = i64;

/// A single ranked row of the leaderboard, exactly as the service sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Player id (the service sends either `user_id` or `user`)
    #[serde(alias = "user")]
    pub user_id: UserId,
    /// Display name
    pub username: String,
    /// Sum of every submitted score
    pub total_score: u64,
    /// Server-assigned rank, starting at 1
    pub rank: u32,
}

/// Ordered leaderboard rows plus the moment they were received.
///
/// Row order is the server's rank order and is never changed locally.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardSnapshot {
    entries: Vec<LeaderboardEntry>,
    last_updated: DateTime<Utc>,
}

impl LeaderboardSnapshot {
    /// Wrap a freshly fetched sequence of rows.
    pub fn new(entries: Vec<LeaderboardEntry>) -> Self {
        Self {
            entries,
            last_updated: Utc::now(),
        }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Game modes accepted by the submit endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Classic,
    Solo,
    Team,
    Ranked,
    Casual,
}

impl GameMode {
    /// Wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Solo => "solo",
            GameMode::Team => "team",
            GameMode::Ranked => "ranked",
            GameMode::Casual => "casual",
        }
    }

    /// Returns all available modes.
    pub fn all() -> [GameMode; 5] {
        [
            GameMode::Classic,
            GameMode::Solo,
            GameMode::Team,
            GameMode::Ranked,
            GameMode::Casual,
        ]
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown game mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown game mode `{0}`")]
pub struct UnknownGameMode(pub String);

impl FromStr for GameMode {
    type Err = UnknownGameMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        GameMode::all()
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| UnknownGameMode(s.to_string()))
    }
}

/// Body of `POST /api/leaderboard/submit/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitScoreRequest {
    pub user_id: UserId,
    pub score: i64,
    pub game_mode: GameMode,
}

/// Successful reply to a score submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitScoreResponse {
    /// The player's new running total
    pub total_score: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply of `GET /api/leaderboard/rank/{user_id}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankResult {
    pub user_id: UserId,
    pub rank: u32,
}

/// Shape of a non-2xx response body. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Format a score with thousands separators, e.g. `1500` -> `1,500`.
pub fn format_score(score: u64) -> String {
    let digits = score.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_accepts_user_alias() {
        let json = r#"[{"user": 1, "username": "player1", "total_score": 1500, "rank": 1},
                       {"user_id": 2, "username": "player2", "total_score": 1200, "rank": 2}]"#;
        let entries: Vec<LeaderboardEntry> = serde_json::from_str(json).unwrap();

        assert_eq!(entries[0].user_id, 1);
        assert_eq!(entries[1].user_id, 2);
        assert_eq!(entries[1].username, "player2");
    }

    #[test]
    fn test_game_mode_wire_names() {
        let request = SubmitScoreRequest {
            user_id: 718,
            score: 500,
            game_mode: GameMode::Ranked,
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            serde_json::json!({"user_id": 718, "score": 500, "game_mode": "ranked"})
        );
    }

    #[test]
    fn test_game_mode_from_str() {
        assert_eq!("Team".parse::<GameMode>().unwrap(), GameMode::Team);
        assert_eq!(" casual ".parse::<GameMode>().unwrap(), GameMode::Casual);
        assert!("arcade".parse::<GameMode>().is_err());
        assert_eq!(GameMode::default(), GameMode::Classic);
    }

    #[test]
    fn test_error_body_tolerates_missing_field() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail": "nope"}"#).unwrap();
        assert!(body.error.is_none());
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0), "0");
        assert_eq!(format_score(999), "999");
        assert_eq!(format_score(1500), "1,500");
        assert_eq!(format_score(1234567), "1,234,567");
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let snapshot = LeaderboardSnapshot::new(vec![
            LeaderboardEntry { user_id: 9, username: "x".into(), total_score: 1000, rank: 1 },
            LeaderboardEntry { user_id: 3, username: "y".into(), total_score: 500, rank: 2 },
        ]);

        let names: Vec<_> = snapshot.entries().iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.is_empty());
    }
}

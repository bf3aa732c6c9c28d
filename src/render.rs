//! Plain-text views of component state, used by the shell binary.

use crate::leaderboard::{RankState, StatusMessage, SyncPhase, SyncState};
use crate::types::format_score;
use std::fmt::Write;

pub const LEADERBOARD_TITLE: &str = "Top Players";
pub const LOADING_TEXT: &str = "Loading leaderboard...";
pub const EMPTY_TEXT: &str = "No players yet!";

/// Render the leaderboard in server order.
pub fn render_leaderboard(state: &SyncState) -> String {
    let mut out = format!("{LEADERBOARD_TITLE}\n");

    let Some(snapshot) = &state.snapshot else {
        match &state.phase {
            SyncPhase::Error(message) => out.push_str(message),
            _ => out.push_str(LOADING_TEXT),
        }
        return out;
    };

    if snapshot.is_empty() {
        out.push_str(EMPTY_TEXT);
        out.push('\n');
    }
    for entry in snapshot.entries() {
        // writing to a String cannot fail
        let _ = writeln!(
            out,
            "#{:<4} {:<20} {:>12}",
            entry.rank,
            entry.username,
            format_score(entry.total_score)
        );
    }

    if let Some(message) = state.error() {
        let _ = writeln!(out, "{message} (showing last good data)");
    }
    let _ = write!(
        out,
        "Last updated: {}",
        snapshot.last_updated().format("%H:%M:%S")
    );
    out
}

pub fn render_rank(state: &RankState) -> String {
    match state {
        RankState::Idle => String::new(),
        RankState::Searching { user_id } => format!("Searching for user {user_id}..."),
        RankState::Found(result) => format!("User ID: {}\nRank: #{}", result.user_id, result.rank),
        RankState::NotFound | RankState::Error(_) => {
            state.message().unwrap_or_default().to_string()
        }
    }
}

pub fn render_status(status: &StatusMessage) -> String {
    match status {
        StatusMessage::Success(text) => text.clone(),
        StatusMessage::Error(text) => format!("Error: {text}"),
    }
}

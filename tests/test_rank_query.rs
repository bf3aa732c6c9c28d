//! RankQuery state transitions and error mapping.

mod common;

use common::{Scripted, ScriptedApi};
use leaderboard_client::leaderboard::{ClientError, RankQuery, RankState};
use leaderboard_client::types::RankResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn test_found() {
    let api = ScriptedApi::new();
    api.push_rank(Scripted::ok(RankResult { user_id: 1, rank: 5 }));
    let query = RankQuery::new(api.clone());

    let result = query.query("1").await.unwrap();

    assert_eq!(result.rank, 5);
    assert_eq!(query.state(), RankState::Found(RankResult { user_id: 1, rank: 5 }));
}

#[tokio::test]
async fn test_not_found_clears_previous_result() {
    let api = ScriptedApi::new();
    api.push_rank(Scripted::ok(RankResult { user_id: 1, rank: 5 }));
    api.push_rank(Scripted::err(ClientError::NotFound));
    let query = RankQuery::new(api.clone());

    query.query("1").await.unwrap();
    let err = query.query("999").await.unwrap_err();

    assert_eq!(err, ClientError::NotFound);
    let state = query.state();
    assert_eq!(state, RankState::NotFound);
    assert_eq!(state.message(), Some("User not found in leaderboard"));
    assert!(state.result().is_none());
}

#[tokio::test]
async fn test_other_failures_are_generic() {
    let api = ScriptedApi::new();
    api.push_rank(Scripted::ok(RankResult { user_id: 2, rank: 1 }));
    api.push_rank(Scripted::err(ClientError::Server {
        status: 500,
        message: Some("Internal server error".into()),
    }));
    api.push_rank(Scripted::err(ClientError::Transport("timed out".into())));
    let query = RankQuery::new(api.clone());

    query.query("2").await.unwrap();

    let _ = query.query("2").await;
    assert_eq!(query.state(), RankState::Error("Failed to fetch player rank".into()));

    let _ = query.query("2").await;
    assert_eq!(query.state().message(), Some("Failed to fetch player rank"));
    assert!(query.state().result().is_none());
}

#[tokio::test]
async fn test_invalid_input_rejected_locally() {
    let api = ScriptedApi::new();
    let query = RankQuery::new(api.clone());

    for input in ["", "   ", "abc", "12x", "0", "-5"] {
        let err = query.query(input).await.unwrap_err();
        assert_eq!(err, ClientError::Validation("Please enter a valid user ID".into()));
        assert_eq!(query.state().message(), Some("Please enter a valid user ID"));
    }
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_input_is_trimmed() {
    let api = ScriptedApi::new();
    api.push_rank(Scripted::ok(RankResult { user_id: 42, rank: 3 }));
    let query = RankQuery::new(api.clone());

    query.query(" 42 ").await.unwrap();

    assert!(matches!(api.calls()[0], common::Call::Rank(42, _)));
}

#[tokio::test(start_paused = true)]
async fn test_new_query_hides_old_result_immediately() {
    let api = ScriptedApi::new();
    api.push_rank(Scripted::ok(RankResult { user_id: 1, rank: 5 }));
    api.push_rank(Scripted::ok(RankResult { user_id: 2, rank: 9 }).after(Duration::from_secs(1)));
    let query = Arc::new(RankQuery::new(api.clone()));

    query.query("1").await.unwrap();

    let pending = tokio::spawn({
        let query = query.clone();
        async move { query.query("2").await }
    });
    sleep(Duration::from_millis(10)).await;
    assert_eq!(query.state(), RankState::Searching { user_id: 2 });

    pending.await.unwrap().unwrap();
    assert_eq!(query.state().result().unwrap().rank, 9);
}

#[tokio::test]
async fn test_clear_error_and_reset() {
    let api = ScriptedApi::new();
    api.push_rank(Scripted::ok(RankResult { user_id: 1, rank: 5 }));
    let query = RankQuery::new(api.clone());

    let _ = query.query("").await;
    query.clear_error();
    assert_eq!(query.state(), RankState::Idle);

    query.query("1").await.unwrap();
    // a result is not an error and stays put
    query.clear_error();
    assert!(query.state().result().is_some());

    query.reset();
    assert_eq!(query.state(), RankState::Idle);
}

//! Points, streaks, badges and leaderboards

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::assert_status;
use crate::common::{befriend, points_of, signup, TestApp};

#[tokio::test]
async fn test_check_in_once_per_day() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;

    let first = app.post("/api/streaks/check-in", &alice.token, json!({})).await;
    assert_status!(first, StatusCode::OK);
    assert_eq!(first.data()["already_checked_in"], false);
    assert_eq!(first.data()["points_awarded"], 5);
    assert_eq!(first.data()["streak"]["current_count"], 1);

    let second = app.post("/api/streaks/check-in", &alice.token, json!({})).await;
    assert_eq!(second.body["message"], "Already checked in today");
    assert_eq!(second.data()["already_checked_in"], true);
    assert_eq!(second.data()["points_awarded"], 0);
    assert_eq!(points_of(&app, &alice).await, 5);

    let streaks = app.get("/api/streaks/me", &alice.token).await;
    let mut kinds: Vec<&str> = streaks
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["kind"].as_str().unwrap())
        .collect();
    kinds.sort_unstable();
    assert_eq!(kinds, vec!["check_in", "daily"]);

    let summary = app.get("/api/gamification/me", &alice.token).await;
    assert_eq!(summary.data()["points"], 5);
    assert_eq!(summary.data()["level"], 1);
    assert_eq!(summary.data()["current_streak"], 1);
    assert_eq!(summary.data()["global_rank"], 1);

    let history = app.get("/api/points/history", &alice.token).await;
    assert_eq!(history.data()["total"], 1);
    assert_eq!(history.data()["items"][0]["amount"], 5);

    let feed = app.get("/api/activity/me", &alice.token).await;
    assert_eq!(feed.data()["items"][0]["action"], "check_in");
}

#[tokio::test]
async fn test_badge_catalogue_is_public_and_progress_tracked() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let catalogue = app.request(Method::GET, "/api/badges", None, None).await;
    assert_status!(catalogue, StatusCode::OK);
    assert_eq!(catalogue.data().as_array().map(Vec::len), Some(7));

    befriend(&app, &alice, &bob).await;

    let badges = app.get("/api/badges/me", &alice.token).await;
    let social = badges
        .data()
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["key"] == "social_butterfly")
        .cloned()
        .expect("social_butterfly badge");
    assert_eq!(social["current_value"], 1);
    assert_eq!(social["level"], 1);

    let summary = app.get("/api/gamification/me", &bob.token).await;
    assert_eq!(summary.data()["badges_earned"], 1);
}

#[tokio::test]
async fn test_leaderboard_ranks_ties_equally() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let carol = signup(&app, "carol").await;

    app.post("/api/streaks/check-in", &alice.token, json!({})).await;

    let board = app.get("/api/leaderboard", &carol.token).await;
    assert_status!(board, StatusCode::OK);
    let rows: Vec<(String, i64)> = board
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["username"].as_str().unwrap().to_string(), e["rank"].as_i64().unwrap()))
        .collect();
    assert_eq!(
        rows,
        vec![("alice".to_string(), 1), ("bob".to_string(), 2), ("carol".to_string(), 2)]
    );

    let weekly = app.get("/api/leaderboard?period=weekly", &carol.token).await;
    assert_eq!(weekly.data().as_array().map(Vec::len), Some(1));

    befriend(&app, &bob, &carol).await;
    let friends = app.get("/api/leaderboard?scope=friends", &carol.token).await;
    let names: Vec<&str> = friends
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["bob", "carol"]);
    assert_eq!(friends.data()[0]["rank"], 1);
    assert_eq!(friends.data()[1]["rank"], 1);

    let streaks = app.get("/api/leaderboard/streaks", &carol.token).await;
    assert_eq!(streaks.data()[0]["username"], "alice");
    assert_eq!(streaks.data()[0]["score"], 1);
}

#[tokio::test]
async fn test_concurrent_badge_evaluation_awards_once() {
    use stride::backend::gamification::evaluate_badges;

    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    // a friendship the evaluator has not seen yet
    sqlx::query(
        r#"
        INSERT INTO friendships (id, requester_id, addressee_id, status, created_at, responded_at)
        VALUES ($1, $2, $3, 'accepted', $4, $4)
        "#,
    )
    .bind(uuid::Uuid::new_v4())
    .bind(alice.id)
    .bind(bob.id)
    .bind(chrono::Utc::now())
    .execute(app.pool())
    .await
    .unwrap();
    let before = points_of(&app, &alice).await;

    let (first, second) = tokio::join!(
        evaluate_badges(&app.state, alice.id),
        evaluate_badges(&app.state, alice.id)
    );
    let awarded: Vec<_> = first
        .unwrap()
        .into_iter()
        .chain(second.unwrap())
        .filter(|level_up| level_up.key == "social_butterfly")
        .collect();
    assert_eq!(awarded.len(), 1);
    assert_eq!(awarded[0].new_level, 1);
    assert_eq!(points_of(&app, &alice).await, before + 10);

    let again = evaluate_badges(&app.state, alice.id).await.unwrap();
    assert!(again.iter().all(|level_up| level_up.key != "social_butterfly"));
    assert_eq!(points_of(&app, &alice).await, before + 10);
}

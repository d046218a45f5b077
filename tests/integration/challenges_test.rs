//! Challenge tests: joining, progress, completion and standings

use assert_matches::assert_matches;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use stride::shared::event::ServerEvent;
use stride::shared::notifications::NotificationKind;

use crate::common::{grant_roles, points_of, signup, TestApp, TestUser};
use crate::{assert_error, assert_status};

fn challenge_body(title: &str, extra: Value) -> Value {
    let today = Utc::now().date_naive();
    let mut body = json!({
        "title": title,
        "target_value": 100.0,
        "unit": "km",
        "start_date": (today - Duration::days(1)).to_string(),
        "end_date": (today + Duration::days(30)).to_string(),
        "points_reward": 40,
    });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        body.extend(extra.clone());
    }
    body
}

async fn create_challenge(app: &TestApp, creator: &TestUser, body: Value) -> String {
    let response = app.post("/api/challenges", &creator.token, body).await;
    assert_status!(response, StatusCode::CREATED);
    response.data()["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_validation() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;

    let zero_target = app
        .post("/api/challenges", &alice.token, challenge_body("Zero", json!({ "target_value": 0 })))
        .await;
    assert_error!(zero_target, StatusCode::BAD_REQUEST, "target_value must be greater than 0");

    let today = Utc::now().date_naive();
    let backwards = app
        .post(
            "/api/challenges",
            &alice.token,
            challenge_body(
                "Backwards",
                json!({ "end_date": (today - Duration::days(5)).to_string() }),
            ),
        )
        .await;
    assert_error!(backwards, StatusCode::BAD_REQUEST, "end_date must not be before start_date");
}

#[tokio::test]
async fn test_join_progress_and_completion_reward() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let challenge_id = create_challenge(&app, &alice, challenge_body("100 km", json!({}))).await;
    let path = format!("/api/challenges/{}", challenge_id);

    let not_joined = app
        .post(&format!("{}/progress", path), &bob.token, json!({ "amount": 5.0 }))
        .await;
    assert_error!(not_joined, StatusCode::NOT_FOUND, "You have not joined this challenge");

    let joined = app.post(&format!("{}/join", path), &bob.token, json!({})).await;
    assert_status!(joined, StatusCode::CREATED);
    let twice = app.post(&format!("{}/join", path), &bob.token, json!({})).await;
    assert_error!(twice, StatusCode::CONFLICT, "Already joined this challenge");

    let negative = app
        .post(&format!("{}/progress", path), &bob.token, json!({ "amount": -1.0 }))
        .await;
    assert_error!(negative, StatusCode::BAD_REQUEST, "amount must be greater than 0");

    let partial = app
        .post(&format!("{}/progress", path), &bob.token, json!({ "amount": 60.0 }))
        .await;
    assert_eq!(partial.data()["just_completed"], false);
    assert_eq!(partial.data()["participant"]["progress"], 60.0);

    let mut events = app.state.hub.subscribe(bob.id);
    let finished = app
        .post(&format!("{}/progress", path), &bob.token, json!({ "amount": 50.0 }))
        .await;
    assert_eq!(finished.data()["just_completed"], true);
    assert_eq!(finished.data()["points_awarded"], 40);
    // the reward plus the first challenger level
    assert_eq!(points_of(&app, &bob).await, 90);

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ServerEvent::NewNotification(notification) = event {
            kinds.push(notification.kind);
        }
    }
    assert_matches!(kinds.as_slice(), [.., NotificationKind::ChallengeCompleted]);
    assert!(kinds.contains(&NotificationKind::BadgeEarned));

    let after = app
        .post(&format!("{}/progress", path), &bob.token, json!({ "amount": 10.0 }))
        .await;
    assert_eq!(after.data()["just_completed"], false);
    assert_eq!(points_of(&app, &bob).await, 90);
}

#[tokio::test]
async fn test_completed_participant_cannot_leave_and_rejoin() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let challenge_id = create_challenge(
        &app,
        &alice,
        challenge_body("Sprint", json!({ "target_value": 10.0, "points_reward": 500 })),
    )
    .await;
    let path = format!("/api/challenges/{}", challenge_id);

    app.post(&format!("{}/join", path), &bob.token, json!({})).await;
    let done = app
        .post(&format!("{}/progress", path), &bob.token, json!({ "amount": 10.0 }))
        .await;
    assert_eq!(done.data()["points_awarded"], 500);
    let points = points_of(&app, &bob).await;

    let left = app.post(&format!("{}/leave", path), &bob.token, json!({})).await;
    assert_error!(left, StatusCode::CONFLICT, "Completed challenges cannot be left");
    let rejoin = app.post(&format!("{}/join", path), &bob.token, json!({})).await;
    assert_error!(rejoin, StatusCode::CONFLICT, "Already joined this challenge");

    let again = app
        .post(&format!("{}/progress", path), &bob.token, json!({ "amount": 10.0 }))
        .await;
    assert_eq!(again.data()["just_completed"], false);
    assert_eq!(again.data()["points_awarded"], 0);
    assert_eq!(points_of(&app, &bob).await, points);

    // still listed as a finisher
    let board = app.get(&format!("{}/leaderboard", path), &alice.token).await;
    assert_eq!(board.data()[0]["username"], "bob");
    assert_eq!(board.data()[0]["completed"], true);
}

#[tokio::test]
async fn test_military_only_and_private_visibility() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let carol = signup(&app, "carol").await;
    grant_roles(&app, &carol, &["user", "military"]).await;

    let military = create_challenge(
        &app,
        &alice,
        challenge_body("Ruck march", json!({ "military_only": true })),
    )
    .await;
    let by_bob = app
        .post(&format!("/api/challenges/{}/join", military), &bob.token, json!({}))
        .await;
    assert_error!(by_bob, StatusCode::FORBIDDEN, "This challenge is limited to military members");
    let by_carol = app
        .post(&format!("/api/challenges/{}/join", military), &carol.token, json!({}))
        .await;
    assert_status!(by_carol, StatusCode::CREATED);

    let private = create_challenge(
        &app,
        &alice,
        challenge_body("Secret", json!({ "is_public": false })),
    )
    .await;
    let hidden = app.get(&format!("/api/challenges/{}", private), &bob.token).await;
    assert_error!(hidden, StatusCode::NOT_FOUND, "Challenge not found");

    let listing = app.get("/api/challenges", &bob.token).await;
    assert_eq!(listing.data()["total"], 1);

    let edit = app
        .patch(&format!("/api/challenges/{}", military), &bob.token, json!({ "title": "Mine" }))
        .await;
    assert_error!(edit, StatusCode::FORBIDDEN, "Only the creator can change this challenge");
}

#[tokio::test]
async fn test_leaderboard_orders_by_progress() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let carol = signup(&app, "carol").await;
    let challenge_id = create_challenge(&app, &alice, challenge_body("Steps", json!({}))).await;
    let path = format!("/api/challenges/{}", challenge_id);

    for (user, amount) in [(&alice, 20.0), (&bob, 70.0), (&carol, 45.0)] {
        app.post(&format!("{}/join", path), &user.token, json!({})).await;
        app.post(&format!("{}/progress", path), &user.token, json!({ "amount": amount }))
            .await;
    }

    let board = app.get(&format!("{}/leaderboard", path), &alice.token).await;
    assert_status!(board, StatusCode::OK);
    let names: Vec<&str> = board
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["bob", "carol", "alice"]);
    assert_eq!(board.data()[2]["rank"], 3);

    let left = app.post(&format!("{}/leave", path), &carol.token, json!({})).await;
    assert_status!(left, StatusCode::OK);
    let board = app.get(&format!("{}/leaderboard", path), &alice.token).await;
    assert_eq!(board.data().as_array().map(Vec::len), Some(2));
}

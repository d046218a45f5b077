//! Notification inbox counters and the friends activity feed

use std::time::Duration;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{befriend, signup, TestApp, TestUser};
use crate::{assert_error, assert_status};

async fn unread(app: &TestApp, user: &TestUser) -> i64 {
    let response = app.get("/api/notifications/unread-count", &user.token).await;
    assert_status!(response, StatusCode::OK);
    response.data()["unread"].as_i64().unwrap()
}

async fn request_friendship(app: &TestApp, from: &TestUser, to: &TestUser) {
    let sent = app
        .post("/api/friends/requests", &from.token, json!({ "user_id": to.id }))
        .await;
    assert_status!(sent, StatusCode::CREATED);
}

#[tokio::test]
async fn test_unread_count_follows_reads() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let carol = signup(&app, "carol").await;
    let dave = signup(&app, "dave").await;
    assert_eq!(unread(&app, &alice).await, 0);

    request_friendship(&app, &bob, &alice).await;
    request_friendship(&app, &carol, &alice).await;
    assert_eq!(unread(&app, &alice).await, 2);

    let inbox = app.get("/api/notifications?unread_only=true", &alice.token).await;
    assert_eq!(inbox.data()["total"], 2);
    let first_id = inbox.data()["items"][0]["id"].as_str().unwrap().to_string();

    let stranger = app
        .patch(&format!("/api/notifications/{}/read", first_id), &bob.token, json!({}))
        .await;
    assert_error!(stranger, StatusCode::NOT_FOUND, "Notification not found");

    let read = app
        .patch(&format!("/api/notifications/{}/read", first_id), &alice.token, json!({}))
        .await;
    assert_status!(read, StatusCode::OK);
    assert_eq!(read.data()["is_read"], true);
    assert_ne!(read.data()["read_at"], Value::Null);
    assert_eq!(unread(&app, &alice).await, 1);

    let all = app.post("/api/notifications/read-all", &alice.token, json!({})).await;
    assert_status!(all, StatusCode::OK);
    assert_eq!(all.data()["updated"], 1);
    assert_eq!(unread(&app, &alice).await, 0);

    let again = app.post("/api/notifications/read-all", &alice.token, json!({})).await;
    assert_eq!(again.data()["updated"], 0);

    request_friendship(&app, &dave, &alice).await;
    assert_eq!(unread(&app, &alice).await, 1);
    let everything = app.get("/api/notifications", &alice.token).await;
    assert_eq!(everything.data()["total"], 3);
}

#[tokio::test]
async fn test_friends_feed_lists_only_friends_newest_first() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let carol = signup(&app, "carol").await;
    let dave = signup(&app, "dave").await;

    befriend(&app, &alice, &bob).await;
    befriend(&app, &alice, &carol).await;
    request_friendship(&app, &dave, &alice).await;

    for user in [&bob, &carol, &dave, &alice] {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let checked_in = app.post("/api/streaks/check-in", &user.token, json!({})).await;
        assert_status!(checked_in, StatusCode::OK);
    }

    let feed = app.get("/api/activity/feed", &alice.token).await;
    assert_status!(feed, StatusCode::OK);
    assert_eq!(feed.data()["total"], 4);
    let items = feed.data()["items"].as_array().unwrap().clone();
    let entries: Vec<(&str, &str)> = items
        .iter()
        .map(|e| (e["username"].as_str().unwrap(), e["action"].as_str().unwrap()))
        .collect();
    assert_eq!(&entries[..2], &[("carol", "check_in"), ("bob", "check_in")]);
    assert!(entries.iter().all(|(name, _)| *name == "bob" || *name == "carol"));

    let second_page = app.get("/api/activity/feed?page=2&limit=2", &alice.token).await;
    assert_eq!(second_page.data()["page"], 2);
    assert_eq!(second_page.data()["total"], 4);
    let actions: Vec<&str> = second_page.data()["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["friend_added", "friend_added"]);

    // a pending request is not a friendship
    let dave_feed = app.get("/api/activity/feed", &dave.token).await;
    assert_eq!(dave_feed.data()["total"], 0);
}

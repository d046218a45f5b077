//! Friend request, friendship and block tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{befriend, signup, TestApp};
use crate::{assert_error, assert_status};

#[tokio::test]
async fn test_request_accept_flow() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let sent = app
        .post(
            "/api/friends/requests",
            &alice.token,
            json!({ "username": "bob", "message": "hi" }),
        )
        .await;
    assert_status!(sent, StatusCode::CREATED);
    assert_eq!(sent.data()["status"], "pending");

    let incoming = app.get("/api/friends/requests", &bob.token).await;
    assert_eq!(incoming.data().as_array().map(Vec::len), Some(1));
    assert_eq!(incoming.data()[0]["username"], "alice");

    let outgoing = app.get("/api/friends/requests/sent", &alice.token).await;
    assert_eq!(outgoing.data()[0]["username"], "bob");

    let notifications = app.get("/api/notifications", &bob.token).await;
    assert_eq!(notifications.data()["items"][0]["kind"], "friend_request");

    let request_id = sent.data()["id"].as_str().unwrap().to_string();
    let by_sender = app
        .post(
            "/api/friends/respond",
            &alice.token,
            json!({ "request_id": request_id, "accept": true }),
        )
        .await;
    assert_status!(by_sender, StatusCode::FORBIDDEN);

    let accepted = app
        .post(
            "/api/friends/respond",
            &bob.token,
            json!({ "request_id": request_id, "accept": true }),
        )
        .await;
    assert_status!(accepted, StatusCode::OK);
    assert_eq!(accepted.data()["status"], "accepted");

    let friends = app.get("/api/friends", &alice.token).await;
    assert_eq!(friends.data()[0]["username"], "bob");

    let again = app
        .post(
            "/api/friends/respond",
            &bob.token,
            json!({ "request_id": request_id, "accept": false }),
        )
        .await;
    assert_error!(again, StatusCode::CONFLICT, "Friend request is no longer pending");
}

#[tokio::test]
async fn test_request_validation() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let to_self = app
        .post("/api/friends/requests", &alice.token, json!({ "user_id": alice.id }))
        .await;
    assert_status!(to_self, StatusCode::BAD_REQUEST);

    let unknown = app
        .post("/api/friends/requests", &alice.token, json!({ "username": "nobody" }))
        .await;
    assert_status!(unknown, StatusCode::NOT_FOUND);

    let first = app
        .post("/api/friends/requests", &alice.token, json!({ "user_id": bob.id }))
        .await;
    assert_status!(first, StatusCode::CREATED);

    let duplicate = app
        .post("/api/friends/requests", &alice.token, json!({ "user_id": bob.id }))
        .await;
    assert_error!(duplicate, StatusCode::CONFLICT, "A friend request is already pending");

    let reverse = app
        .post("/api/friends/requests", &bob.token, json!({ "user_id": alice.id }))
        .await;
    assert_status!(reverse, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_and_unfriend() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let carol = signup(&app, "carol").await;

    let sent = app
        .post("/api/friends/requests", &alice.token, json!({ "user_id": carol.id }))
        .await;
    let request_id = sent.data()["id"].as_str().unwrap().to_string();

    let by_other = app
        .delete(&format!("/api/friends/requests/{}", request_id), &carol.token)
        .await;
    assert_status!(by_other, StatusCode::NOT_FOUND);

    let canceled = app
        .delete(&format!("/api/friends/requests/{}", request_id), &alice.token)
        .await;
    assert_status!(canceled, StatusCode::OK);
    let incoming = app.get("/api/friends/requests", &carol.token).await;
    assert_eq!(incoming.data(), &json!([]));

    befriend(&app, &alice, &bob).await;
    let removed = app.delete(&format!("/api/friends/{}", bob.id), &bob.token).await;
    assert_error!(removed, StatusCode::NOT_FOUND, "Not friends with this user");

    let removed = app.delete(&format!("/api/friends/{}", bob.id), &alice.token).await;
    assert_status!(removed, StatusCode::OK);
    let friends = app.get("/api/friends", &bob.token).await;
    assert_eq!(friends.data(), &json!([]));
}

#[tokio::test]
async fn test_block_prevents_requests() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    befriend(&app, &alice, &bob).await;

    let blocked = app
        .post(&format!("/api/friends/{}/block", bob.id), &alice.token, json!({}))
        .await;
    assert_status!(blocked, StatusCode::OK);
    assert_eq!(blocked.data()["status"], "blocked");

    let friends = app.get("/api/friends", &alice.token).await;
    assert_eq!(friends.data(), &json!([]));

    let from_bob = app
        .post("/api/friends/requests", &bob.token, json!({ "user_id": alice.id }))
        .await;
    assert_status!(from_bob, StatusCode::FORBIDDEN);

    let self_block = app
        .post(&format!("/api/friends/{}/block", alice.id), &alice.token, json!({}))
        .await;
    assert_status!(self_block, StatusCode::BAD_REQUEST);
}

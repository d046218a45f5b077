//! Websocket entry point and frame dispatch

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use stride::backend::middleware::AuthenticatedUser;
use stride::backend::realtime::socket::dispatch;
use stride::shared::ServerEvent;

use crate::common::{befriend, signup, TestApp, TestUser};
use crate::assert_error;

fn socket_user(user: &TestUser) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: user.id,
        email: format!("{}@example.com", user.username),
        username: user.username.clone(),
        roles: vec!["user".to_string()],
    }
}

#[tokio::test]
async fn test_ws_requires_token_before_upgrade() {
    let app = TestApp::new().await;

    let missing = app.request(Method::GET, "/ws", None, None).await;
    assert_error!(missing, StatusCode::UNAUTHORIZED, "Missing authentication token");

    let forged = app.request(Method::GET, "/ws?token=garbage", None, None).await;
    assert_error!(forged, StatusCode::UNAUTHORIZED, "Invalid or expired token");

    // a valid token gets past authentication; the plain request cannot upgrade
    let alice = signup(&app, "alice").await;
    let plain = app
        .request(Method::GET, &format!("/ws?token={}", alice.token), None, None)
        .await;
    assert!(plain.status.is_client_error());
    assert_ne!(plain.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_frames_reach_the_other_participant() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    befriend(&app, &alice, &bob).await;

    let chat = app
        .post("/api/chats/direct", &alice.token, json!({ "user_id": bob.id }))
        .await;
    let chat_id = chat.data()["id"].as_str().unwrap().to_string();

    let mut bob_room = app.state.hub.subscribe(bob.id);
    let alice_user = socket_user(&alice);

    let pong = dispatch(&app.state, &alice_user, r#"{"event":"ping"}"#).await;
    assert_eq!(pong, Some(ServerEvent::Pong));

    let frame = json!({ "event": "sendMessage", "data": { "chat_id": chat_id, "content": "on my way" } });
    let reply = dispatch(&app.state, &alice_user, &frame.to_string()).await;
    assert_eq!(reply, None);
    assert_matches!(bob_room.try_recv(), Ok(ServerEvent::NewMessage(m)) if m.content == "on my way");

    let typing = json!({ "event": "typing", "data": { "chat_id": chat_id } });
    assert_eq!(dispatch(&app.state, &alice_user, &typing.to_string()).await, None);
    assert_matches!(
        bob_room.try_recv(),
        Ok(ServerEvent::UserTyping { is_typing: true, ref username, .. }) if username == "alice"
    );

    let history = app
        .get(&format!("/api/chats/{}/messages", chat_id), &bob.token)
        .await;
    assert_eq!(history.data()[0]["content"], "on my way");
}

#[tokio::test]
async fn test_outsider_frames_answer_error() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let carol = signup(&app, "carol").await;
    befriend(&app, &alice, &bob).await;
    let chat = app
        .post("/api/chats/direct", &alice.token, json!({ "user_id": bob.id }))
        .await;
    let chat_id = chat.data()["id"].as_str().unwrap().to_string();

    let frame = json!({ "event": "sendMessage", "data": { "chat_id": chat_id, "content": "hi" } });
    let reply = dispatch(&app.state, &socket_user(&carol), &frame.to_string()).await;
    assert_matches!(reply, Some(ServerEvent::Error { .. }));

    let garbage = dispatch(&app.state, &socket_user(&carol), "{").await;
    assert_matches!(garbage, Some(ServerEvent::Error { ref message }) if message.starts_with("Invalid event"));
}

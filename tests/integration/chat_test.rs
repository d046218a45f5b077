//! Chat REST tests, including the events each mutation broadcasts

use assert_matches::assert_matches;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use stride::shared::ServerEvent;

use crate::common::{befriend, grant_roles, signup, TestApp, TestUser};
use crate::{assert_error, assert_status};

async fn direct_chat(app: &TestApp, a: &TestUser, b: &TestUser) -> String {
    let response = app
        .post("/api/chats/direct", &a.token, json!({ "user_id": b.id }))
        .await;
    assert_status!(response, StatusCode::CREATED);
    response.data()["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_direct_chat_requires_friendship_and_is_idempotent() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let strangers = app
        .post("/api/chats/direct", &alice.token, json!({ "user_id": bob.id }))
        .await;
    assert_error!(strangers, StatusCode::FORBIDDEN, "You can only message friends");

    befriend(&app, &alice, &bob).await;
    let first = direct_chat(&app, &alice, &bob).await;
    let second = direct_chat(&app, &bob, &alice).await;
    assert_eq!(first, second);

    let to_self = app
        .post("/api/chats/direct", &alice.token, json!({ "user_id": alice.id }))
        .await;
    assert_status!(to_self, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_messages_unread_and_read_receipts() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let carol = signup(&app, "carol").await;
    befriend(&app, &alice, &bob).await;
    let chat_id = direct_chat(&app, &alice, &bob).await;

    let mut bob_room = app.state.hub.subscribe(bob.id);

    for text in ["hello", "are you there?"] {
        let sent = app
            .post(
                &format!("/api/chats/{}/messages", chat_id),
                &alice.token,
                json!({ "content": text }),
            )
            .await;
        assert_status!(sent, StatusCode::CREATED);
    }
    assert_matches!(bob_room.try_recv(), Ok(ServerEvent::NewMessage(m)) if m.content == "hello");
    assert_matches!(bob_room.try_recv(), Ok(ServerEvent::NewMessage(_)));

    let messages = app
        .get(&format!("/api/chats/{}/messages", chat_id), &bob.token)
        .await;
    assert_status!(messages, StatusCode::OK);
    assert_eq!(messages.data()[0]["content"], "are you there?");
    assert_eq!(messages.data()[1]["content"], "hello");

    let chats = app.get("/api/chats", &bob.token).await;
    assert_eq!(chats.data()[0]["unread_count"], 2);
    assert_eq!(chats.data()[0]["last_message"]["content"], "are you there?");

    let outsider = app
        .get(&format!("/api/chats/{}", chat_id), &carol.token)
        .await;
    assert_status!(outsider, StatusCode::FORBIDDEN);

    let receipt = app
        .request(
            axum::http::Method::POST,
            &format!("/api/chats/{}/read", chat_id),
            Some(&bob.token),
            None,
        )
        .await;
    assert_status!(receipt, StatusCode::OK);
    assert_eq!(receipt.data()["messages_marked"], 2);
    assert_matches!(bob_room.try_recv(), Ok(ServerEvent::MessagesRead(r)) if r.user_id == bob.id);

    let chats = app.get("/api/chats", &bob.token).await;
    assert_eq!(chats.data()[0]["unread_count"], 0);
}

#[tokio::test]
async fn test_edit_delete_and_reactions() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let moderator = signup(&app, "mod").await;
    grant_roles(&app, &moderator, &["user", "moderator"]).await;
    befriend(&app, &alice, &bob).await;
    let chat_id = direct_chat(&app, &alice, &bob).await;

    let sent = app
        .post(
            &format!("/api/chats/{}/messages", chat_id),
            &alice.token,
            json!({ "content": "first draft" }),
        )
        .await;
    let message_id = sent.data()["id"].as_str().unwrap().to_string();
    let path = format!("/api/messages/{}", message_id);

    let by_bob = app.patch(&path, &bob.token, json!({ "content": "hijack" })).await;
    assert_status!(by_bob, StatusCode::FORBIDDEN);

    let edited = app.patch(&path, &alice.token, json!({ "content": "final" })).await;
    assert_status!(edited, StatusCode::OK);
    assert_eq!(edited.data()["is_edited"], true);

    let reactions = format!("{}/reactions", path);
    app.post(&reactions, &bob.token, json!({ "emoji": "👍" })).await;
    let both = app.post(&reactions, &alice.token, json!({ "emoji": "👍" })).await;
    assert_status!(both, StatusCode::OK);
    assert_eq!(both.data()[0]["count"], 2);

    let removed = app
        .request(
            axum::http::Method::DELETE,
            &reactions,
            Some(&bob.token),
            Some(json!({ "emoji": "👍" })),
        )
        .await;
    assert_eq!(removed.data()[0]["count"], 1);

    let missing = app
        .request(
            axum::http::Method::DELETE,
            &reactions,
            Some(&bob.token),
            Some(json!({ "emoji": "👍" })),
        )
        .await;
    assert_status!(missing, StatusCode::NOT_FOUND);

    let by_bob = app.delete(&path, &bob.token).await;
    assert_status!(by_bob, StatusCode::FORBIDDEN);

    let by_moderator = app.delete(&path, &moderator.token).await;
    assert_status!(by_moderator, StatusCode::OK);

    let twice = app.delete(&path, &alice.token).await;
    assert_status!(twice, StatusCode::NOT_FOUND);

    let edit_deleted = app.patch(&path, &alice.token, json!({ "content": "again" })).await;
    assert_status!(edit_deleted, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_group_chat_and_typing() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let carol = signup(&app, "carol").await;
    befriend(&app, &alice, &bob).await;

    let with_stranger = app
        .post(
            "/api/chats/group",
            &alice.token,
            json!({ "name": "Runs", "participant_ids": [bob.id, carol.id] }),
        )
        .await;
    assert_error!(with_stranger, StatusCode::FORBIDDEN, "Group chats can only include friends");

    let created = app
        .post(
            "/api/chats/group",
            &alice.token,
            json!({ "name": "Runs", "participant_ids": [bob.id] }),
        )
        .await;
    assert_status!(created, StatusCode::CREATED);
    let chat_id = created.data()["id"].as_str().unwrap().to_string();

    let mut alice_room = app.state.hub.subscribe(alice.id);
    let mut bob_room = app.state.hub.subscribe(bob.id);

    let typing = app
        .post(&format!("/api/chats/{}/typing", chat_id), &alice.token, json!({}))
        .await;
    assert_status!(typing, StatusCode::OK);
    assert_matches!(
        bob_room.try_recv(),
        Ok(ServerEvent::UserTyping { is_typing: true, ref username, .. }) if username == "alice"
    );
    assert!(alice_room.try_recv().is_err());
}

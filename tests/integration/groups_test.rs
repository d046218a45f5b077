//! Group API tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{signup, TestApp, TestUser};
use crate::{assert_error, assert_status};

async fn create_group(app: &TestApp, owner: &TestUser, name: &str, private: bool) -> String {
    let response = app
        .post(
            "/api/groups",
            &owner.token,
            json!({ "name": name, "description": "weekly runs", "is_private": private }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    response.data()["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_join_leave_keeps_chat_in_sync() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let group_id = create_group(&app, &alice, "Runners", false).await;
    let group = app.get(&format!("/api/groups/{}", group_id), &bob.token).await;
    assert_eq!(group.data()["member_count"], 1);
    let chat_id = group.data()["chat_id"].as_str().unwrap().to_string();

    let joined = app
        .post(&format!("/api/groups/{}/join", group_id), &bob.token, json!({}))
        .await;
    assert_status!(joined, StatusCode::OK);
    assert_eq!(joined.data()["member_count"], 2);

    let again = app
        .post(&format!("/api/groups/{}/join", group_id), &bob.token, json!({}))
        .await;
    assert_error!(again, StatusCode::CONFLICT, "Already a member of this group");

    let chat = app.get(&format!("/api/chats/{}", chat_id), &bob.token).await;
    assert_status!(chat, StatusCode::OK);

    let owner_inbox = app.get("/api/notifications", &alice.token).await;
    assert_eq!(owner_inbox.data()["items"][0]["kind"], "group_joined");

    let owner_leaves = app
        .post(&format!("/api/groups/{}/leave", group_id), &alice.token, json!({}))
        .await;
    assert_status!(owner_leaves, StatusCode::BAD_REQUEST);

    let left = app
        .post(&format!("/api/groups/{}/leave", group_id), &bob.token, json!({}))
        .await;
    assert_status!(left, StatusCode::OK);

    let chat = app.get(&format!("/api/chats/{}", chat_id), &bob.token).await;
    assert_status!(chat, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_private_group_visibility() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let group_id = create_group(&app, &alice, "Secret", true).await;

    let hidden = app.get(&format!("/api/groups/{}", group_id), &bob.token).await;
    assert_error!(hidden, StatusCode::NOT_FOUND, "Group not found");

    let join = app
        .post(&format!("/api/groups/{}/join", group_id), &bob.token, json!({}))
        .await;
    assert_error!(join, StatusCode::FORBIDDEN, "This group is private");

    let listing = app.get("/api/groups", &bob.token).await;
    assert_eq!(listing.data()["total"], 0);

    let added = app
        .post(
            &format!("/api/groups/{}/members", group_id),
            &alice.token,
            json!({ "user_id": bob.id }),
        )
        .await;
    assert_status!(added, StatusCode::CREATED);
    assert_eq!(added.data().as_array().map(Vec::len), Some(2));

    let visible = app.get(&format!("/api/groups/{}", group_id), &bob.token).await;
    assert_status!(visible, StatusCode::OK);

    let mine = app.get("/api/groups/mine", &bob.token).await;
    assert_eq!(mine.data()[0]["name"], "Secret");
}

#[tokio::test]
async fn test_member_management_permissions() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let carol = signup(&app, "carol").await;

    let group_id = create_group(&app, &alice, "Climbers", false).await;
    app.post(&format!("/api/groups/{}/join", group_id), &bob.token, json!({}))
        .await;

    let by_member = app
        .post(
            &format!("/api/groups/{}/members", group_id),
            &bob.token,
            json!({ "user_id": carol.id }),
        )
        .await;
    assert_error!(by_member, StatusCode::FORBIDDEN, "Only group admins can do that");

    let rename = app
        .patch(&format!("/api/groups/{}", group_id), &bob.token, json!({ "name": "Mine" }))
        .await;
    assert_status!(rename, StatusCode::FORBIDDEN);

    let remove_owner = app
        .delete(&format!("/api/groups/{}/members/{}", group_id, alice.id), &alice.token)
        .await;
    assert_error!(remove_owner, StatusCode::BAD_REQUEST, "The group owner cannot be removed");

    let removed = app
        .delete(&format!("/api/groups/{}/members/{}", group_id, bob.id), &alice.token)
        .await;
    assert_status!(removed, StatusCode::OK);

    let delete_by_other = app.delete(&format!("/api/groups/{}", group_id), &carol.token).await;
    assert_status!(delete_by_other, StatusCode::FORBIDDEN);

    let deleted = app.delete(&format!("/api/groups/{}", group_id), &alice.token).await;
    assert_status!(deleted, StatusCode::OK);
    let gone = app.get(&format!("/api/groups/{}", group_id), &alice.token).await;
    assert_status!(gone, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_free_plan_group_limit() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;

    for i in 0..3 {
        create_group(&app, &alice, &format!("Group {}", i), false).await;
    }
    let fourth = app
        .post("/api/groups", &alice.token, json!({ "name": "One too many" }))
        .await;
    assert_error!(
        fourth,
        StatusCode::FORBIDDEN,
        "The free plan allows 3 groups. Upgrade to premium to create more"
    );
}

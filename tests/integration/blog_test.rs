//! Blog post, like and comment tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{grant_roles, points_of, signup, TestApp, TestUser};
use crate::{assert_error, assert_status};

async fn create_post(app: &TestApp, author: &TestUser, title: &str, publish: bool) -> String {
    let response = app
        .post(
            "/api/posts",
            &author.token,
            json!({ "title": title, "content": "body", "tags": ["Running", "running", "Life"], "publish": publish }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    response.data()["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_draft_visibility_and_publish_points_once() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let moderator = signup(&app, "mod").await;
    grant_roles(&app, &moderator, &["user", "moderator"]).await;

    let post_id = create_post(&app, &alice, "Week one", false).await;
    let path = format!("/api/posts/{}", post_id);

    let hidden = app.get(&path, &bob.token).await;
    assert_error!(hidden, StatusCode::NOT_FOUND, "Post not found");
    let for_moderator = app.get(&path, &moderator.token).await;
    assert_status!(for_moderator, StatusCode::OK);

    let published = app
        .post(&format!("{}/publish", path), &alice.token, json!({}))
        .await;
    assert_status!(published, StatusCode::OK);
    assert_eq!(published.data()["status"], "published");
    assert_eq!(published.data()["tags"], json!(["running", "life"]));
    // 10 for publishing plus the first storyteller badge level
    assert_eq!(points_of(&app, &alice).await, 35);

    let archived = app.patch(&path, &alice.token, json!({ "status": "archived" })).await;
    assert_eq!(archived.data()["status"], "archived");
    let republished = app.patch(&path, &alice.token, json!({ "status": "published" })).await;
    assert_eq!(republished.data()["status"], "published");
    assert_eq!(points_of(&app, &alice).await, 35);

    let again = app
        .post(&format!("{}/publish", path), &alice.token, json!({}))
        .await;
    assert_eq!(again.body["message"], "Post already published");

    let by_bob = app.patch(&path, &bob.token, json!({ "title": "mine now" })).await;
    assert_status!(by_bob, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_views_likes_and_listing() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let post_id = create_post(&app, &alice, "Tempo runs", true).await;
    create_post(&app, &alice, "Draft only", false).await;
    let path = format!("/api/posts/{}", post_id);

    let own_view = app.get(&path, &alice.token).await;
    assert_eq!(own_view.data()["view_count"], 0);
    let bob_view = app.get(&path, &bob.token).await;
    assert_eq!(bob_view.data()["view_count"], 1);

    for _ in 0..2 {
        let liked = app.post(&format!("{}/like", path), &bob.token, json!({})).await;
        assert_status!(liked, StatusCode::OK);
        assert_eq!(liked.data()["like_count"], 1);
    }
    let self_like = app.post(&format!("{}/like", path), &alice.token, json!({})).await;
    assert_eq!(self_like.data()["like_count"], 2);

    let likes_notified = app.get("/api/notifications", &alice.token).await;
    let liked_kinds = likes_notified.data()["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["kind"] == "post_liked")
        .count();
    assert_eq!(liked_kinds, 1);

    let unliked = app.delete(&format!("{}/like", path), &bob.token).await;
    assert_eq!(unliked.data()["like_count"], 1);
    assert_eq!(unliked.data()["liked"], false);

    let listing = app.get("/api/posts?tag=RUNNING", &bob.token).await;
    assert_eq!(listing.data()["total"], 1);
    assert_eq!(listing.data()["items"][0]["title"], "Tempo runs");

    let by_author = app
        .get(&format!("/api/posts?author_id={}", bob.id), &bob.token)
        .await;
    assert_eq!(by_author.data()["total"], 0);
}

#[tokio::test]
async fn test_comments_threading_and_moderation() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let post_id = create_post(&app, &alice, "Hill repeats", true).await;
    let other_post = create_post(&app, &alice, "Intervals", true).await;
    let draft = create_post(&app, &alice, "Unfinished", false).await;

    let on_draft = app
        .post(&format!("/api/posts/{}/comments", draft), &alice.token, json!({ "content": "hi" }))
        .await;
    assert_error!(on_draft, StatusCode::BAD_REQUEST, "Comments are only allowed on published posts");

    let root = app
        .post(&format!("/api/posts/{}/comments", post_id), &bob.token, json!({ "content": "Nice!" }))
        .await;
    assert_status!(root, StatusCode::CREATED);
    let root_id = root.data()["id"].as_str().unwrap().to_string();
    assert_eq!(points_of(&app, &bob).await, 2);

    let wrong_parent = app
        .post(
            &format!("/api/posts/{}/comments", other_post),
            &bob.token,
            json!({ "content": "reply", "parent_id": root_id }),
        )
        .await;
    assert_error!(wrong_parent, StatusCode::BAD_REQUEST, "Parent comment belongs to another post");

    let reply = app
        .post(
            &format!("/api/posts/{}/comments", post_id),
            &alice.token,
            json!({ "content": "Thanks", "parent_id": root_id }),
        )
        .await;
    assert_status!(reply, StatusCode::CREATED);

    let comments = app
        .get(&format!("/api/posts/{}/comments", post_id), &alice.token)
        .await;
    assert_eq!(comments.data()[0]["content"], "Nice!");
    assert_eq!(comments.data()[1]["parent_id"], root_id.as_str());

    let edit_by_alice = app
        .patch(&format!("/api/comments/{}", root_id), &alice.token, json!({ "content": "x" }))
        .await;
    assert_status!(edit_by_alice, StatusCode::FORBIDDEN);

    let edited = app
        .patch(&format!("/api/comments/{}", root_id), &bob.token, json!({ "content": "Very nice!" }))
        .await;
    assert_eq!(edited.data()["content"], "Very nice!");

    let deleted = app.delete(&format!("/api/comments/{}", root_id), &bob.token).await;
    assert_status!(deleted, StatusCode::OK);
    let comments = app
        .get(&format!("/api/posts/{}/comments", post_id), &alice.token)
        .await;
    assert_eq!(comments.data().as_array().map(Vec::len), Some(1));

    let post = app.get(&format!("/api/posts/{}", post_id), &alice.token).await;
    assert_eq!(post.data()["comment_count"], 1);
}

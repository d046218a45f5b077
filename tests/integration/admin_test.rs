//! Admin and moderation endpoints

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{grant_roles, signup, TestApp, TestUser};
use crate::{assert_error, assert_status};

async fn admin(app: &TestApp) -> TestUser {
    let admin = signup(app, "root").await;
    grant_roles(app, &admin, &["user", "admin"]).await;
    admin
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;

    let listing = app.get("/api/admin/users", &alice.token).await;
    assert_error!(listing, StatusCode::FORBIDDEN, "admin role required");

    let moderation = app
        .post(
            &format!("/api/moderation/posts/{}/remove", uuid::Uuid::new_v4()),
            &alice.token,
            json!({}),
        )
        .await;
    assert_error!(moderation, StatusCode::FORBIDDEN, "moderator role required");

    let anonymous = app
        .request(axum::http::Method::GET, "/api/admin/stats", None, None)
        .await;
    assert_status!(anonymous, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_roles_and_bans() {
    let app = TestApp::new().await;
    let root = admin(&app).await;
    let alice = signup(&app, "alice").await;

    let roles = app
        .put(
            &format!("/api/admin/users/{}/roles", alice.id),
            &root.token,
            json!({ "roles": ["Moderator", "military"] }),
        )
        .await;
    assert_status!(roles, StatusCode::OK);
    assert_eq!(roles.data()["roles"], json!(["user", "moderator", "military"]));

    let unknown = app
        .put(
            &format!("/api/admin/users/{}/roles", alice.id),
            &root.token,
            json!({ "roles": ["wizard"] }),
        )
        .await;
    assert_error!(unknown, StatusCode::BAD_REQUEST, "Unknown role: wizard");

    let demote_self = app
        .put(
            &format!("/api/admin/users/{}/roles", root.id),
            &root.token,
            json!({ "roles": ["user"] }),
        )
        .await;
    assert_error!(demote_self, StatusCode::BAD_REQUEST, "You cannot remove your own admin role");

    let self_ban = app
        .post(&format!("/api/admin/users/{}/ban", root.id), &root.token, json!({}))
        .await;
    assert_error!(self_ban, StatusCode::BAD_REQUEST, "You cannot ban yourself");

    let banned = app
        .post(
            &format!("/api/admin/users/{}/ban", alice.id),
            &root.token,
            json!({ "reason": "  spam  " }),
        )
        .await;
    assert_status!(banned, StatusCode::OK);
    assert_eq!(banned.data()["is_banned"], true);
    assert_eq!(banned.data()["ban_reason"], "spam");

    let locked_out = app.get("/api/auth/me", &alice.token).await;
    assert_error!(locked_out, StatusCode::FORBIDDEN, "Account is banned");

    let unbanned = app
        .post(&format!("/api/admin/users/{}/unban", alice.id), &root.token, json!({}))
        .await;
    assert_eq!(unbanned.data()["is_banned"], false);
    let back = app.get("/api/auth/me", &alice.token).await;
    assert_status!(back, StatusCode::OK);

    let search = app.get("/api/admin/users?search=ali", &root.token).await;
    assert_eq!(search.data()["total"], 1);
    assert_eq!(search.data()["items"][0]["username"], "alice");

    let logs = app.get("/api/admin/logs", &root.token).await;
    assert_eq!(logs.data()["total"], 3);
}

#[tokio::test]
async fn test_create_badge_and_broadcast() {
    let app = TestApp::new().await;
    let root = admin(&app).await;
    let alice = signup(&app, "alice").await;

    let bad = app
        .post(
            "/api/admin/badges",
            &root.token,
            json!({ "key": "x", "name": "X", "metric": "streak_days", "thresholds": [5, 3] }),
        )
        .await;
    assert_error!(
        bad,
        StatusCode::BAD_REQUEST,
        "thresholds must be non-empty, positive and strictly increasing"
    );

    let badge = json!({
        "key": "Marathoner",
        "name": "Marathoner",
        "metric": "goals_completed",
        "thresholds": [2, 4],
        "points_per_level": 30
    });
    let created = app.post("/api/admin/badges", &root.token, badge.clone()).await;
    assert_status!(created, StatusCode::CREATED);
    assert_eq!(created.data()["key"], "marathoner");
    let duplicate = app.post("/api/admin/badges", &root.token, badge).await;
    assert_status!(duplicate, StatusCode::CONFLICT);

    let sent = app
        .post(
            "/api/admin/broadcast",
            &root.token,
            json!({ "title": "Maintenance tonight", "body": "Back by 2am" }),
        )
        .await;
    assert_status!(sent, StatusCode::OK);
    assert_eq!(sent.data()["recipients"], 2);

    let inbox = app.get("/api/notifications", &alice.token).await;
    assert_eq!(inbox.data()["items"][0]["kind"], "announcement");
    assert_eq!(inbox.data()["items"][0]["data"]["from"], "root");

    let stats = app.get("/api/admin/stats", &root.token).await;
    assert_eq!(stats.data()["total_users"], 2);
    assert_eq!(stats.data()["banned_users"], 0);
}

#[tokio::test]
async fn test_moderators_remove_content() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let moderator = signup(&app, "mod").await;
    grant_roles(&app, &moderator, &["user", "moderator"]).await;

    let post = app
        .post(
            "/api/posts",
            &alice.token,
            json!({ "title": "Buy cheap watches", "content": "spam", "publish": true }),
        )
        .await;
    let post_id = post.data()["id"].as_str().unwrap().to_string();
    let comment = app
        .post(&format!("/api/posts/{}/comments", post_id), &bob.token, json!({ "content": "lol" }))
        .await;
    let comment_id = comment.data()["id"].as_str().unwrap().to_string();

    let removed_comment = app
        .post(
            &format!("/api/moderation/comments/{}/remove", comment_id),
            &moderator.token,
            json!({ "reason": "off topic" }),
        )
        .await;
    assert_status!(removed_comment, StatusCode::OK);

    let removed_post = app
        .post(
            &format!("/api/moderation/posts/{}/remove", post_id),
            &moderator.token,
            json!({ "reason": "spam" }),
        )
        .await;
    assert_status!(removed_post, StatusCode::OK);

    let gone = app.get(&format!("/api/posts/{}", post_id), &bob.token).await;
    assert_status!(gone, StatusCode::NOT_FOUND);
    let again = app
        .post(
            &format!("/api/moderation/posts/{}/remove", post_id),
            &moderator.token,
            json!({}),
        )
        .await;
    assert_error!(again, StatusCode::NOT_FOUND, "Post not found");
}

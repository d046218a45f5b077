//! Authentication and profile API tests

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{signup, TestApp, TEST_PASSWORD};
use crate::{assert_error, assert_status};

#[tokio::test]
async fn test_signup_returns_token_and_user() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "username": "alice", "email": "Alice@Example.com", "password": TEST_PASSWORD })),
        )
        .await;

    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["success"], true);
    let user = &response.data()["user"];
    assert_eq!(user["username"], "alice");
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["roles"], json!(["user"]));
    assert_eq!(user["level"], 1);
    assert!(response.data()["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_signup_rejects_duplicates_and_bad_input() {
    let app = TestApp::new().await;
    signup(&app, "alice").await;

    let taken = app
        .request(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "username": "alice", "email": "other@example.com", "password": TEST_PASSWORD })),
        )
        .await;
    assert_error!(taken, StatusCode::CONFLICT, "Username already taken");

    let email_taken = app
        .request(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "username": "alice2", "email": "alice@example.com", "password": TEST_PASSWORD })),
        )
        .await;
    assert_error!(email_taken, StatusCode::CONFLICT, "Email already registered");

    let short = app
        .request(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "username": "bob", "email": "bob@example.com", "password": "short" })),
        )
        .await;
    assert_error!(short, StatusCode::BAD_REQUEST, "Password must be at least 8 characters");
}

#[tokio::test]
async fn test_login_by_username_or_email() {
    let app = TestApp::new().await;
    signup(&app, "alice").await;

    for identifier in ["alice", "alice@example.com"] {
        let response = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "username": identifier, "password": TEST_PASSWORD })),
            )
            .await;
        assert_status!(response, StatusCode::OK);
        assert_eq!(response.data()["user"]["username"], "alice");
    }

    let wrong = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "not-the-password" })),
        )
        .await;
    assert_status!(wrong, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;

    let missing = app.request(Method::GET, "/api/auth/me", None, None).await;
    assert_error!(missing, StatusCode::UNAUTHORIZED, "Authentication required");

    let garbage = app.get("/api/auth/me", "not-a-jwt").await;
    assert_error!(garbage, StatusCode::UNAUTHORIZED, "Invalid or expired token");

    let me = app.get("/api/auth/me", &alice.token).await;
    assert_status!(me, StatusCode::OK);
    assert_eq!(me.data()["id"], alice.id.to_string());
}

#[tokio::test]
async fn test_profile_update_keeps_omitted_fields() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;

    let first = app
        .patch("/api/users/me", &alice.token, json!({ "display_name": "Alice", "bio": "Runner" }))
        .await;
    assert_status!(first, StatusCode::OK);

    let second = app
        .patch("/api/users/me", &alice.token, json!({ "bio": "<b>Cyclist</b>" }))
        .await;
    assert_status!(second, StatusCode::OK);
    assert_eq!(second.data()["display_name"], "Alice");
    assert_eq!(second.data()["bio"], "&lt;b&gt;Cyclist&lt;/b&gt;");

    let cleared = app.patch("/api/users/me", &alice.token, json!({ "display_name": "  " })).await;
    assert_eq!(cleared.data()["display_name"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_change_password_and_deactivate() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;

    let wrong = app
        .post(
            "/api/users/me/password",
            &alice.token,
            json!({ "current_password": "nope-nope", "new_password": "new_password_456" }),
        )
        .await;
    assert_error!(wrong, StatusCode::BAD_REQUEST, "Current password is incorrect");

    let changed = app
        .post(
            "/api/users/me/password",
            &alice.token,
            json!({ "current_password": TEST_PASSWORD, "new_password": "new_password_456" }),
        )
        .await;
    assert_status!(changed, StatusCode::OK);

    let login = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "new_password_456" })),
        )
        .await;
    assert_status!(login, StatusCode::OK);

    let deactivated = app.delete("/api/users/me", &alice.token).await;
    assert_status!(deactivated, StatusCode::OK);

    let me = app.get("/api/auth/me", &alice.token).await;
    assert_error!(me, StatusCode::UNAUTHORIZED, "Account is deactivated");
}

#[tokio::test]
async fn test_user_search_and_public_profile() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let albert = signup(&app, "albert").await;
    signup(&app, "bob").await;

    let found = app.get("/api/users/search?q=al", &alice.token).await;
    assert_status!(found, StatusCode::OK);
    assert_eq!(found.data()["total"], 2);

    let empty = app.get("/api/users/search?q=%20", &alice.token).await;
    assert_error!(empty, StatusCode::BAD_REQUEST, "Search query is required");

    let profile = app.get(&format!("/api/users/{}", albert.id), &alice.token).await;
    assert_status!(profile, StatusCode::OK);
    assert_eq!(profile.data()["username"], "albert");
    assert!(profile.data().get("email").is_none());
}

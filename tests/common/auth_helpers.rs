//! Account helpers: sign users up through the API and adjust roles directly

use serde_json::json;
use uuid::Uuid;

use super::app::TestApp;

pub const TEST_PASSWORD: &str = "test_password_123";

/// A signed-up user and their bearer token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

/// Create an account through `POST /api/auth/signup`
pub async fn signup(app: &TestApp, username: &str) -> TestUser {
    let response = app
        .request(
            axum::http::Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": TEST_PASSWORD,
            })),
        )
        .await;
    assert_eq!(
        response.status,
        axum::http::StatusCode::CREATED,
        "signup failed: {}",
        response.body
    );

    let data = response.data();
    TestUser {
        id: data["user"]["id"].as_str().and_then(|s| s.parse().ok()).expect("user id"),
        username: username.to_string(),
        token: data["token"].as_str().expect("token").to_string(),
    }
}

/// Overwrite a user's roles in the database; roles are read per request
pub async fn grant_roles(app: &TestApp, user: &TestUser, roles: &[&str]) {
    let roles = serde_json::to_string(roles).expect("roles serialize");
    sqlx::query("UPDATE users SET roles = $1 WHERE id = $2")
        .bind(roles)
        .bind(user.id)
        .execute(app.pool())
        .await
        .expect("Failed to update roles");
}

/// Send and accept a friend request between two users
pub async fn befriend(app: &TestApp, a: &TestUser, b: &TestUser) {
    let sent = app
        .post("/api/friends/requests", &a.token, json!({ "user_id": b.id }))
        .await;
    assert_eq!(sent.status, axum::http::StatusCode::CREATED, "body: {}", sent.body);
    let request_id = sent.data()["id"].as_str().expect("request id").to_string();

    let accepted = app
        .post(
            "/api/friends/respond",
            &b.token,
            json!({ "request_id": request_id, "accept": true }),
        )
        .await;
    assert_eq!(accepted.status, axum::http::StatusCode::OK, "body: {}", accepted.body);
}

/// Read a user's points total straight from the store
pub async fn points_of(app: &TestApp, user: &TestUser) -> i64 {
    sqlx::query_scalar("SELECT points FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(app.pool())
        .await
        .expect("points")
}

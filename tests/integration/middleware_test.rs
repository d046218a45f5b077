//! Router-wide behaviour: fallback, authentication, rate limiting and CORS

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use pretty_assertions::assert_eq;

use stride::backend::server::AppConfig;

use crate::common::{signup, TestApp, TEST_JWT_SECRET};
use crate::{assert_error, assert_status};

fn from_ip(path: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_unknown_route_returns_envelope() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/nope", None, None).await;
    assert_error!(response, StatusCode::NOT_FOUND, "Route not found");
    assert_eq!(response.body["status"], 404);
}

#[tokio::test]
async fn test_protected_routes_need_a_valid_token() {
    let app = TestApp::new().await;

    let missing = app.request(Method::GET, "/api/auth/me", None, None).await;
    assert_error!(missing, StatusCode::UNAUTHORIZED, "Authentication required");

    let forged = app.get("/api/auth/me", "not-a-jwt").await;
    assert_error!(forged, StatusCode::UNAUTHORIZED, "Invalid or expired token");

    let alice = signup(&app, "alice").await;
    let ok = app.get("/api/auth/me", &alice.token).await;
    assert_status!(ok, StatusCode::OK);
}

#[tokio::test]
async fn test_health_reports_database() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/health", None, None).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["database"], "ok");
}

#[tokio::test]
async fn test_rate_limit_per_client() {
    let config = AppConfig::builder()
        .jwt_secret(TEST_JWT_SECRET)
        .bcrypt_cost(4)
        .rate_limit(2, 60)
        .build()
        .unwrap();
    let app = TestApp::with_config(config).await;

    for _ in 0..2 {
        let response = app.send(from_ip("/api/badges", "10.0.0.1")).await;
        assert_status!(response, StatusCode::OK);
    }
    let limited = app.send(from_ip("/api/badges", "10.0.0.1")).await;
    assert_error!(limited, StatusCode::TOO_MANY_REQUESTS, "Too many requests, please slow down");
    let retry_after: u64 = limited.headers[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    let other_client = app.send(from_ip("/api/badges", "10.0.0.2")).await;
    assert_status!(other_client, StatusCode::OK);

    let health = app.send(from_ip("/api/health", "10.0.0.1")).await;
    assert_status!(health, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/health")
        .header(header::ORIGIN, "https://app.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

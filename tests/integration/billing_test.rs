//! Subscription plans, the signed billing webhook and plan limits

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use stride::backend::subscription::webhook::{signature_header, SIGNATURE_HEADER};

use crate::common::{signup, TestApp, TestResponse, TEST_WEBHOOK_SECRET};
use crate::{assert_error, assert_status};

async fn deliver(app: &TestApp, event: &Value, secret: &str) -> TestResponse {
    let payload = event.to_string();
    let signature = signature_header(secret, Utc::now().timestamp(), payload.as_bytes())
        .expect("hmac accepts any key");
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/webhooks/billing")
        .header(header::CONTENT_TYPE, "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(payload))
        .unwrap();
    app.send(request).await
}

fn checkout_event(id: &str, user_id: &str) -> Value {
    checkout_for(id, user_id, "sub_123")
}

fn checkout_for(id: &str, user_id: &str, subscription: &str) -> Value {
    json!({
        "id": id,
        "type": "checkout.session.completed",
        "data": { "object": {
            "client_reference_id": user_id,
            "customer": "cus_123",
            "subscription": subscription,
            "metadata": { "plan": "premium_yearly" }
        }}
    })
}

fn provider_event(id: &str, event_type: &str, object: Value) -> Value {
    json!({ "id": id, "type": event_type, "data": { "object": object } })
}

async fn stored_subscription(app: &TestApp, token: &str) -> Value {
    let overview = app.get("/api/subscriptions/me", token).await;
    assert_status!(overview, StatusCode::OK);
    overview.data()["subscription"].clone()
}

#[tokio::test]
async fn test_plans_are_public() {
    let app = TestApp::new().await;
    let plans = app
        .request(Method::GET, "/api/subscriptions/plans", None, None)
        .await;
    assert_status!(plans, StatusCode::OK);
    assert_eq!(plans.data()[0]["plan"], "free");
    assert_eq!(plans.data()[0]["max_active_goals"], 5);
    assert_eq!(plans.data()[1]["max_active_goals"], Value::Null);
}

#[tokio::test]
async fn test_rejects_bad_signatures() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let event = checkout_event("evt_bad", &alice.id.to_string());

    let wrong_secret = deliver(&app, &event, "whsec_other").await;
    assert_status!(wrong_secret, StatusCode::BAD_REQUEST);

    let unsigned = app
        .request(Method::POST, "/api/webhooks/billing", None, Some(event))
        .await;
    assert_error!(unsigned, StatusCode::BAD_REQUEST, "Missing signature header");

    let overview = app.get("/api/subscriptions/me", &alice.token).await;
    assert_eq!(overview.data()["plan"], "free");
}

#[tokio::test]
async fn test_checkout_activates_premium_once() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let event = checkout_event("evt_1", &alice.id.to_string());

    let first = deliver(&app, &event, TEST_WEBHOOK_SECRET).await;
    assert_status!(first, StatusCode::OK);
    assert_eq!(first.data()["handled"], true);
    assert_eq!(first.data()["duplicate"], false);

    let replay = deliver(&app, &event, TEST_WEBHOOK_SECRET).await;
    assert_eq!(replay.data()["duplicate"], true);

    let overview = app.get("/api/subscriptions/me", &alice.token).await;
    assert_eq!(overview.data()["plan"], "premium_yearly");
    assert_eq!(overview.data()["subscription"]["status"], "active");

    let inbox = app.get("/api/notifications", &alice.token).await;
    assert_eq!(inbox.data()["total"], 1);

    for i in 0..6 {
        let goal = app
            .post("/api/goals", &alice.token, json!({ "title": format!("Goal {}", i) }))
            .await;
        assert_status!(goal, StatusCode::CREATED);
    }
    let usage = app.get("/api/subscriptions/usage", &alice.token).await;
    assert_eq!(usage.data()["active_goals"], 6);
    assert_eq!(usage.data()["max_active_goals"], Value::Null);
    assert_eq!(usage.data()["limit_exceeded"], false);

    let cancel = app.post("/api/subscriptions/cancel", &alice.token, json!({})).await;
    assert_status!(cancel, StatusCode::OK);
    assert_eq!(cancel.data()["cancel_at_period_end"], true);

    let deleted = json!({
        "id": "evt_2",
        "type": "customer.subscription.deleted",
        "data": { "object": { "id": "sub_123", "customer": "cus_123" } }
    });
    let response = deliver(&app, &deleted, TEST_WEBHOOK_SECRET).await;
    assert_eq!(response.data()["handled"], true);

    let usage = app.get("/api/subscriptions/usage", &alice.token).await;
    assert_eq!(usage.data()["plan"], "free");
    assert_eq!(usage.data()["limit_exceeded"], true);
    let over_limit = app.post("/api/goals", &alice.token, json!({ "title": "One more" })).await;
    assert_status!(over_limit, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancel_without_subscription() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let cancel = app.post("/api/subscriptions/cancel", &alice.token, json!({})).await;
    assert_error!(cancel, StatusCode::NOT_FOUND, "No active subscription");

    let unknown = json!({ "id": "evt_x", "type": "charge.refunded", "data": { "object": {} } });
    let response = deliver(&app, &unknown, TEST_WEBHOOK_SECRET).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.data()["handled"], false);
}

#[tokio::test]
async fn test_event_for_replaced_subscription_is_ignored() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    let user_id = alice.id.to_string();

    deliver(&app, &checkout_for("evt_old", &user_id, "sub_old"), TEST_WEBHOOK_SECRET).await;
    deliver(&app, &checkout_for("evt_new", &user_id, "sub_new"), TEST_WEBHOOK_SECRET).await;
    assert_eq!(stored_subscription(&app, &alice.token).await["provider_subscription_id"], "sub_new");

    let late = provider_event(
        "evt_late",
        "customer.subscription.deleted",
        json!({ "id": "sub_old", "customer": "cus_123" }),
    );
    let response = deliver(&app, &late, TEST_WEBHOOK_SECRET).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.data()["handled"], false);

    let subscription = stored_subscription(&app, &alice.token).await;
    assert_eq!(subscription["status"], "active");
    assert_eq!(subscription["plan"], "premium_yearly");
    assert_eq!(subscription["provider_subscription_id"], "sub_new");
}

#[tokio::test]
async fn test_subscription_updated_syncs_fields() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    deliver(&app, &checkout_event("evt_1", &alice.id.to_string()), TEST_WEBHOOK_SECRET).await;

    let period_end: i64 = 1_900_000_000;
    let updated = provider_event(
        "evt_2",
        "customer.subscription.updated",
        json!({
            "id": "sub_123",
            "customer": "cus_123",
            "status": "trialing",
            "current_period_end": period_end,
            "cancel_at_period_end": true,
            "metadata": { "plan": "premium_monthly" }
        }),
    );
    let response = deliver(&app, &updated, TEST_WEBHOOK_SECRET).await;
    assert_eq!(response.data()["handled"], true);

    let subscription = stored_subscription(&app, &alice.token).await;
    assert_eq!(subscription["status"], "trialing");
    assert_eq!(subscription["plan"], "premium_monthly");
    assert_eq!(subscription["cancel_at_period_end"], true);
    let stored_end: DateTime<Utc> =
        serde_json::from_value(subscription["current_period_end"].clone()).unwrap();
    assert_eq!(stored_end.timestamp(), period_end);

    let unpaid = provider_event(
        "evt_3",
        "customer.subscription.created",
        json!({ "id": "sub_123", "customer": "cus_123", "status": "unpaid" }),
    );
    deliver(&app, &unpaid, TEST_WEBHOOK_SECRET).await;
    let subscription = stored_subscription(&app, &alice.token).await;
    assert_eq!(subscription["status"], "past_due");
    // untouched when the event omits them
    assert_eq!(subscription["cancel_at_period_end"], true);
    assert_eq!(subscription["plan"], "premium_monthly");
}

#[tokio::test]
async fn test_invoice_events_toggle_past_due() {
    let app = TestApp::new().await;
    let alice = signup(&app, "alice").await;
    deliver(&app, &checkout_event("evt_1", &alice.id.to_string()), TEST_WEBHOOK_SECRET).await;

    let failed = provider_event(
        "evt_2",
        "invoice.payment_failed",
        json!({ "subscription": "sub_123", "customer": "cus_123" }),
    );
    let response = deliver(&app, &failed, TEST_WEBHOOK_SECRET).await;
    assert_eq!(response.data()["handled"], true);
    assert_eq!(stored_subscription(&app, &alice.token).await["status"], "past_due");
    let overview = app.get("/api/subscriptions/me", &alice.token).await;
    assert_eq!(overview.data()["plan"], "free");

    let succeeded = provider_event(
        "evt_3",
        "invoice.payment_succeeded",
        json!({ "subscription": "sub_123", "customer": "cus_123" }),
    );
    let response = deliver(&app, &succeeded, TEST_WEBHOOK_SECRET).await;
    assert_eq!(response.data()["handled"], true);
    assert_eq!(stored_subscription(&app, &alice.token).await["status"], "active");
    let overview = app.get("/api/subscriptions/me", &alice.token).await;
    assert_eq!(overview.data()["plan"], "premium_yearly");
}

/**
 * Billing Webhook
 *
 * POST /api/webhooks/billing
 *
 * The provider signs every delivery with
 * `Stripe-Signature: t=<unix seconds>,v1=<hex hmac>` where the HMAC-SHA256 is
 * taken over `"<t>.<raw body>"` with the shared secret. Deliveries older or
 * newer than the tolerance are rejected. Each event id is processed once;
 * repeats are acknowledged without side effects.
 *
 * | Event | Effect |
 * |---|---|
 * | `checkout.session.completed` | activate the plan from `metadata.plan` for `client_reference_id` |
 * | `customer.subscription.created` / `.updated` | sync status, period end, cancel flag |
 * | `customer.subscription.deleted` | canceled |
 * | `invoice.payment_failed` | past due |
 * | `invoice.payment_succeeded` | active |
 *
 * Anything else is acknowledged and ignored.
 */

use axum::{body::Bytes, extract::State, http::HeaderMap};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use super::db;
use crate::backend::auth::users::{get_user_by_id, update_subscription_status};
use crate::backend::error::{ok, ApiResult, BackendError};
use crate::backend::jobs::EmailJob;
use crate::backend::notifications::notify;
use crate::backend::server::state::AppState;
use crate::shared::billing::{Plan, Subscription, SubscriptionStatus};
use crate::shared::notifications::NotificationKind;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Envelope every provider event arrives in
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: Value,
}

/// Hex HMAC-SHA256 of `"<timestamp>.<payload>"`
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, &'static str> {
    let mac = mac_for(secret, timestamp, payload)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Header value a provider would send for this payload
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, &'static str> {
    Ok(format!("t={},v1={}", timestamp, compute_signature(secret, timestamp, payload)?))
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, &'static str> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|_| "Invalid webhook secret")?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Check a signature header against the payload
///
/// # Errors
///
/// A short reason suitable for a 400 response
pub fn verify_signature(
    header: &str,
    payload: &[u8],
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), &'static str> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or("Missing signature timestamp")?;
    if signatures.is_empty() {
        return Err("Missing v1 signature");
    }
    if (now - timestamp).abs() > tolerance_secs {
        return Err("Signature timestamp outside tolerance");
    }

    let mac = mac_for(secret, timestamp, payload)?;
    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err("Signature mismatch")
    }
}

/// Billing webhook handler
///
/// # Errors
///
/// * `400 Bad Request` - missing or invalid signature, malformed event
/// * `503 Service Unavailable` - no webhook secret configured
pub async fn handle_billing_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Value> {
    let secret = state.config.billing_webhook_secret.as_deref().ok_or_else(|| {
        tracing::error!("Billing webhook called but BILLING_WEBHOOK_SECRET is not set");
        BackendError::handler(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Billing webhook is not configured",
        )
    })?;

    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Billing webhook without signature header");
            BackendError::bad_request("Missing signature header")
        })?;

    verify_signature(
        header,
        &body,
        secret,
        state.config.webhook_tolerance_secs,
        Utc::now().timestamp(),
    )
    .map_err(|reason| {
        tracing::warn!("Rejected billing webhook: {}", reason);
        BackendError::bad_request(reason)
    })?;

    let event: WebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Malformed billing event: {}", e);
        BackendError::bad_request("Malformed event payload")
    })?;

    if db::webhook_event_seen(&state.db, &event.id).await? {
        tracing::info!("Duplicate billing event {} ignored", event.id);
        return ok(json!({ "received": true, "duplicate": true }));
    }

    let handled = dispatch_event(&state, &event).await?;
    db::record_webhook_event(&state.db, &event.id, &event.event_type).await?;

    tracing::info!(
        "Billing event {} ({}) {}",
        event.id,
        event.event_type,
        if handled { "applied" } else { "ignored" }
    );
    ok(json!({ "received": true, "duplicate": false, "handled": handled }))
}

fn str_field<'a>(object: &'a Value, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn unix_field(object: &Value, key: &str) -> Option<DateTime<Utc>> {
    object
        .get(key)
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn plan_field(object: &Value) -> Option<Plan> {
    object
        .get("metadata")
        .and_then(|m| m.get("plan"))
        .and_then(Value::as_str)
        .and_then(|raw| Plan::parse(raw).ok())
        .filter(Plan::is_premium)
}

/// Apply one event; returns whether it changed anything
async fn dispatch_event(state: &AppState, event: &WebhookEvent) -> Result<bool, BackendError> {
    let object = &event.data.object;
    match event.event_type.as_str() {
        "checkout.session.completed" => checkout_completed(state, object).await,
        "customer.subscription.created" | "customer.subscription.updated" => {
            let status = str_field(object, "status")
                .map(SubscriptionStatus::from_provider)
                .unwrap_or(SubscriptionStatus::Inactive);
            sync_subscription(
                state,
                str_field(object, "id"),
                str_field(object, "customer"),
                status,
                plan_field(object),
                unix_field(object, "current_period_end"),
                object.get("cancel_at_period_end").and_then(Value::as_bool),
            )
            .await
        }
        "customer.subscription.deleted" => {
            sync_subscription(
                state,
                str_field(object, "id"),
                str_field(object, "customer"),
                SubscriptionStatus::Canceled,
                None,
                None,
                Some(false),
            )
            .await
        }
        "invoice.payment_failed" => {
            sync_subscription(
                state,
                str_field(object, "subscription"),
                str_field(object, "customer"),
                SubscriptionStatus::PastDue,
                None,
                None,
                None,
            )
            .await
        }
        "invoice.payment_succeeded" => {
            sync_subscription(
                state,
                str_field(object, "subscription"),
                str_field(object, "customer"),
                SubscriptionStatus::Active,
                None,
                None,
                None,
            )
            .await
        }
        other => {
            tracing::debug!("Ignoring billing event type {}", other);
            Ok(false)
        }
    }
}

async fn checkout_completed(state: &AppState, object: &Value) -> Result<bool, BackendError> {
    let user_id = match str_field(object, "client_reference_id").and_then(|s| Uuid::parse_str(s).ok()) {
        Some(user_id) => user_id,
        None => {
            tracing::warn!("Checkout completed without a usable client_reference_id");
            return Ok(false);
        }
    };

    let user = match get_user_by_id(&state.db, user_id).await? {
        Some(user) => user,
        None => {
            tracing::warn!("Checkout completed for unknown user {}", user_id);
            return Ok(false);
        }
    };

    let plan = plan_field(object).unwrap_or_else(|| {
        tracing::warn!("Checkout for {} has no premium plan in metadata; using monthly", user_id);
        Plan::PremiumMonthly
    });
    let customer_id = str_field(object, "customer");

    let subscription = db::activate(
        &state.db,
        user_id,
        plan,
        customer_id,
        str_field(object, "subscription"),
    )
    .await?;
    update_subscription_status(&state.db, user_id, subscription.status.as_str(), customer_id).await?;

    announce_activation(state, &subscription, &user.email, &user.username).await?;
    Ok(true)
}

async fn sync_subscription(
    state: &AppState,
    subscription_id: Option<&str>,
    customer_id: Option<&str>,
    status: SubscriptionStatus,
    plan: Option<Plan>,
    period_end: Option<DateTime<Utc>>,
    cancel_at_period_end: Option<bool>,
) -> Result<bool, BackendError> {
    let existing = match db::find_by_provider(&state.db, subscription_id, customer_id).await? {
        Some(existing) => existing,
        None => {
            tracing::warn!(
                "No current subscription matches provider ids {:?} / {:?}; event ignored",
                subscription_id,
                customer_id
            );
            return Ok(false);
        }
    };

    let updated = db::sync(
        &state.db,
        existing.id,
        subscription_id,
        status,
        plan,
        period_end,
        cancel_at_period_end,
    )
    .await?;
    update_subscription_status(&state.db, updated.user_id, updated.status.as_str(), None).await?;

    let was_active = existing.status.grants_access();
    let is_active = updated.status.grants_access();
    if was_active != is_active || (status == SubscriptionStatus::Canceled && existing.status != status) {
        if let Some(user) = get_user_by_id(&state.db, updated.user_id).await? {
            if is_active {
                announce_activation(state, &updated, &user.email, &user.username).await?;
            } else if updated.status == SubscriptionStatus::Canceled {
                announce_cancellation(state, &updated, &user.email, &user.username).await?;
            }
        }
    }

    Ok(true)
}

async fn announce_activation(
    state: &AppState,
    subscription: &Subscription,
    email: &str,
    username: &str,
) -> Result<(), BackendError> {
    notify(
        state,
        subscription.user_id,
        NotificationKind::SubscriptionActivated,
        "Premium activated",
        Some("Your premium subscription is now active"),
        json!({ "subscription_id": subscription.id, "plan": subscription.plan }),
    )
    .await?;
    state.email.enqueue(EmailJob::SubscriptionActivated {
        to: email.to_string(),
        username: username.to_string(),
        plan: subscription.plan.as_str().to_string(),
    });
    Ok(())
}

async fn announce_cancellation(
    state: &AppState,
    subscription: &Subscription,
    email: &str,
    username: &str,
) -> Result<(), BackendError> {
    notify(
        state,
        subscription.user_id,
        NotificationKind::SubscriptionCanceled,
        "Subscription canceled",
        Some("Your account is back on the free plan"),
        json!({ "subscription_id": subscription.id }),
    )
    .await?;
    state.email.enqueue(EmailJob::SubscriptionCanceled {
        to: email.to_string(),
        username: username.to_string(),
    });
    Ok(())
}

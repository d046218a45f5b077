//! Subscription queries

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::billing::{Plan, Subscription, SubscriptionStatus};

pub async fn get_by_user(pool: &SqlitePool, user_id: Uuid) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Find the row a provider event refers to
///
/// A subscription id must match the stored one. The customer id is only used
/// when the event carries no subscription id, or when the row has not learned
/// its subscription id yet, so events for a replaced subscription match nothing.
pub async fn find_by_provider(
    pool: &SqlitePool,
    subscription_id: Option<&str>,
    customer_id: Option<&str>,
) -> Result<Option<Subscription>, sqlx::Error> {
    if let Some(subscription_id) = subscription_id {
        let found = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE provider_subscription_id = $1",
        )
        .bind(subscription_id)
        .fetch_optional(pool)
        .await?;
        if found.is_some() {
            return Ok(found);
        }
    }
    let Some(customer_id) = customer_id else {
        return Ok(None);
    };
    sqlx::query_as::<_, Subscription>(
        r#"
        SELECT * FROM subscriptions
        WHERE provider_customer_id = $1
          AND ($2 IS NULL OR provider_subscription_id IS NULL)
        "#,
    )
    .bind(customer_id)
    .bind(subscription_id)
    .fetch_optional(pool)
    .await
}

/// Create or replace the user's subscription as active on `plan`
pub async fn activate(
    pool: &SqlitePool,
    user_id: Uuid,
    plan: Plan,
    customer_id: Option<&str>,
    subscription_id: Option<&str>,
) -> Result<Subscription, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions (id, user_id, plan, status, provider_customer_id,
                                   provider_subscription_id, cancel_at_period_end, created_at, updated_at)
        VALUES ($1, $2, $3, 'active', $4, $5, 0, $6, $6)
        ON CONFLICT (user_id) DO UPDATE SET
            plan = excluded.plan,
            status = 'active',
            provider_customer_id = COALESCE(excluded.provider_customer_id, subscriptions.provider_customer_id),
            provider_subscription_id = COALESCE(excluded.provider_subscription_id, subscriptions.provider_subscription_id),
            cancel_at_period_end = 0,
            updated_at = excluded.updated_at
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(plan)
    .bind(customer_id)
    .bind(subscription_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/// Sync fields reported by the provider; `None` leaves a field unchanged
#[allow(clippy::too_many_arguments)]
pub async fn sync(
    pool: &SqlitePool,
    id: Uuid,
    subscription_id: Option<&str>,
    status: SubscriptionStatus,
    plan: Option<Plan>,
    current_period_end: Option<DateTime<Utc>>,
    cancel_at_period_end: Option<bool>,
) -> Result<Subscription, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(
        r#"
        UPDATE subscriptions SET
            status = $1,
            plan = COALESCE($2, plan),
            current_period_end = COALESCE($3, current_period_end),
            cancel_at_period_end = COALESCE($4, cancel_at_period_end),
            provider_subscription_id = COALESCE(provider_subscription_id, $5),
            updated_at = $6
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(status)
    .bind(plan)
    .bind(current_period_end)
    .bind(cancel_at_period_end)
    .bind(subscription_id)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn set_cancel_at_period_end(pool: &SqlitePool, id: Uuid) -> Result<Subscription, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(
        "UPDATE subscriptions SET cancel_at_period_end = 1, updated_at = $1 WHERE id = $2 RETURNING *",
    )
    .bind(Utc::now())
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn webhook_event_seen(pool: &SqlitePool, event_id: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM webhook_events WHERE id = $1")
        .bind(event_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn record_webhook_event(
    pool: &SqlitePool,
    event_id: &str,
    event_type: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO webhook_events (id, event_type, received_at) VALUES ($1, $2, $3)")
        .bind(event_id)
        .bind(event_type)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(())
}

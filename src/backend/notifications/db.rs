//! Notification queries

use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::api::Page;
use crate::shared::notifications::{Notification, NotificationKind};

pub async fn insert_notification(
    pool: &SqlitePool,
    user_id: Uuid,
    kind: NotificationKind,
    title: &str,
    body: Option<&str>,
    data: &Value,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (id, user_id, kind, title, body, data, is_read, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, 0, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(kind)
    .bind(title)
    .bind(body)
    .bind(sqlx::types::Json(data))
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/// Newest first, optionally unread only
pub async fn list_notifications(
    pool: &SqlitePool,
    user_id: Uuid,
    unread_only: bool,
    page: Page,
) -> Result<(Vec<Notification>, i64), sqlx::Error> {
    let items = sqlx::query_as::<_, Notification>(
        r#"
        SELECT * FROM notifications
        WHERE user_id = $1 AND ($2 = 0 OR is_read = 0)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(unread_only)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND ($2 = 0 OR is_read = 0)",
    )
    .bind(user_id)
    .bind(unread_only)
    .fetch_one(pool)
    .await?;

    Ok((items, total))
}

pub async fn unread_count(pool: &SqlitePool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = 0")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Mark one notification read; `None` if it is not the user's
pub async fn mark_read(
    pool: &SqlitePool,
    user_id: Uuid,
    notification_id: Uuid,
) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        r#"
        UPDATE notifications
        SET is_read = 1, read_at = COALESCE(read_at, $1)
        WHERE id = $2 AND user_id = $3
        RETURNING *
        "#,
    )
    .bind(Utc::now())
    .bind(notification_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Returns how many notifications changed
pub async fn mark_all_read(pool: &SqlitePool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = 1, read_at = $1 WHERE user_id = $2 AND is_read = 0",
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_notification(
    pool: &SqlitePool,
    user_id: Uuid,
    notification_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

//! Activity log queries

use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::activity::ActivityEntry;
use crate::shared::api::Page;

/// Append an entry to a user's activity log
pub async fn log_activity(
    pool: &SqlitePool,
    user_id: Uuid,
    action: &str,
    entity_type: Option<&str>,
    entity_id: Option<Uuid>,
    metadata: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO activity_logs (id, user_id, action, entity_type, entity_id, metadata, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action)
    .bind(entity_type)
    .bind(entity_id)
    .bind(sqlx::types::Json(metadata))
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
    page: Page,
) -> Result<(Vec<ActivityEntry>, i64), sqlx::Error> {
    let items = sqlx::query_as::<_, ActivityEntry>(
        r#"
        SELECT a.id, a.user_id, u.username, a.action, a.entity_type, a.entity_id, a.metadata, a.created_at
        FROM activity_logs a
        JOIN users u ON u.id = a.user_id
        WHERE a.user_id = $1
        ORDER BY a.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok((items, total))
}

const FRIEND_IDS: &str = r#"
    SELECT CASE WHEN requester_id = $1 THEN addressee_id ELSE requester_id END
    FROM friendships
    WHERE status = 'accepted' AND (requester_id = $1 OR addressee_id = $1)
"#;

/// Entries of the user's accepted friends, newest first
pub async fn friends_feed(
    pool: &SqlitePool,
    user_id: Uuid,
    page: Page,
) -> Result<(Vec<ActivityEntry>, i64), sqlx::Error> {
    let items = sqlx::query_as::<_, ActivityEntry>(&format!(
        r#"
        SELECT a.id, a.user_id, u.username, a.action, a.entity_type, a.entity_id, a.metadata, a.created_at
        FROM activity_logs a
        JOIN users u ON u.id = a.user_id
        WHERE a.user_id IN ({})
        ORDER BY a.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
        FRIEND_IDS
    ))
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM activity_logs WHERE user_id IN ({})",
        FRIEND_IDS
    ))
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok((items, total))
}

//! Admin queries

use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::users::db::like_prefix;
use crate::shared::admin::{AdminActionLog, AdminStats, AdminUserView};
use crate::shared::api::Page;

const USER_COLUMNS: &str =
    "id, username, email, roles, is_active, is_banned, ban_reason, subscription_status, created_at";

/// Every account, optionally filtered by username or email prefix
pub async fn list_users(
    pool: &SqlitePool,
    search: Option<&str>,
    page: Page,
) -> Result<(Vec<AdminUserView>, i64), sqlx::Error> {
    let pattern = search.map(str::trim).filter(|s| !s.is_empty()).map(like_prefix);
    let filter = r#"
        WHERE ($1 IS NULL OR username LIKE $1 ESCAPE '\' OR email LIKE $1 ESCAPE '\')
    "#;

    let users = sqlx::query_as::<_, AdminUserView>(&format!(
        "SELECT {} FROM users {} ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        USER_COLUMNS, filter
    ))
    .bind(pattern.as_deref())
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users {}", filter))
        .bind(pattern.as_deref())
        .fetch_one(pool)
        .await?;

    Ok((users, total))
}

pub async fn get_user(pool: &SqlitePool, user_id: Uuid) -> Result<Option<AdminUserView>, sqlx::Error> {
    sqlx::query_as::<_, AdminUserView>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn set_roles(pool: &SqlitePool, user_id: Uuid, roles: &[String]) -> Result<AdminUserView, sqlx::Error> {
    sqlx::query_as::<_, AdminUserView>(&format!(
        "UPDATE users SET roles = $1, updated_at = $2 WHERE id = $3 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(Json(roles))
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn set_ban(
    pool: &SqlitePool,
    user_id: Uuid,
    banned: bool,
    reason: Option<&str>,
) -> Result<AdminUserView, sqlx::Error> {
    sqlx::query_as::<_, AdminUserView>(&format!(
        "UPDATE users SET is_banned = $1, ban_reason = $2, updated_at = $3 WHERE id = $4 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(banned)
    .bind(reason)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn active_user_ids(pool: &SqlitePool) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM users WHERE is_active = 1 AND is_banned = 0")
        .fetch_all(pool)
        .await
}

pub async fn log_action(
    pool: &SqlitePool,
    admin_id: Uuid,
    action: &str,
    target_type: &str,
    target_id: Option<Uuid>,
    reason: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO admin_action_logs (id, admin_id, action, target_type, target_id, reason, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(admin_id)
    .bind(action)
    .bind(target_type)
    .bind(target_id)
    .bind(reason)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

/// Newest first
pub async fn list_actions(pool: &SqlitePool, page: Page) -> Result<(Vec<AdminActionLog>, i64), sqlx::Error> {
    let logs = sqlx::query_as::<_, AdminActionLog>(
        r#"
        SELECT l.id, l.admin_id, u.username AS admin_username, l.action, l.target_type,
               l.target_id, l.reason, l.created_at
        FROM admin_action_logs l
        JOIN users u ON u.id = l.admin_id
        ORDER BY l.created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_action_logs")
        .fetch_one(pool)
        .await?;

    Ok((logs, total))
}

pub async fn stats(pool: &SqlitePool) -> Result<AdminStats, sqlx::Error> {
    let row: (i64, i64, i64, i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users),
            (SELECT COUNT(*) FROM users WHERE is_active = 1 AND is_banned = 0),
            (SELECT COUNT(*) FROM users WHERE is_banned = 1),
            (SELECT COUNT(*) FROM blog_posts WHERE status = 'published' AND is_deleted = 0),
            (SELECT COUNT(*) FROM groups WHERE is_deleted = 0),
            (SELECT COUNT(*) FROM challenges WHERE is_deleted = 0),
            (SELECT COUNT(*) FROM subscriptions WHERE status IN ('active', 'trialing'))
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(AdminStats {
        total_users: row.0,
        active_users: row.1,
        banned_users: row.2,
        published_posts: row.3,
        groups: row.4,
        challenges: row.5,
        active_subscriptions: row.6,
    })
}

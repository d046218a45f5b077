//! Profile queries

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::api::Page;
use crate::shared::users::{UserProfile, UserSummary};

const PROFILE_COLUMNS: &str = "id, username, display_name, bio, avatar_url, points, level, created_at";

/// Public profile of an active, unbanned user
pub async fn get_profile(pool: &SqlitePool, user_id: Uuid) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {} FROM users WHERE id = $1 AND is_active = 1 AND is_banned = 0",
        PROFILE_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_summary(pool: &SqlitePool, user_id: Uuid) -> Result<Option<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>(
        "SELECT id, username, display_name, avatar_url FROM users WHERE id = $1 AND is_active = 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn update_profile(
    pool: &SqlitePool,
    user_id: Uuid,
    display_name: Option<&str>,
    bio: Option<&str>,
    avatar_url: Option<&str>,
) -> Result<UserProfile, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(&format!(
        r#"
        UPDATE users
        SET display_name = $1, bio = $2, avatar_url = $3, updated_at = $4
        WHERE id = $5
        RETURNING {}
        "#,
        PROFILE_COLUMNS
    ))
    .bind(display_name)
    .bind(bio)
    .bind(avatar_url)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn deactivate(pool: &SqlitePool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_active = 0, updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern
pub fn like_prefix(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 1);
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Prefix search over username and display name, active users only
pub async fn search(
    pool: &SqlitePool,
    term: &str,
    page: Page,
) -> Result<(Vec<UserSummary>, i64), sqlx::Error> {
    let pattern = like_prefix(term);
    let filter = r#"
        is_active = 1 AND is_banned = 0
        AND (username LIKE $1 ESCAPE '\' OR display_name LIKE $1 ESCAPE '\')
    "#;

    let items = sqlx::query_as::<_, UserSummary>(&format!(
        "SELECT id, username, display_name, avatar_url FROM users WHERE {} ORDER BY username LIMIT $2 OFFSET $3",
        filter
    ))
    .bind(&pattern)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {}", filter))
        .bind(&pattern)
        .fetch_one(pool)
        .await?;

    Ok((items, total))
}

/// Counters shown on the caller's own profile: friends, completed goals, published posts
pub async fn profile_counters(pool: &SqlitePool, user_id: Uuid) -> Result<(i64, i64, i64), sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM friendships
             WHERE status = 'accepted' AND (requester_id = $1 OR addressee_id = $1)),
            (SELECT COUNT(*) FROM goals WHERE owner_id = $1 AND status = 'completed'),
            (SELECT COUNT(*) FROM blog_posts
             WHERE author_id = $1 AND status = 'published' AND is_deleted = 0)
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

//! Friendship queries

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::social::{Friend, FriendRequestView, Friendship, FriendshipStatus};

pub async fn get_friendship(pool: &SqlitePool, id: Uuid) -> Result<Option<Friendship>, sqlx::Error> {
    sqlx::query_as::<_, Friendship>("SELECT * FROM friendships WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Rows in either direction between two users
pub async fn between(pool: &SqlitePool, a: Uuid, b: Uuid) -> Result<Vec<Friendship>, sqlx::Error> {
    sqlx::query_as::<_, Friendship>(
        r#"
        SELECT * FROM friendships
        WHERE (requester_id = $1 AND addressee_id = $2)
           OR (requester_id = $2 AND addressee_id = $1)
        "#,
    )
    .bind(a)
    .bind(b)
    .fetch_all(pool)
    .await
}

pub async fn are_friends(pool: &SqlitePool, a: Uuid, b: Uuid) -> Result<bool, sqlx::Error> {
    Ok(between(pool, a, b)
        .await?
        .iter()
        .any(|f| f.status == FriendshipStatus::Accepted))
}

/// Create or reset the row from `requester` to `addressee`
pub async fn upsert(
    pool: &SqlitePool,
    requester_id: Uuid,
    addressee_id: Uuid,
    status: FriendshipStatus,
    message: Option<&str>,
) -> Result<Friendship, sqlx::Error> {
    sqlx::query_as::<_, Friendship>(
        r#"
        INSERT INTO friendships (id, requester_id, addressee_id, status, message, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (requester_id, addressee_id) DO UPDATE SET
            status = excluded.status,
            message = excluded.message,
            created_at = excluded.created_at,
            responded_at = NULL
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(requester_id)
    .bind(addressee_id)
    .bind(status)
    .bind(message)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn respond(
    pool: &SqlitePool,
    id: Uuid,
    status: FriendshipStatus,
) -> Result<Friendship, sqlx::Error> {
    sqlx::query_as::<_, Friendship>(
        "UPDATE friendships SET status = $1, responded_at = $2 WHERE id = $3 RETURNING *",
    )
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM friendships WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove an accepted friendship in either direction; returns whether one existed
pub async fn remove_friendship(pool: &SqlitePool, a: Uuid, b: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM friendships
        WHERE status = 'accepted'
          AND ((requester_id = $1 AND addressee_id = $2) OR (requester_id = $2 AND addressee_id = $1))
        "#,
    )
    .bind(a)
    .bind(b)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Clear everything between the pair except a block placed by `other`
pub async fn clear_for_block(pool: &SqlitePool, blocker: Uuid, other: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM friendships
        WHERE (requester_id = $1 AND addressee_id = $2)
           OR (requester_id = $2 AND addressee_id = $1 AND status != 'blocked')
        "#,
    )
    .bind(blocker)
    .bind(other)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn incoming_requests(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<FriendRequestView>, sqlx::Error> {
    sqlx::query_as::<_, FriendRequestView>(
        r#"
        SELECT f.id, u.id AS user_id, u.username, u.display_name, f.message, f.created_at
        FROM friendships f
        JOIN users u ON u.id = f.requester_id
        WHERE f.addressee_id = $1 AND f.status = 'pending'
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn sent_requests(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<FriendRequestView>, sqlx::Error> {
    sqlx::query_as::<_, FriendRequestView>(
        r#"
        SELECT f.id, u.id AS user_id, u.username, u.display_name, f.message, f.created_at
        FROM friendships f
        JOIN users u ON u.id = f.addressee_id
        WHERE f.requester_id = $1 AND f.status = 'pending'
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_friends(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Friend>, sqlx::Error> {
    sqlx::query_as::<_, Friend>(
        r#"
        SELECT u.id AS user_id, u.username, u.display_name, u.avatar_url,
               COALESCE(f.responded_at, f.created_at) AS since
        FROM friendships f
        JOIN users u ON u.id = CASE WHEN f.requester_id = $1 THEN f.addressee_id ELSE f.requester_id END
        WHERE f.status = 'accepted' AND (f.requester_id = $1 OR f.addressee_id = $1)
        ORDER BY u.username
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

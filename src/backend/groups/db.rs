//! Group queries

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::users::db::like_prefix;
use crate::shared::api::Page;
use crate::shared::groups::{Group, GroupMember, GroupRole};

#[allow(clippy::too_many_arguments)]
pub async fn insert_group(
    pool: &SqlitePool,
    id: Uuid,
    name: &str,
    description: Option<&str>,
    owner_id: Uuid,
    is_private: bool,
    chat_id: Uuid,
) -> Result<Group, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, Group>(
        r#"
        INSERT INTO groups (id, name, description, owner_id, is_private, chat_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(owner_id)
    .bind(is_private)
    .bind(chat_id)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// A group that has not been deleted
pub async fn get_group(pool: &SqlitePool, group_id: Uuid) -> Result<Option<Group>, sqlx::Error> {
    sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1 AND is_deleted = 0")
        .bind(group_id)
        .fetch_optional(pool)
        .await
}

pub async fn update_group(
    pool: &SqlitePool,
    group_id: Uuid,
    name: &str,
    description: Option<&str>,
    is_private: bool,
) -> Result<Group, sqlx::Error> {
    sqlx::query_as::<_, Group>(
        r#"
        UPDATE groups SET name = $1, description = $2, is_private = $3, updated_at = $4
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(is_private)
    .bind(Utc::now())
    .bind(group_id)
    .fetch_one(pool)
    .await
}

pub async fn soft_delete(pool: &SqlitePool, group_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE groups SET is_deleted = 1, updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(group_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Public groups, optionally filtered by a name substring
pub async fn list_public(
    pool: &SqlitePool,
    search: Option<&str>,
    page: Page,
) -> Result<(Vec<Group>, i64), sqlx::Error> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}", like_prefix(s)));
    let filter = r#"
        FROM groups
        WHERE is_deleted = 0 AND is_private = 0
          AND ($1 IS NULL OR name LIKE $1 ESCAPE '\')
    "#;

    let groups = sqlx::query_as::<_, Group>(&format!(
        "SELECT * {} ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        filter
    ))
    .bind(pattern.as_deref())
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {}", filter))
        .bind(pattern.as_deref())
        .fetch_one(pool)
        .await?;

    Ok((groups, total))
}

pub async fn groups_for_member(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Group>, sqlx::Error> {
    sqlx::query_as::<_, Group>(
        r#"
        SELECT g.*
        FROM groups g
        JOIN group_members m ON m.group_id = g.id
        WHERE m.user_id = $1 AND g.is_deleted = 0
        ORDER BY g.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn member_role(
    pool: &SqlitePool,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<Option<GroupRole>, sqlx::Error> {
    sqlx::query_scalar("SELECT role FROM group_members WHERE group_id = $1 AND user_id = $2")
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Insert a membership; the caller checks it does not exist yet
pub async fn add_member(
    pool: &SqlitePool,
    group_id: Uuid,
    user_id: Uuid,
    role: GroupRole,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO group_members (group_id, user_id, role, joined_at) VALUES ($1, $2, $3, $4)")
        .bind(group_id)
        .bind(user_id)
        .bind(role)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn remove_member(pool: &SqlitePool, group_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
        .bind(group_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn members(pool: &SqlitePool, group_id: Uuid) -> Result<Vec<GroupMember>, sqlx::Error> {
    sqlx::query_as::<_, GroupMember>(
        r#"
        SELECT m.user_id, u.username, u.display_name, m.role, m.joined_at
        FROM group_members m
        JOIN users u ON u.id = m.user_id
        WHERE m.group_id = $1
        ORDER BY m.joined_at
        "#,
    )
    .bind(group_id)
    .fetch_all(pool)
    .await
}

pub async fn member_count(pool: &SqlitePool, group_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE group_id = $1")
        .bind(group_id)
        .fetch_one(pool)
        .await
}

/**
 * Plan Limits
 *
 * Free accounts may keep `FREE_ACTIVE_GOAL_LIMIT` active goals and own
 * `FREE_OWNED_GROUP_LIMIT` groups. Premium plans are unlimited while the
 * subscription grants access (active or trialing).
 */

use sqlx::SqlitePool;
use uuid::Uuid;

use super::db;
use crate::backend::error::BackendError;
use crate::shared::billing::{Plan, UsageStats, FREE_ACTIVE_GOAL_LIMIT, FREE_OWNED_GROUP_LIMIT};

/// Plan whose limits apply to the user right now
pub async fn effective_plan(pool: &SqlitePool, user_id: Uuid) -> Result<Plan, sqlx::Error> {
    Ok(db::get_by_user(pool, user_id)
        .await?
        .map(|s| s.effective_plan())
        .unwrap_or(Plan::Free))
}

pub async fn active_goal_count(pool: &SqlitePool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM goals WHERE owner_id = $1 AND status = 'active'")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn owned_group_count(pool: &SqlitePool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM groups WHERE owner_id = $1 AND is_deleted = 0")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// 403 when a free user already has the maximum number of active goals
pub async fn ensure_can_add_goal(pool: &SqlitePool, user_id: Uuid) -> Result<(), BackendError> {
    if effective_plan(pool, user_id).await?.is_premium() {
        return Ok(());
    }
    if active_goal_count(pool, user_id).await? >= FREE_ACTIVE_GOAL_LIMIT {
        tracing::warn!("User {} hit the free goal limit", user_id);
        return Err(BackendError::forbidden(format!(
            "The free plan allows {} active goals. Upgrade to premium for unlimited goals",
            FREE_ACTIVE_GOAL_LIMIT
        )));
    }
    Ok(())
}

/// 403 when a free user already owns the maximum number of groups
pub async fn ensure_can_create_group(pool: &SqlitePool, user_id: Uuid) -> Result<(), BackendError> {
    if effective_plan(pool, user_id).await?.is_premium() {
        return Ok(());
    }
    if owned_group_count(pool, user_id).await? >= FREE_OWNED_GROUP_LIMIT {
        tracing::warn!("User {} hit the free group limit", user_id);
        return Err(BackendError::forbidden(format!(
            "The free plan allows {} groups. Upgrade to premium to create more",
            FREE_OWNED_GROUP_LIMIT
        )));
    }
    Ok(())
}

pub async fn usage(pool: &SqlitePool, user_id: Uuid) -> Result<UsageStats, sqlx::Error> {
    let plan = effective_plan(pool, user_id).await?;
    let active_goals = active_goal_count(pool, user_id).await?;
    let owned_groups = owned_group_count(pool, user_id).await?;
    let (max_active_goals, max_owned_groups) = if plan.is_premium() {
        (None, None)
    } else {
        (Some(FREE_ACTIVE_GOAL_LIMIT), Some(FREE_OWNED_GROUP_LIMIT))
    };

    Ok(UsageStats {
        plan,
        active_goals,
        owned_groups,
        max_active_goals,
        max_owned_groups,
        limit_exceeded: max_active_goals.is_some_and(|max| active_goals >= max)
            || max_owned_groups.is_some_and(|max| owned_groups >= max),
    })
}

//! Goal, milestone and task queries

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::api::Page;
use crate::shared::goals::{Goal, GoalStatus, Milestone, Task};

pub async fn insert_goal(
    pool: &SqlitePool,
    owner_id: Uuid,
    title: &str,
    description: Option<&str>,
    category: Option<&str>,
    target_date: Option<NaiveDate>,
    is_public: bool,
) -> Result<Goal, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, Goal>(
        r#"
        INSERT INTO goals (id, owner_id, title, description, category, status, target_date,
                           is_public, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, 'active', $6, $7, $8, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(title)
    .bind(description)
    .bind(category)
    .bind(target_date)
    .bind(is_public)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn get_goal(pool: &SqlitePool, goal_id: Uuid) -> Result<Option<Goal>, sqlx::Error> {
    sqlx::query_as::<_, Goal>("SELECT * FROM goals WHERE id = $1")
        .bind(goal_id)
        .fetch_optional(pool)
        .await
}

/// The owner's goals, newest first
pub async fn list_for_owner(
    pool: &SqlitePool,
    owner_id: Uuid,
    status: Option<GoalStatus>,
    public_only: bool,
    page: Page,
) -> Result<(Vec<Goal>, i64), sqlx::Error> {
    let filter = r#"
        FROM goals
        WHERE owner_id = $1
          AND ($2 IS NULL OR status = $2)
          AND ($3 = 0 OR is_public = 1)
    "#;

    let goals = sqlx::query_as::<_, Goal>(&format!(
        "SELECT * {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
        filter
    ))
    .bind(owner_id)
    .bind(status)
    .bind(public_only)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {}", filter))
        .bind(owner_id)
        .bind(status)
        .bind(public_only)
        .fetch_one(pool)
        .await?;

    Ok((goals, total))
}

#[allow(clippy::too_many_arguments)]
pub async fn update_goal(
    pool: &SqlitePool,
    goal_id: Uuid,
    title: &str,
    description: Option<&str>,
    category: Option<&str>,
    target_date: Option<NaiveDate>,
    is_public: bool,
    status: GoalStatus,
) -> Result<Goal, sqlx::Error> {
    sqlx::query_as::<_, Goal>(
        r#"
        UPDATE goals
        SET title = $1, description = $2, category = $3, target_date = $4,
            is_public = $5, status = $6, updated_at = $7
        WHERE id = $8
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(category)
    .bind(target_date)
    .bind(is_public)
    .bind(status)
    .bind(Utc::now())
    .bind(goal_id)
    .fetch_one(pool)
    .await
}

pub async fn complete_goal(pool: &SqlitePool, goal_id: Uuid) -> Result<Goal, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, Goal>(
        r#"
        UPDATE goals SET status = 'completed', progress = 100, completed_at = $1, updated_at = $1
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(now)
    .bind(goal_id)
    .fetch_one(pool)
    .await
}

pub async fn set_progress(pool: &SqlitePool, goal_id: Uuid, progress: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE goals SET progress = $1, updated_at = $2 WHERE id = $3")
        .bind(progress)
        .bind(Utc::now())
        .bind(goal_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a goal with its milestones and tasks
pub async fn delete_goal(pool: &SqlitePool, goal_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM tasks WHERE goal_id = $1")
        .bind(goal_id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM milestones WHERE goal_id = $1")
        .bind(goal_id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM goals WHERE id = $1")
        .bind(goal_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// (completed, total) over milestones and tasks
pub async fn item_counts(pool: &SqlitePool, goal_id: Uuid) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM milestones WHERE goal_id = $1 AND is_completed = 1)
          + (SELECT COUNT(*) FROM tasks WHERE goal_id = $1 AND is_completed = 1),
            (SELECT COUNT(*) FROM milestones WHERE goal_id = $1)
          + (SELECT COUNT(*) FROM tasks WHERE goal_id = $1)
        "#,
    )
    .bind(goal_id)
    .fetch_one(pool)
    .await
}

pub async fn insert_milestone(
    pool: &SqlitePool,
    goal_id: Uuid,
    title: &str,
    due_date: Option<NaiveDate>,
) -> Result<Milestone, sqlx::Error> {
    sqlx::query_as::<_, Milestone>(
        r#"
        INSERT INTO milestones (id, goal_id, title, due_date, position, created_at)
        VALUES ($1, $2, $3, $4, (SELECT COUNT(*) FROM milestones WHERE goal_id = $2), $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(goal_id)
    .bind(title)
    .bind(due_date)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn list_milestones(pool: &SqlitePool, goal_id: Uuid) -> Result<Vec<Milestone>, sqlx::Error> {
    sqlx::query_as::<_, Milestone>("SELECT * FROM milestones WHERE goal_id = $1 ORDER BY position")
        .bind(goal_id)
        .fetch_all(pool)
        .await
}

pub async fn get_milestone(pool: &SqlitePool, milestone_id: Uuid) -> Result<Option<Milestone>, sqlx::Error> {
    sqlx::query_as::<_, Milestone>("SELECT * FROM milestones WHERE id = $1")
        .bind(milestone_id)
        .fetch_optional(pool)
        .await
}

pub async fn update_milestone(
    pool: &SqlitePool,
    milestone_id: Uuid,
    title: &str,
    due_date: Option<NaiveDate>,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
) -> Result<Milestone, sqlx::Error> {
    sqlx::query_as::<_, Milestone>(
        r#"
        UPDATE milestones SET title = $1, due_date = $2, is_completed = $3, completed_at = $4
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(due_date)
    .bind(is_completed)
    .bind(completed_at)
    .bind(milestone_id)
    .fetch_one(pool)
    .await
}

/// Delete a milestone; its tasks stay on the goal
pub async fn delete_milestone(pool: &SqlitePool, milestone_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tasks SET milestone_id = NULL WHERE milestone_id = $1")
        .bind(milestone_id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM milestones WHERE id = $1")
        .bind(milestone_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn insert_task(
    pool: &SqlitePool,
    goal_id: Uuid,
    owner_id: Uuid,
    milestone_id: Option<Uuid>,
    title: &str,
    due_date: Option<NaiveDate>,
) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (id, goal_id, milestone_id, owner_id, title, due_date, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(goal_id)
    .bind(milestone_id)
    .bind(owner_id)
    .bind(title)
    .bind(due_date)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn list_tasks(pool: &SqlitePool, goal_id: Uuid) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE goal_id = $1 ORDER BY created_at")
        .bind(goal_id)
        .fetch_all(pool)
        .await
}

pub async fn get_task(pool: &SqlitePool, task_id: Uuid) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(task_id)
        .fetch_optional(pool)
        .await
}

pub async fn update_task(
    pool: &SqlitePool,
    task_id: Uuid,
    title: &str,
    due_date: Option<NaiveDate>,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks SET title = $1, due_date = $2, is_completed = $3, completed_at = $4
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(due_date)
    .bind(is_completed)
    .bind(completed_at)
    .bind(task_id)
    .fetch_one(pool)
    .await
}

pub async fn delete_task(pool: &SqlitePool, task_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_id)
        .execute(pool)
        .await?;
    Ok(())
}

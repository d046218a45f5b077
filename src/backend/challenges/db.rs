//! Challenge queries

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::api::Page;
use crate::shared::challenges::{
    Challenge, ChallengeParticipant, ChallengeStanding, CreateChallengeRequest,
};

const CHALLENGE_SELECT: &str = r#"
    SELECT c.id, c.creator_id, c.title, c.description, c.category, c.target_value, c.unit,
           c.start_date, c.end_date, c.points_reward, c.is_public, c.military_only,
           (SELECT COUNT(*) FROM challenge_participants p WHERE p.challenge_id = c.id) AS participant_count,
           c.created_at, c.updated_at
    FROM challenges c
"#;

/// Insert a challenge from already validated input
pub async fn insert_challenge(
    pool: &SqlitePool,
    creator_id: Uuid,
    request: &CreateChallengeRequest,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO challenges (id, creator_id, title, description, category, target_value, unit,
                                start_date, end_date, points_reward, is_public, military_only,
                                created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
        "#,
    )
    .bind(id)
    .bind(creator_id)
    .bind(&request.title)
    .bind(&request.description)
    .bind(&request.category)
    .bind(request.target_value)
    .bind(&request.unit)
    .bind(request.start_date)
    .bind(request.end_date)
    .bind(request.points_reward)
    .bind(request.is_public)
    .bind(request.military_only)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(id)
}

/// A challenge that has not been deleted
pub async fn get_challenge(pool: &SqlitePool, challenge_id: Uuid) -> Result<Option<Challenge>, sqlx::Error> {
    sqlx::query_as::<_, Challenge>(&format!(
        "{} WHERE c.id = $1 AND c.is_deleted = 0",
        CHALLENGE_SELECT
    ))
    .bind(challenge_id)
    .fetch_optional(pool)
    .await
}

/// Public challenges; `running_on` keeps only those whose window contains that day
pub async fn list_public(
    pool: &SqlitePool,
    running_on: Option<NaiveDate>,
    category: Option<&str>,
    page: Page,
) -> Result<(Vec<Challenge>, i64), sqlx::Error> {
    let filter = r#"
        WHERE c.is_deleted = 0 AND c.is_public = 1
          AND ($1 IS NULL OR (c.start_date <= $1 AND c.end_date >= $1))
          AND ($2 IS NULL OR c.category = $2)
    "#;

    let challenges = sqlx::query_as::<_, Challenge>(&format!(
        "{} {} ORDER BY c.start_date DESC, c.created_at DESC LIMIT $3 OFFSET $4",
        CHALLENGE_SELECT, filter
    ))
    .bind(running_on)
    .bind(category)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM challenges c {}", filter))
        .bind(running_on)
        .bind(category)
        .fetch_one(pool)
        .await?;

    Ok((challenges, total))
}

#[allow(clippy::too_many_arguments)]
pub async fn update_challenge(
    pool: &SqlitePool,
    challenge_id: Uuid,
    title: &str,
    description: Option<&str>,
    category: Option<&str>,
    end_date: NaiveDate,
    points_reward: i64,
    is_public: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE challenges
        SET title = $1, description = $2, category = $3, end_date = $4, points_reward = $5,
            is_public = $6, updated_at = $7
        WHERE id = $8
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(category)
    .bind(end_date)
    .bind(points_reward)
    .bind(is_public)
    .bind(Utc::now())
    .bind(challenge_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn soft_delete(pool: &SqlitePool, challenge_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE challenges SET is_deleted = 1, updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(challenge_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_participant(
    pool: &SqlitePool,
    challenge_id: Uuid,
    user_id: Uuid,
) -> Result<Option<ChallengeParticipant>, sqlx::Error> {
    sqlx::query_as::<_, ChallengeParticipant>(
        "SELECT * FROM challenge_participants WHERE challenge_id = $1 AND user_id = $2",
    )
    .bind(challenge_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn join(
    pool: &SqlitePool,
    challenge_id: Uuid,
    user_id: Uuid,
) -> Result<ChallengeParticipant, sqlx::Error> {
    sqlx::query_as::<_, ChallengeParticipant>(
        r#"
        INSERT INTO challenge_participants (challenge_id, user_id, joined_at)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(challenge_id)
    .bind(user_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn leave(pool: &SqlitePool, challenge_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM challenge_participants WHERE challenge_id = $1 AND user_id = $2 AND completed = 0",
    )
        .bind(challenge_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn add_progress(
    pool: &SqlitePool,
    challenge_id: Uuid,
    user_id: Uuid,
    amount: f64,
) -> Result<ChallengeParticipant, sqlx::Error> {
    sqlx::query_as::<_, ChallengeParticipant>(
        r#"
        UPDATE challenge_participants SET progress = progress + $1
        WHERE challenge_id = $2 AND user_id = $3
        RETURNING *
        "#,
    )
    .bind(amount)
    .bind(challenge_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Flag completion; only flips a participant that is not completed yet
pub async fn mark_completed(
    pool: &SqlitePool,
    challenge_id: Uuid,
    user_id: Uuid,
) -> Result<Option<ChallengeParticipant>, sqlx::Error> {
    sqlx::query_as::<_, ChallengeParticipant>(
        r#"
        UPDATE challenge_participants SET completed = 1, completed_at = $1
        WHERE challenge_id = $2 AND user_id = $3 AND completed = 0
        RETURNING *
        "#,
    )
    .bind(Utc::now())
    .bind(challenge_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Progress desc, then earliest completion, then username
pub async fn standings(pool: &SqlitePool, challenge_id: Uuid) -> Result<Vec<ChallengeStanding>, sqlx::Error> {
    sqlx::query_as::<_, ChallengeStanding>(
        r#"
        SELECT p.user_id, u.username, p.progress, p.completed, p.completed_at
        FROM challenge_participants p
        JOIN users u ON u.id = p.user_id
        WHERE p.challenge_id = $1
        ORDER BY p.progress DESC,
                 p.completed_at IS NULL,
                 p.completed_at ASC,
                 u.username ASC
        "#,
    )
    .bind(challenge_id)
    .fetch_all(pool)
    .await
}

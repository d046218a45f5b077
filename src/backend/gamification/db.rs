//! Gamification queries: points ledger, streaks, badges and leaderboards

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::api::Page;
use crate::shared::gamification::{
    Badge, BadgeMetric, CreateBadgeRequest, LeaderboardEntry, PointTransaction, Streak, UserBadge,
};

use super::rules::level_for_points;

/// Append to the ledger and update the user's total and level
///
/// # Returns
/// The user's new points total
pub async fn add_points(
    pool: &SqlitePool,
    user_id: Uuid,
    amount: i64,
    reason: &str,
    source_type: Option<&str>,
    source_id: Option<Uuid>,
) -> Result<i64, sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO point_transactions (id, user_id, amount, reason, source_type, source_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(amount)
    .bind(reason)
    .bind(source_type)
    .bind(source_id)
    .bind(now)
    .execute(pool)
    .await?;

    let total: i64 =
        sqlx::query_scalar("UPDATE users SET points = points + $1 WHERE id = $2 RETURNING points")
            .bind(amount)
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    sqlx::query("UPDATE users SET level = $1 WHERE id = $2")
        .bind(level_for_points(total))
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(total)
}

pub async fn points_history(
    pool: &SqlitePool,
    user_id: Uuid,
    page: Page,
) -> Result<(Vec<PointTransaction>, i64), sqlx::Error> {
    let items = sqlx::query_as::<_, PointTransaction>(
        r#"
        SELECT * FROM point_transactions
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM point_transactions WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok((items, total))
}

pub async fn get_streak(
    pool: &SqlitePool,
    user_id: Uuid,
    kind: &str,
) -> Result<Option<Streak>, sqlx::Error> {
    sqlx::query_as::<_, Streak>("SELECT * FROM streaks WHERE user_id = $1 AND kind = $2")
        .bind(user_id)
        .bind(kind)
        .fetch_optional(pool)
        .await
}

pub async fn list_streaks(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Streak>, sqlx::Error> {
    sqlx::query_as::<_, Streak>("SELECT * FROM streaks WHERE user_id = $1 ORDER BY kind")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn save_streak(
    pool: &SqlitePool,
    user_id: Uuid,
    kind: &str,
    current: i64,
    longest: i64,
    last_date: Option<NaiveDate>,
) -> Result<Streak, sqlx::Error> {
    sqlx::query_as::<_, Streak>(
        r#"
        INSERT INTO streaks (user_id, kind, current_count, longest_count, last_activity_date, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id, kind) DO UPDATE SET
            current_count = excluded.current_count,
            longest_count = excluded.longest_count,
            last_activity_date = excluded.last_activity_date,
            updated_at = excluded.updated_at
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(kind)
    .bind(current)
    .bind(longest)
    .bind(last_date)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn list_badges(pool: &SqlitePool) -> Result<Vec<Badge>, sqlx::Error> {
    sqlx::query_as::<_, Badge>("SELECT * FROM badges ORDER BY key")
        .fetch_all(pool)
        .await
}

pub async fn create_badge(pool: &SqlitePool, request: &CreateBadgeRequest) -> Result<Badge, sqlx::Error> {
    sqlx::query_as::<_, Badge>(
        r#"
        INSERT INTO badges (id, key, name, description, metric, thresholds, points_per_level, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&request.key)
    .bind(&request.name)
    .bind(&request.description)
    .bind(request.metric)
    .bind(sqlx::types::Json(&request.thresholds))
    .bind(request.points_per_level)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/// Every badge with the user's progress (level 0 when untouched)
pub async fn user_badges(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<UserBadge>, sqlx::Error> {
    sqlx::query_as::<_, UserBadge>(
        r#"
        SELECT b.id AS badge_id, b.key, b.name, b.description, b.metric, b.thresholds,
               COALESCE(p.current_value, 0) AS current_value,
               COALESCE(p.level, 0) AS level,
               p.earned_at
        FROM badges b
        LEFT JOIN badge_progress p ON p.badge_id = b.id AND p.user_id = $1
        ORDER BY b.key
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Track the metric without touching the level
pub async fn save_badge_progress(
    pool: &SqlitePool,
    user_id: Uuid,
    badge_id: Uuid,
    current_value: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO badge_progress (user_id, badge_id, current_value, level, earned_at, updated_at)
        VALUES ($1, $2, $3, 0, NULL, $4)
        ON CONFLICT (user_id, badge_id) DO UPDATE SET
            current_value = excluded.current_value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(badge_id)
    .bind(current_value)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

/// Move a badge from `from_level` to `to_level`
///
/// Compare-and-set on the stored level: returns false when another request
/// already moved it, in which case nothing is awarded.
pub async fn advance_badge_level(
    pool: &SqlitePool,
    user_id: Uuid,
    badge_id: Uuid,
    current_value: i64,
    from_level: i64,
    to_level: i64,
) -> Result<bool, sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO badge_progress (user_id, badge_id, current_value, level, earned_at, updated_at)
        VALUES ($1, $2, 0, 0, NULL, $3)
        ON CONFLICT (user_id, badge_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(badge_id)
    .bind(now)
    .execute(pool)
    .await?;

    let result = sqlx::query(
        r#"
        UPDATE badge_progress
        SET current_value = $1, level = $2, earned_at = COALESCE(earned_at, $3), updated_at = $3
        WHERE user_id = $4 AND badge_id = $5 AND level = $6
        "#,
    )
    .bind(current_value)
    .bind(to_level)
    .bind(now)
    .bind(user_id)
    .bind(badge_id)
    .bind(from_level)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn badges_earned(pool: &SqlitePool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM badge_progress WHERE user_id = $1 AND level > 0")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Current value of a badge metric for one user
pub async fn metric_value(
    pool: &SqlitePool,
    user_id: Uuid,
    metric: BadgeMetric,
) -> Result<i64, sqlx::Error> {
    let sql = match metric {
        BadgeMetric::GoalsCompleted => {
            "SELECT COUNT(*) FROM goals WHERE owner_id = $1 AND status = 'completed'"
        }
        BadgeMetric::TasksCompleted => {
            "SELECT COUNT(*) FROM tasks WHERE owner_id = $1 AND is_completed = 1"
        }
        BadgeMetric::PostsPublished => {
            "SELECT COUNT(*) FROM blog_posts WHERE author_id = $1 AND status = 'published' AND is_deleted = 0"
        }
        BadgeMetric::CommentsWritten => {
            "SELECT COUNT(*) FROM comments WHERE author_id = $1 AND is_deleted = 0"
        }
        BadgeMetric::ChallengesCompleted => {
            "SELECT COUNT(*) FROM challenge_participants WHERE user_id = $1 AND completed = 1"
        }
        BadgeMetric::FriendsCount => {
            "SELECT COUNT(*) FROM friendships WHERE status = 'accepted' AND (requester_id = $1 OR addressee_id = $1)"
        }
        BadgeMetric::StreakDays => {
            "SELECT COALESCE(MAX(longest_count), 0) FROM streaks WHERE user_id = $1 AND kind = 'daily'"
        }
        BadgeMetric::Points => "SELECT COALESCE(MAX(points), 0) FROM users WHERE id = $1",
    };

    sqlx::query_scalar(sql).bind(user_id).fetch_one(pool).await
}

/// 1 + number of eligible users with strictly more points
pub async fn global_rank(pool: &SqlitePool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT 1 + COUNT(*) FROM users
        WHERE is_active = 1 AND is_banned = 0
          AND points > (SELECT points FROM users WHERE id = $1)
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

const AUDIENCE: &str = r#"
    (u.id = $1 OR u.id IN (
        SELECT CASE WHEN requester_id = $1 THEN addressee_id ELSE requester_id END
        FROM friendships
        WHERE status = 'accepted' AND (requester_id = $1 OR addressee_id = $1)
    ))
"#;

/// Points leaderboard rows ordered by score desc, username asc
///
/// `since` switches from lifetime points to the ledger sum since that time;
/// `friends_of` restricts to that user and their accepted friends.
pub async fn points_leaderboard(
    pool: &SqlitePool,
    since: Option<DateTime<Utc>>,
    friends_of: Option<Uuid>,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    let audience = if friends_of.is_some() { AUDIENCE } else { "1 = 1" };
    let sql = match since {
        None => format!(
            r#"
            SELECT u.id AS user_id, u.username, u.display_name, u.points AS score, u.level
            FROM users u
            WHERE u.is_active = 1 AND u.is_banned = 0 AND {}
            ORDER BY score DESC, u.username ASC
            LIMIT $2
            "#,
            audience
        ),
        Some(_) => format!(
            r#"
            SELECT u.id AS user_id, u.username, u.display_name,
                   CAST(SUM(t.amount) AS INTEGER) AS score, u.level
            FROM point_transactions t
            JOIN users u ON u.id = t.user_id
            WHERE u.is_active = 1 AND u.is_banned = 0 AND t.created_at >= $3 AND {}
            GROUP BY u.id
            HAVING score > 0
            ORDER BY score DESC, u.username ASC
            LIMIT $2
            "#,
            audience
        ),
    };

    let mut query = sqlx::query_as::<_, LeaderboardEntry>(&sql)
        .bind(friends_of.unwrap_or_else(Uuid::nil))
        .bind(limit);
    if let Some(since) = since {
        query = query.bind(since);
    }
    query.fetch_all(pool).await
}

/// Daily streak leaderboard; streaks not touched since `yesterday` are broken
pub async fn streak_leaderboard(
    pool: &SqlitePool,
    yesterday: NaiveDate,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT u.id AS user_id, u.username, u.display_name, s.current_count AS score, u.level
        FROM streaks s
        JOIN users u ON u.id = s.user_id
        WHERE s.kind = 'daily' AND s.last_activity_date >= $1 AND s.current_count > 0
          AND u.is_active = 1 AND u.is_banned = 0
        ORDER BY score DESC, u.username ASC
        LIMIT $2
        "#,
    )
    .bind(yesterday)
    .bind(limit)
    .fetch_all(pool)
    .await
}

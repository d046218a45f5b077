//! Gamification Data Structures
//!
//! Points, levels, badges, streaks and leaderboards.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counter a badge is measured against
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "ssr", derive(sqlx::Type))]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ssr", sqlx(rename_all = "snake_case"))]
pub enum BadgeMetric {
    GoalsCompleted,
    TasksCompleted,
    PostsPublished,
    CommentsWritten,
    ChallengesCompleted,
    FriendsCount,
    StreakDays,
    Points,
}

impl BadgeMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeMetric::GoalsCompleted => "goals_completed",
            BadgeMetric::TasksCompleted => "tasks_completed",
            BadgeMetric::PostsPublished => "posts_published",
            BadgeMetric::CommentsWritten => "comments_written",
            BadgeMetric::ChallengesCompleted => "challenges_completed",
            BadgeMetric::FriendsCount => "friends_count",
            BadgeMetric::StreakDays => "streak_days",
            BadgeMetric::Points => "points",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct Badge {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub metric: BadgeMetric,
    /// Strictly increasing values; reaching the n-th one grants level n
    #[cfg_attr(feature = "ssr", sqlx(json))]
    pub thresholds: Vec<i64>,
    pub points_per_level: i64,
    pub created_at: DateTime<Utc>,
}

/// A badge together with one user's progress on it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct UserBadge {
    pub badge_id: Uuid,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub metric: BadgeMetric,
    #[cfg_attr(feature = "ssr", sqlx(json))]
    pub thresholds: Vec<i64>,
    pub current_value: i64,
    pub level: i64,
    pub earned_at: Option<DateTime<Utc>>,
}

impl UserBadge {
    /// Next value to reach, `None` once maxed out
    pub fn next_threshold(&self) -> Option<i64> {
        self.thresholds.get(self.level.max(0) as usize).copied()
    }
}

/// Level change produced by a badge evaluation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BadgeLevelUp {
    pub badge_id: Uuid,
    pub key: String,
    pub name: String,
    pub previous_level: i64,
    pub new_level: i64,
    pub points_awarded: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct Streak {
    pub user_id: Uuid,
    pub kind: String,
    pub current_count: i64,
    pub longest_count: i64,
    pub last_activity_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct PointTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub reason: String,
    pub source_type: Option<String>,
    pub source_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct LeaderboardEntry {
    #[cfg_attr(feature = "ssr", sqlx(skip))]
    #[serde(default)]
    pub rank: i64,
    pub user_id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub score: i64,
    pub level: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardScope {
    #[default]
    Global,
    Friends,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardPeriod {
    #[default]
    All,
    Weekly,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub scope: LeaderboardScope,
    #[serde(default)]
    pub period: LeaderboardPeriod,
    pub limit: Option<i64>,
}

/// `GET /api/gamification/me`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GamificationSummary {
    pub points: i64,
    pub level: i64,
    /// Points total at which the next level starts
    pub next_level_points: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub badges_earned: i64,
    pub global_rank: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckInResult {
    pub streak: Streak,
    pub already_checked_in: bool,
    pub points_awarded: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBadgeRequest {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub metric: BadgeMetric,
    pub thresholds: Vec<i64>,
    #[serde(default)]
    pub points_per_level: i64,
}

//! Challenges
//!
//! A challenge has a numeric target (e.g. 100 km) and a date window.
//! Participants report progress; reaching the target completes the
//! challenge for that participant once.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct Challenge {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub target_value: f64,
    pub unit: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub points_reward: i64,
    pub is_public: bool,
    pub military_only: bool,
    pub participant_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Challenge {
    pub fn has_ended(&self, today: NaiveDate) -> bool {
        today > self.end_date
    }

    pub fn is_running(&self, today: NaiveDate) -> bool {
        self.start_date <= today && today <= self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct ChallengeParticipant {
    pub challenge_id: Uuid,
    pub user_id: Uuid,
    pub progress: f64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct ChallengeStanding {
    #[cfg_attr(feature = "ssr", sqlx(skip))]
    #[serde(default)]
    pub rank: i64,
    pub user_id: Uuid,
    pub username: String,
    pub progress: f64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Result of reporting progress
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressOutcome {
    pub participant: ChallengeParticipant,
    /// True only on the update that first reached the target
    pub just_completed: bool,
    pub points_awarded: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChallengeRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub target_value: f64,
    pub unit: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub points_reward: i64,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub military_only: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChallengeRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub points_reward: Option<i64>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRequest {
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChallengeListQuery {
    /// Only challenges running today
    #[serde(default)]
    pub active: bool,
    pub category: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

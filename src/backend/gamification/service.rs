/**
 * Gamification Service
 *
 * Every gamified action funnels through `record_activity`:
 *
 * 1. append an activity log entry
 * 2. award the action's points
 * 3. advance the daily streak
 * 4. re-evaluate badges, awarding level-up points and notifying
 *
 * Points paid out for badge level-ups go through `award_points` directly and
 * never trigger another evaluation.
 */

use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use super::db;
use super::rules::{self, StreakState, DAILY_STREAK};
use crate::backend::activity::log_activity;
use crate::backend::error::BackendError;
use crate::backend::notifications::notify;
use crate::backend::server::state::AppState;
use crate::shared::gamification::{
    BadgeLevelUp, GamificationSummary, LeaderboardEntry, LeaderboardPeriod, LeaderboardQuery,
    LeaderboardScope, Streak,
};
use crate::shared::notifications::NotificationKind;

/// A gamified action performed by a user
#[derive(Debug, Clone)]
pub struct ActivityRecord<'a> {
    pub user_id: Uuid,
    pub action: &'a str,
    pub entity_type: Option<&'a str>,
    pub entity_id: Option<Uuid>,
    pub points: i64,
    pub metadata: Value,
}

impl<'a> ActivityRecord<'a> {
    pub fn new(user_id: Uuid, action: &'a str) -> Self {
        Self {
            user_id,
            action,
            entity_type: None,
            entity_id: None,
            points: 0,
            metadata: json!({}),
        }
    }

    pub fn entity(mut self, entity_type: &'a str, entity_id: Uuid) -> Self {
        self.entity_type = Some(entity_type);
        self.entity_id = Some(entity_id);
        self
    }

    pub fn points(mut self, points: i64) -> Self {
        self.points = points;
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// What a recorded activity earned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityOutcome {
    pub points_awarded: i64,
    pub level_ups: Vec<BadgeLevelUp>,
}

/// Log, award, advance the streak and evaluate badges
pub async fn record_activity(
    app_state: &AppState,
    record: ActivityRecord<'_>,
) -> Result<ActivityOutcome, BackendError> {
    log_activity(
        &app_state.db,
        record.user_id,
        record.action,
        record.entity_type,
        record.entity_id,
        &record.metadata,
    )
    .await?;

    if record.points > 0 {
        award_points(
            app_state,
            record.user_id,
            record.points,
            record.action,
            record.entity_type,
            record.entity_id,
        )
        .await?;
    }

    record_streak(app_state, record.user_id, DAILY_STREAK).await?;
    let level_ups = evaluate_badges(app_state, record.user_id).await?;

    Ok(ActivityOutcome {
        points_awarded: record.points,
        level_ups,
    })
}

/// Add points to the ledger without evaluating badges
pub async fn award_points(
    app_state: &AppState,
    user_id: Uuid,
    amount: i64,
    reason: &str,
    source_type: Option<&str>,
    source_id: Option<Uuid>,
) -> Result<i64, BackendError> {
    let total = db::add_points(&app_state.db, user_id, amount, reason, source_type, source_id).await?;
    tracing::debug!("Awarded {} points to {} for {} (total {})", amount, user_id, reason, total);
    Ok(total)
}

/// Advance a streak for today
///
/// # Returns
/// The stored streak and whether it changed (false if already counted today)
pub async fn record_streak(
    app_state: &AppState,
    user_id: Uuid,
    kind: &str,
) -> Result<(Streak, bool), BackendError> {
    let today = Utc::now().date_naive();
    let stored = db::get_streak(&app_state.db, user_id, kind).await?;
    let state = stored
        .as_ref()
        .map(|s| StreakState {
            current: s.current_count,
            longest: s.longest_count,
            last_date: s.last_activity_date,
        })
        .unwrap_or(StreakState::EMPTY);

    let (next, changed) = rules::advance_streak(state, today);
    match stored {
        Some(streak) if !changed => Ok((streak, false)),
        _ => {
            let streak = db::save_streak(
                &app_state.db,
                user_id,
                kind,
                next.current,
                next.longest,
                next.last_date,
            )
            .await?;
            Ok((streak, true))
        }
    }
}

/// Streak as it reads today: a broken streak reports a current count of 0
pub fn effective_streak(mut streak: Streak) -> Streak {
    let state = StreakState {
        current: streak.current_count,
        longest: streak.longest_count,
        last_date: streak.last_activity_date,
    };
    streak.current_count = rules::effective_current(state, Utc::now().date_naive());
    streak
}

/// Recompute every badge for a user and pay out level-ups
pub async fn evaluate_badges(
    app_state: &AppState,
    user_id: Uuid,
) -> Result<Vec<BadgeLevelUp>, BackendError> {
    let mut level_ups = Vec::new();
    let progress: HashMap<Uuid, (i64, i64)> = db::user_badges(&app_state.db, user_id)
        .await?
        .into_iter()
        .map(|b| (b.badge_id, (b.current_value, b.level)))
        .collect();

    for badge in db::list_badges(&app_state.db).await? {
        let (stored_value, stored_level) = progress.get(&badge.id).copied().unwrap_or((0, 0));
        let value = db::metric_value(&app_state.db, user_id, badge.metric).await?;
        let reached = rules::badge_level(&badge.thresholds, value);

        if reached <= stored_level {
            if value != stored_value {
                db::save_badge_progress(&app_state.db, user_id, badge.id, value).await?;
            }
            continue;
        }

        if !db::advance_badge_level(&app_state.db, user_id, badge.id, value, stored_level, reached).await? {
            tracing::debug!("Badge {} for {} already advanced elsewhere", badge.key, user_id);
            continue;
        }
        let points = (reached - stored_level) * badge.points_per_level;

        if points > 0 {
            award_points(app_state, user_id, points, "badge_level_up", Some("badge"), Some(badge.id))
                .await?;
        }

        notify(
            app_state,
            user_id,
            NotificationKind::BadgeEarned,
            &format!("{} level {}", badge.name, reached),
            badge.description.as_deref(),
            json!({ "badge_id": badge.id, "key": badge.key, "level": reached }),
        )
        .await?;

        tracing::info!("User {} reached {} level {}", user_id, badge.key, reached);
        level_ups.push(BadgeLevelUp {
            badge_id: badge.id,
            key: badge.key,
            name: badge.name,
            previous_level: stored_level,
            new_level: reached,
            points_awarded: points,
        });
    }

    Ok(level_ups)
}

pub async fn summary(app_state: &AppState, user_id: Uuid) -> Result<GamificationSummary, BackendError> {
    let (points, level): (i64, i64) = sqlx::query_as("SELECT points, level FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(&app_state.db)
        .await?;

    let daily = db::get_streak(&app_state.db, user_id, DAILY_STREAK)
        .await?
        .map(effective_streak);

    Ok(GamificationSummary {
        points,
        level,
        next_level_points: rules::points_for_level(level + 1),
        current_streak: daily.as_ref().map(|s| s.current_count).unwrap_or(0),
        longest_streak: daily.as_ref().map(|s| s.longest_count).unwrap_or(0),
        badges_earned: db::badges_earned(&app_state.db, user_id).await?,
        global_rank: db::global_rank(&app_state.db, user_id).await?,
    })
}

/// Fill in competition ranks for rows already ordered by score
pub fn rank_entries(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    let scores: Vec<i64> = entries.iter().map(|e| e.score).collect();
    for (entry, rank) in entries.iter_mut().zip(rules::competition_ranks(&scores)) {
        entry.rank = rank;
    }
    entries
}

pub async fn leaderboard(
    app_state: &AppState,
    user_id: Uuid,
    query: &LeaderboardQuery,
) -> Result<Vec<LeaderboardEntry>, BackendError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let since = match query.period {
        LeaderboardPeriod::All => None,
        LeaderboardPeriod::Weekly => Some(Utc::now() - Duration::days(7)),
    };
    let friends_of = match query.scope {
        LeaderboardScope::Global => None,
        LeaderboardScope::Friends => Some(user_id),
    };

    let entries = db::points_leaderboard(&app_state.db, since, friends_of, limit).await?;
    Ok(rank_entries(entries))
}

pub async fn streak_leaderboard(
    app_state: &AppState,
    limit: Option<i64>,
) -> Result<Vec<LeaderboardEntry>, BackendError> {
    let today = Utc::now().date_naive();
    let yesterday = today.pred_opt().unwrap_or(today);
    let entries =
        db::streak_leaderboard(&app_state.db, yesterday, limit.unwrap_or(20).clamp(1, 100)).await?;
    Ok(rank_entries(entries))
}

//! Gamification HTTP Handlers

use axum::extract::{Query, State};
use serde_json::json;

use super::db;
use super::rules::{CHECK_IN_POINTS, CHECK_IN_STREAK};
use super::service::{self, effective_streak, ActivityRecord};
use crate::backend::error::{ok, ok_with, ApiResult};
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::api::{PageQuery, Paginated};
use crate::shared::gamification::{
    Badge, CheckInResult, GamificationSummary, LeaderboardEntry, LeaderboardQuery, PointTransaction,
    Streak, UserBadge,
};

/// `GET /api/gamification/me`
pub async fn my_summary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<GamificationSummary> {
    ok(service::summary(&state, user.user_id).await?)
}

/// `GET /api/badges` - the badge catalogue
pub async fn list_badges(State(state): State<AppState>) -> ApiResult<Vec<Badge>> {
    ok(db::list_badges(&state.db).await?)
}

/// `GET /api/badges/me` - every badge with the caller's progress
pub async fn my_badges(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Vec<UserBadge>> {
    ok(db::user_badges(&state.db, user.user_id).await?)
}

/// `GET /api/streaks/me`
pub async fn my_streaks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Vec<Streak>> {
    let streaks = db::list_streaks(&state.db, user.user_id)
        .await?
        .into_iter()
        .map(effective_streak)
        .collect();
    ok(streaks)
}

/// Daily check-in
///
/// The first check-in of a day advances the check-in streak and pays
/// `CHECK_IN_POINTS`; later ones in the same day report
/// `already_checked_in` and pay nothing.
///
/// # Example Request
///
/// ```http
/// POST /api/streaks/check-in HTTP/1.1
/// Authorization: Bearer <token>
/// ```
pub async fn check_in(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<CheckInResult> {
    let (streak, changed) = service::record_streak(&state, user.user_id, CHECK_IN_STREAK).await?;

    if !changed {
        return ok_with(
            "Already checked in today",
            CheckInResult {
                streak,
                already_checked_in: true,
                points_awarded: 0,
            },
        );
    }

    let outcome = service::record_activity(
        &state,
        ActivityRecord::new(user.user_id, "check_in")
            .points(CHECK_IN_POINTS)
            .metadata(json!({ "streak": streak.current_count })),
    )
    .await?;

    tracing::info!("{} checked in (streak {})", user.username, streak.current_count);
    ok_with(
        "Checked in",
        CheckInResult {
            streak,
            already_checked_in: false,
            points_awarded: outcome.points_awarded,
        },
    )
}

/// `GET /api/leaderboard?scope=global|friends&period=all|weekly&limit=`
pub async fn leaderboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Vec<LeaderboardEntry>> {
    ok(service::leaderboard(&state, user.user_id, &query).await?)
}

/// `GET /api/leaderboard/streaks`
pub async fn streak_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Vec<LeaderboardEntry>> {
    ok(service::streak_leaderboard(&state, query.limit).await?)
}

/// `GET /api/points/history`
pub async fn points_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paginated<PointTransaction>> {
    let page = query.page();
    let (items, total) = db::points_history(&state.db, user.user_id, page).await?;
    ok(Paginated::new(items, page, total))
}

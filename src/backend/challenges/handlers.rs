//! Challenge HTTP Handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::db;
use crate::backend::error::{created, ok, ok_with, ApiResult, BackendError, CreatedResult};
use crate::backend::gamification::{record_activity, ActivityRecord};
use crate::backend::middleware::{AuthUser, AuthenticatedUser};
use crate::backend::notifications::notify;
use crate::backend::server::state::AppState;
use crate::shared::api::{Page, Paginated};
use crate::shared::challenges::{
    Challenge, ChallengeListQuery, ChallengeParticipant, ChallengeStanding, CreateChallengeRequest,
    ProgressOutcome, ProgressRequest, UpdateChallengeRequest,
};
use crate::shared::notifications::NotificationKind;
use crate::shared::users::Role;
use crate::shared::validation::{clean_optional, clean_required};

pub const MAX_CHALLENGE_TITLE_LENGTH: usize = 200;
pub const MAX_CHALLENGE_DESCRIPTION_LENGTH: usize = 2000;
pub const MAX_CHALLENGE_CATEGORY_LENGTH: usize = 50;
pub const MAX_UNIT_LENGTH: usize = 20;

async fn load_challenge(state: &AppState, challenge_id: Uuid) -> Result<Challenge, BackendError> {
    db::get_challenge(&state.db, challenge_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Challenge not found"))
}

/// Private challenges are visible to their creator, participants and admins
async fn visible_challenge(
    state: &AppState,
    challenge_id: Uuid,
    user: &AuthenticatedUser,
) -> Result<Challenge, BackendError> {
    let challenge = load_challenge(state, challenge_id).await?;
    if !challenge.is_public && challenge.creator_id != user.user_id && !user.is_admin() {
        let joined = db::get_participant(&state.db, challenge.id, user.user_id).await?;
        if joined.is_none() {
            return Err(BackendError::not_found("Challenge not found"));
        }
    }
    Ok(challenge)
}

async fn managed_challenge(
    state: &AppState,
    challenge_id: Uuid,
    user: &AuthenticatedUser,
) -> Result<Challenge, BackendError> {
    let challenge = visible_challenge(state, challenge_id, user).await?;
    if challenge.creator_id != user.user_id && !user.is_admin() {
        return Err(BackendError::forbidden("Only the creator can change this challenge"));
    }
    Ok(challenge)
}

/// `GET /api/challenges?active&category&page&limit`
pub async fn list_challenges(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(query): Query<ChallengeListQuery>,
) -> ApiResult<Paginated<Challenge>> {
    let page = Page::new(query.page, query.limit);
    let running_on = query.active.then(|| Utc::now().date_naive());
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let (challenges, total) = db::list_public(&state.db, running_on, category, page).await?;
    ok(Paginated::new(challenges, page, total))
}

/// Create a challenge
///
/// # Errors
///
/// * `400 Bad Request` - empty title or unit, `target_value <= 0`,
///   `end_date < start_date`, or a negative reward
///
/// # Example Request
///
/// ```http
/// POST /api/challenges HTTP/1.1
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// {
///   "title": "100 km in March",
///   "target_value": 100,
///   "unit": "km",
///   "start_date": "2025-03-01",
///   "end_date": "2025-03-31",
///   "points_reward": 50
/// }
/// ```
pub async fn create_challenge(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(mut request): Json<CreateChallengeRequest>,
) -> CreatedResult<Challenge> {
    request.title = clean_required("title", &request.title, MAX_CHALLENGE_TITLE_LENGTH)?;
    request.unit = clean_required("unit", &request.unit, MAX_UNIT_LENGTH)?;
    request.description = clean_optional(
        "description",
        request.description.as_deref(),
        MAX_CHALLENGE_DESCRIPTION_LENGTH,
    )?;
    request.category = clean_optional(
        "category",
        request.category.as_deref(),
        MAX_CHALLENGE_CATEGORY_LENGTH,
    )?;

    if !request.target_value.is_finite() || request.target_value <= 0.0 {
        return Err(BackendError::bad_request("target_value must be greater than 0"));
    }
    if request.end_date < request.start_date {
        return Err(BackendError::bad_request("end_date must not be before start_date"));
    }
    if request.points_reward < 0 {
        return Err(BackendError::bad_request("points_reward must not be negative"));
    }

    let id = db::insert_challenge(&state.db, user.user_id, &request).await?;
    let challenge = load_challenge(&state, id).await?;

    tracing::info!("Challenge {} created by {}", challenge.id, user.username);
    created("Challenge created", challenge)
}

/// `GET /api/challenges/{id}`
pub async fn get_challenge(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(challenge_id): Path<Uuid>,
) -> ApiResult<Challenge> {
    ok(visible_challenge(&state, challenge_id, &user).await?)
}

/// `PATCH /api/challenges/{id}` - creator or admin
pub async fn update_challenge(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(challenge_id): Path<Uuid>,
    Json(request): Json<UpdateChallengeRequest>,
) -> ApiResult<Challenge> {
    let challenge = managed_challenge(&state, challenge_id, &user).await?;

    let title = match request.title.as_deref() {
        Some(raw) => clean_required("title", raw, MAX_CHALLENGE_TITLE_LENGTH)?,
        None => challenge.title.clone(),
    };
    let description = match request.description.as_deref() {
        Some(raw) => clean_optional("description", Some(raw), MAX_CHALLENGE_DESCRIPTION_LENGTH)?,
        None => challenge.description.clone(),
    };
    let category = match request.category.as_deref() {
        Some(raw) => clean_optional("category", Some(raw), MAX_CHALLENGE_CATEGORY_LENGTH)?,
        None => challenge.category.clone(),
    };
    let end_date = request.end_date.unwrap_or(challenge.end_date);
    if end_date < challenge.start_date {
        return Err(BackendError::bad_request("end_date must not be before start_date"));
    }
    let points_reward = request.points_reward.unwrap_or(challenge.points_reward);
    if points_reward < 0 {
        return Err(BackendError::bad_request("points_reward must not be negative"));
    }

    db::update_challenge(
        &state.db,
        challenge.id,
        &title,
        description.as_deref(),
        category.as_deref(),
        end_date,
        points_reward,
        request.is_public.unwrap_or(challenge.is_public),
    )
    .await?;
    ok_with("Challenge updated", load_challenge(&state, challenge.id).await?)
}

/// `DELETE /api/challenges/{id}` - creator or admin; soft delete
pub async fn delete_challenge(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(challenge_id): Path<Uuid>,
) -> ApiResult<()> {
    let challenge = managed_challenge(&state, challenge_id, &user).await?;
    db::soft_delete(&state.db, challenge.id).await?;
    tracing::info!("Challenge {} deleted by {}", challenge.id, user.username);
    ok_with("Challenge deleted", ())
}

/// Join a challenge
///
/// # Errors
///
/// * `403 Forbidden` - military-only challenge without the `military` role
/// * `400 Bad Request` - the challenge has ended
/// * `409 Conflict` - already joined
pub async fn join_challenge(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(challenge_id): Path<Uuid>,
) -> CreatedResult<ChallengeParticipant> {
    let challenge = visible_challenge(&state, challenge_id, &user).await?;

    if challenge.military_only && !user.has_role(Role::Military) {
        tracing::warn!("{} tried to join military-only challenge {}", user.username, challenge.id);
        return Err(BackendError::forbidden("This challenge is limited to military members"));
    }
    if challenge.has_ended(Utc::now().date_naive()) {
        return Err(BackendError::bad_request("This challenge has ended"));
    }
    if db::get_participant(&state.db, challenge.id, user.user_id).await?.is_some() {
        return Err(BackendError::conflict("Already joined this challenge"));
    }

    let participant = db::join(&state.db, challenge.id, user.user_id).await?;
    tracing::info!("{} joined challenge {}", user.username, challenge.id);
    created("Joined challenge", participant)
}

/// `POST /api/challenges/{id}/leave`
pub async fn leave_challenge(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(challenge_id): Path<Uuid>,
) -> ApiResult<()> {
    let challenge = load_challenge(&state, challenge_id).await?;
    let participant = db::get_participant(&state.db, challenge.id, user.user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("You have not joined this challenge"))?;
    // The completed row is the record of the paid reward
    if participant.completed {
        return Err(BackendError::conflict("Completed challenges cannot be left"));
    }
    db::leave(&state.db, challenge.id, user.user_id).await?;
    ok_with("Left challenge", ())
}

/// Report progress
///
/// The update that first reaches the target completes the challenge, pays
/// `points_reward` and notifies the participant.
pub async fn report_progress(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(challenge_id): Path<Uuid>,
    Json(request): Json<ProgressRequest>,
) -> ApiResult<ProgressOutcome> {
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(BackendError::bad_request("amount must be greater than 0"));
    }
    let challenge = load_challenge(&state, challenge_id).await?;
    if db::get_participant(&state.db, challenge.id, user.user_id).await?.is_none() {
        return Err(BackendError::not_found("You have not joined this challenge"));
    }

    let mut participant = db::add_progress(&state.db, challenge.id, user.user_id, request.amount).await?;

    let mut outcome = ProgressOutcome {
        participant: participant.clone(),
        just_completed: false,
        points_awarded: 0,
    };
    if participant.completed || participant.progress < challenge.target_value {
        return ok(outcome);
    }

    if let Some(completed) = db::mark_completed(&state.db, challenge.id, user.user_id).await? {
        participant = completed;
        record_activity(
            &state,
            ActivityRecord::new(user.user_id, "challenge_completed")
                .entity("challenge", challenge.id)
                .points(challenge.points_reward)
                .metadata(json!({ "title": challenge.title })),
        )
        .await?;
        notify(
            &state,
            user.user_id,
            NotificationKind::ChallengeCompleted,
            &format!("You completed {}", challenge.title),
            None,
            json!({ "challenge_id": challenge.id, "points": challenge.points_reward }),
        )
        .await?;

        tracing::info!("{} completed challenge {}", user.username, challenge.id);
        outcome = ProgressOutcome {
            participant,
            just_completed: true,
            points_awarded: challenge.points_reward,
        };
    }

    ok(outcome)
}

/// `GET /api/challenges/{id}/leaderboard`
pub async fn leaderboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(challenge_id): Path<Uuid>,
) -> ApiResult<Vec<ChallengeStanding>> {
    let challenge = visible_challenge(&state, challenge_id, &user).await?;
    let mut standings = db::standings(&state.db, challenge.id).await?;
    for (index, standing) in standings.iter_mut().enumerate() {
        standing.rank = index as i64 + 1;
    }
    ok(standings)
}

//! Friend HTTP Handlers

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use super::db;
use crate::backend::auth::users::{get_user_by_id, get_user_by_username, User};
use crate::backend::error::{created, ok, ok_with, ApiResult, BackendError, CreatedResult};
use crate::backend::gamification::{record_activity, ActivityRecord};
use crate::backend::middleware::AuthUser;
use crate::backend::notifications::notify;
use crate::backend::server::state::AppState;
use crate::shared::notifications::NotificationKind;
use crate::shared::social::{
    Friend, FriendRequestView, Friendship, FriendshipStatus, RespondFriendRequest, SendFriendRequest,
};
use crate::shared::validation::clean_optional;

pub const MAX_REQUEST_MESSAGE_LENGTH: usize = 500;

async fn resolve_target(state: &AppState, request: &SendFriendRequest) -> Result<User, BackendError> {
    let user = match (request.user_id, request.username.as_deref()) {
        (Some(id), _) => get_user_by_id(&state.db, id).await?,
        (None, Some(username)) if !username.trim().is_empty() => {
            get_user_by_username(&state.db, username.trim()).await?
        }
        _ => return Err(BackendError::bad_request("username or user_id is required")),
    };
    user.filter(|u| u.is_active)
        .ok_or_else(|| BackendError::not_found("User not found"))
}

async fn active_user(state: &AppState, user_id: Uuid) -> Result<User, BackendError> {
    get_user_by_id(&state.db, user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| BackendError::not_found("User not found"))
}

/// Send a friend request
///
/// # Errors
///
/// * `400 Bad Request` - no target, or the target is the caller
/// * `403 Forbidden` - either side has blocked the other
/// * `404 Not Found` - target does not exist
/// * `409 Conflict` - already friends, or a request is pending either way
///
/// # Example Request
///
/// ```http
/// POST /api/friends/requests HTTP/1.1
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "username": "bob", "message": "Hi from the running club" }
/// ```
pub async fn send_request(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(request): Json<SendFriendRequest>,
) -> CreatedResult<Friendship> {
    let target = resolve_target(&state, &request).await?;
    if target.id == auth.user_id {
        return Err(BackendError::bad_request("You cannot send a friend request to yourself"));
    }

    let existing = db::between(&state.db, auth.user_id, target.id).await?;
    if existing.iter().any(|f| f.status == FriendshipStatus::Blocked) {
        tracing::warn!("Blocked friend request from {} to {}", auth.username, target.username);
        return Err(BackendError::forbidden("You cannot send a friend request to this user"));
    }
    if existing.iter().any(|f| f.status == FriendshipStatus::Accepted) {
        return Err(BackendError::conflict("Already friends"));
    }
    if existing.iter().any(|f| f.status == FriendshipStatus::Pending) {
        return Err(BackendError::conflict("A friend request is already pending"));
    }

    let message = clean_optional("message", request.message.as_deref(), MAX_REQUEST_MESSAGE_LENGTH)?;
    let friendship = db::upsert(
        &state.db,
        auth.user_id,
        target.id,
        FriendshipStatus::Pending,
        message.as_deref(),
    )
    .await?;

    notify(
        &state,
        target.id,
        NotificationKind::FriendRequest,
        &format!("{} sent you a friend request", auth.username),
        message.as_deref(),
        json!({ "request_id": friendship.id, "user_id": auth.user_id }),
    )
    .await?;

    tracing::info!("Friend request {} -> {}", auth.username, target.username);
    created("Friend request sent", friendship)
}

/// `GET /api/friends/requests` - pending requests addressed to the caller
pub async fn incoming_requests(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> ApiResult<Vec<FriendRequestView>> {
    ok(db::incoming_requests(&state.db, auth.user_id).await?)
}

/// `GET /api/friends/requests/sent`
pub async fn sent_requests(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> ApiResult<Vec<FriendRequestView>> {
    ok(db::sent_requests(&state.db, auth.user_id).await?)
}

/// Accept or reject a pending request addressed to the caller
pub async fn respond_request(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(request): Json<RespondFriendRequest>,
) -> ApiResult<Friendship> {
    let friendship = db::get_friendship(&state.db, request.request_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Friend request not found"))?;

    if friendship.addressee_id != auth.user_id {
        return Err(BackendError::forbidden("Only the recipient can respond to this request"));
    }
    if friendship.status != FriendshipStatus::Pending {
        return Err(BackendError::conflict("Friend request is no longer pending"));
    }

    if !request.accept {
        let rejected = db::respond(&state.db, friendship.id, FriendshipStatus::Rejected).await?;
        tracing::info!("{} rejected friend request {}", auth.username, friendship.id);
        return ok_with("Friend request rejected", rejected);
    }

    let accepted = db::respond(&state.db, friendship.id, FriendshipStatus::Accepted).await?;

    for (user_id, friend_id) in [
        (accepted.requester_id, accepted.addressee_id),
        (accepted.addressee_id, accepted.requester_id),
    ] {
        record_activity(
            &state,
            ActivityRecord::new(user_id, "friend_added").entity("user", friend_id),
        )
        .await?;
    }

    notify(
        &state,
        accepted.requester_id,
        NotificationKind::FriendAccepted,
        &format!("{} accepted your friend request", auth.username),
        None,
        json!({ "user_id": auth.user_id }),
    )
    .await?;

    tracing::info!("{} accepted friend request {}", auth.username, accepted.id);
    ok_with("Friend request accepted", accepted)
}

/// `DELETE /api/friends/requests/{id}` - requester withdraws a pending request
pub async fn cancel_request(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(request_id): Path<Uuid>,
) -> ApiResult<()> {
    let friendship = db::get_friendship(&state.db, request_id)
        .await?
        .filter(|f| f.requester_id == auth.user_id)
        .ok_or_else(|| BackendError::not_found("Friend request not found"))?;

    if friendship.status != FriendshipStatus::Pending {
        return Err(BackendError::conflict("Friend request is no longer pending"));
    }

    db::delete(&state.db, friendship.id).await?;
    ok_with("Friend request canceled", ())
}

/// `GET /api/friends`
pub async fn list_friends(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> ApiResult<Vec<Friend>> {
    ok(db::list_friends(&state.db, auth.user_id).await?)
}

/// `DELETE /api/friends/{user_id}`
pub async fn unfriend(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<()> {
    if !db::remove_friendship(&state.db, auth.user_id, user_id).await? {
        return Err(BackendError::not_found("Not friends with this user"));
    }
    tracing::info!("{} removed friend {}", auth.username, user_id);
    ok_with("Friend removed", ())
}

/// Block a user
///
/// Drops any friendship or pending request between the two users. A block
/// the other user already placed is left in place.
pub async fn block_user(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Friendship> {
    if user_id == auth.user_id {
        return Err(BackendError::bad_request("You cannot block yourself"));
    }
    let target = active_user(&state, user_id).await?;

    db::clear_for_block(&state.db, auth.user_id, target.id).await?;
    let block = db::upsert(&state.db, auth.user_id, target.id, FriendshipStatus::Blocked, None).await?;

    tracing::info!("{} blocked {}", auth.username, target.username);
    ok_with("User blocked", block)
}

//! User Profile HTTP Handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use bcrypt::{hash, verify};
use uuid::Uuid;

use super::db;
use crate::backend::auth::users::{get_user_by_id, update_password, User};
use crate::backend::error::{ok, ok_with, ApiResult, BackendError};
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::api::{Page, Paginated};
use crate::shared::users::{
    ChangePasswordRequest, ProfileOverview, UpdateProfileRequest, UserProfile, UserSearchQuery,
    UserSummary,
};
use crate::shared::validation::{clean_optional, is_valid_password};

pub const MAX_DISPLAY_NAME_LENGTH: usize = 50;
pub const MAX_BIO_LENGTH: usize = 500;
pub const MAX_AVATAR_URL_LENGTH: usize = 500;

async fn load_self(state: &AppState, user_id: Uuid) -> Result<User, BackendError> {
    get_user_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))
}

/// `GET /api/users/me` - own profile with counters
pub async fn get_my_profile(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> ApiResult<ProfileOverview> {
    let user = load_self(&state, auth.user_id).await?;
    let (friends_count, goals_completed, posts_published) =
        db::profile_counters(&state.db, user.id).await?;

    ok(ProfileOverview {
        profile: user.profile(),
        email: user.email,
        roles: user.roles,
        friends_count,
        goals_completed,
        posts_published,
        subscription_status: user.subscription_status,
    })
}

/// Update display name, bio and avatar
///
/// Omitted fields stay as they are; blank strings clear them.
///
/// # Example Request
///
/// ```http
/// PATCH /api/users/me HTTP/1.1
/// Content-Type: application/json
///
/// { "display_name": "Alice A.", "bio": "Runner" }
/// ```
pub async fn update_my_profile(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<UserProfile> {
    let user = load_self(&state, auth.user_id).await?;

    let display_name = match request.display_name.as_deref() {
        Some(raw) => clean_optional("display_name", Some(raw), MAX_DISPLAY_NAME_LENGTH)?,
        None => user.display_name,
    };
    let bio = match request.bio.as_deref() {
        Some(raw) => clean_optional("bio", Some(raw), MAX_BIO_LENGTH)?,
        None => user.bio,
    };
    let avatar_url = match request.avatar_url.as_deref() {
        Some(raw) => clean_optional("avatar_url", Some(raw), MAX_AVATAR_URL_LENGTH)?,
        None => user.avatar_url,
    };

    let profile = db::update_profile(
        &state.db,
        auth.user_id,
        display_name.as_deref(),
        bio.as_deref(),
        avatar_url.as_deref(),
    )
    .await?;

    tracing::info!("Profile updated for {}", auth.username);
    ok_with("Profile updated", profile)
}

/// Change password
///
/// # Errors
///
/// * `400 Bad Request` - current password wrong or new password too short
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<()> {
    let user = load_self(&state, auth.user_id).await?;

    let matches = verify(&request.current_password, &user.password_hash).map_err(|e| {
        tracing::error!("Failed to verify password: {:?}", e);
        BackendError::state("password verification failed")
    })?;
    if !matches {
        tracing::warn!("Wrong current password for {}", auth.username);
        return Err(BackendError::bad_request("Current password is incorrect"));
    }

    if !is_valid_password(&request.new_password) {
        return Err(BackendError::bad_request("Password must be at least 8 characters"));
    }

    let password_hash = hash(&request.new_password, state.config.bcrypt_cost).map_err(|e| {
        tracing::error!("Failed to hash password: {:?}", e);
        BackendError::state("password hashing failed")
    })?;
    update_password(&state.db, auth.user_id, &password_hash).await?;

    tracing::info!("Password changed for {}", auth.username);
    ok_with("Password changed", ())
}

/// `DELETE /api/users/me` - deactivate the account; its tokens stop working
pub async fn deactivate_account(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> ApiResult<()> {
    db::deactivate(&state.db, auth.user_id).await?;
    tracing::info!("Account deactivated: {}", auth.username);
    ok_with("Account deactivated", ())
}

/// `GET /api/users/{id}`
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<UserProfile> {
    let profile = db::get_profile(&state.db, user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;
    ok(profile)
}

/// `GET /api/users/search?q=al&page=1&limit=20`
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<UserSearchQuery>,
) -> ApiResult<Paginated<UserSummary>> {
    let term = query.q.trim();
    if term.is_empty() {
        return Err(BackendError::bad_request("Search query is required"));
    }
    let page = Page::new(query.page, query.limit);
    let (items, total) = db::search(&state.db, term, page).await?;
    ok(Paginated::new(items, page, total))
}

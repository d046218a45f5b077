/**
 * Login Handler
 *
 * POST /api/auth/login
 *
 * The identifier may be a username or an email. Unknown users and wrong
 * passwords get the same 401 so accounts cannot be enumerated. A successful
 * login stamps `last_login_at` and counts towards the daily streak.
 */

use axum::{extract::State, response::Json};
use bcrypt::verify;

use crate::backend::auth::handlers::types::{AuthResponse, LoginRequest};
use crate::backend::auth::sessions::create_token;
use crate::backend::auth::users::{find_by_login, touch_last_login};
use crate::backend::error::{ok, ApiResult, BackendError};
use crate::backend::gamification::{record_streak, rules::DAILY_STREAK};
use crate::backend::server::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Login handler
///
/// # Errors
///
/// * `401 Unauthorized` - unknown user, wrong password or deactivated account
/// * `403 Forbidden` - banned account
///
/// # Example Request
///
/// ```http
/// POST /api/auth/login HTTP/1.1
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "securepassword123"
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let identifier = request.username.trim();
    tracing::info!("Login request for: {}", identifier);

    let user = find_by_login(&state.db, identifier).await?.ok_or_else(|| {
        tracing::warn!("Login for unknown user: {}", identifier);
        BackendError::unauthorized(INVALID_CREDENTIALS)
    })?;

    let valid = verify(&request.password, &user.password_hash).map_err(|e| {
        tracing::error!("Failed to verify password: {:?}", e);
        BackendError::state("password verification failed")
    })?;

    if !valid {
        tracing::warn!("Wrong password for: {}", user.username);
        return Err(BackendError::unauthorized(INVALID_CREDENTIALS));
    }

    if user.is_banned {
        tracing::warn!("Banned user tried to log in: {}", user.username);
        return Err(BackendError::forbidden("Account is banned"));
    }

    if !user.is_active {
        tracing::warn!("Deactivated user tried to log in: {}", user.username);
        return Err(BackendError::unauthorized("Account is deactivated"));
    }

    touch_last_login(&state.db, user.id).await?;
    record_streak(&state, user.id, DAILY_STREAK).await?;

    let token = create_token(&state.config, &user).map_err(|e| {
        tracing::error!("Failed to create token: {:?}", e);
        BackendError::state("token creation failed")
    })?;

    tracing::info!("User logged in: {}", user.username);

    ok(AuthResponse {
        token,
        user: user.into(),
    })
}

/**
 * Signup Handler
 *
 * POST /api/auth/signup
 *
 * # Registration Process
 *
 * 1. Validate username, email and password
 * 2. Reject taken usernames and emails with 409
 * 3. Hash the password with the configured bcrypt cost
 * 4. Create the user and issue a JWT
 * 5. Queue the welcome email
 */

use axum::{extract::State, response::Json};
use bcrypt::hash;

use crate::backend::auth::handlers::types::{AuthResponse, SignupRequest};
use crate::backend::auth::sessions::create_token;
use crate::backend::auth::users::{create_user, get_user_by_email, get_user_by_username};
use crate::backend::error::{created, BackendError, CreatedResult};
use crate::backend::jobs::EmailJob;
use crate::backend::server::state::AppState;
use crate::shared::validation::{is_valid_email, is_valid_password, is_valid_username};

/// Sign up handler
///
/// # Returns
///
/// `201 Created` with the token and the new user
///
/// # Errors
///
/// * `400 Bad Request` - invalid username, email or password
/// * `409 Conflict` - username or email already registered
/// * `500 Internal Server Error` - hashing, storage or token failure
///
/// # Example Request
///
/// ```http
/// POST /api/auth/signup HTTP/1.1
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "securepassword123"
/// }
/// ```
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> CreatedResult<AuthResponse> {
    let username = request.username.trim();
    let email = request.email.trim().to_lowercase();
    tracing::info!("Signup request for username: {}, email: {}", username, email);

    if !is_valid_username(username) {
        tracing::warn!("Invalid username format: {}", username);
        return Err(BackendError::bad_request(
            "Username must be 3-30 chars, start with a letter, and contain only letters, numbers, and underscores",
        ));
    }

    if !is_valid_email(&email) {
        tracing::warn!("Invalid email format: {}", email);
        return Err(BackendError::bad_request("Invalid email format"));
    }

    if !is_valid_password(&request.password) {
        tracing::warn!("Password too short");
        return Err(BackendError::bad_request("Password must be at least 8 characters"));
    }

    if get_user_by_username(&state.db, username).await?.is_some() {
        tracing::warn!("Username already exists: {}", username);
        return Err(BackendError::conflict("Username already taken"));
    }

    if get_user_by_email(&state.db, &email).await?.is_some() {
        tracing::warn!("Email already exists: {}", email);
        return Err(BackendError::conflict("Email already registered"));
    }

    let password_hash = hash(&request.password, state.config.bcrypt_cost).map_err(|e| {
        tracing::error!("Failed to hash password: {:?}", e);
        BackendError::state("password hashing failed")
    })?;

    let user = create_user(&state.db, username, &email, &password_hash).await?;

    let token = create_token(&state.config, &user).map_err(|e| {
        tracing::error!("Failed to create token: {:?}", e);
        BackendError::state("token creation failed")
    })?;

    state.email.enqueue(EmailJob::Welcome {
        to: user.email.clone(),
        username: user.username.clone(),
    });

    tracing::info!("User created successfully: {} ({})", user.username, user.email);

    created(
        "Account created",
        AuthResponse {
            token,
            user: user.into(),
        },
    )
}

/**
 * Authentication Middleware
 *
 * Protects routes that require a signed-in user. The bearer token is
 * verified, the user row is loaded, and deactivated or banned accounts are
 * turned away before the handler runs. Handlers read the caller through the
 * `AuthUser` extractor.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::backend::auth::sessions::verify_token;
use crate::backend::auth::users::{get_user_by_id, has_role};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::users::Role;

/// Authenticated user data attached to the request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: Role) -> bool {
        has_role(&self.roles, role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Moderators and admins may remove other people's content
    pub fn is_moderator(&self) -> bool {
        self.has_role(Role::Moderator)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verify a token and load the account behind it
///
/// # Errors
///
/// * `401 Unauthorized` - invalid token, unknown or deactivated user
/// * `403 Forbidden` - banned user
pub async fn authenticate_token(
    app_state: &AppState,
    token: &str,
) -> Result<AuthenticatedUser, BackendError> {
    let claims = verify_token(&app_state.config.jwt_secret, token).map_err(|e| {
        tracing::warn!("Invalid token: {:?}", e);
        BackendError::unauthorized("Invalid or expired token")
    })?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| BackendError::unauthorized("Invalid or expired token"))?;

    let user = get_user_by_id(&app_state.db, user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Token for unknown user {}", user_id);
            BackendError::unauthorized("Account not found")
        })?;

    if !user.is_active {
        tracing::warn!("Deactivated user {} tried to authenticate", user.username);
        return Err(BackendError::unauthorized("Account is deactivated"));
    }
    if user.is_banned {
        tracing::warn!("Banned user {} tried to authenticate", user.username);
        return Err(BackendError::forbidden("Account is banned"));
    }

    Ok(AuthenticatedUser {
        user_id: user.id,
        email: user.email,
        username: user.username,
        roles: user.roles,
    })
}

/// Authentication middleware
///
/// This middleware:
/// 1. Extracts the JWT from the Authorization header
/// 2. Verifies it and loads the user
/// 3. Attaches `AuthenticatedUser` to the request extensions
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        tracing::warn!("Missing or malformed Authorization header");
        BackendError::unauthorized("Authentication required")
    })?;

    let user = authenticate_token(&app_state, token).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Only admins pass; must run after `auth_middleware`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, BackendError> {
    require_role(&request, Role::Admin)?;
    Ok(next.run(request).await)
}

/// Moderators and admins pass; must run after `auth_middleware`
pub async fn require_moderator(request: Request, next: Next) -> Result<Response, BackendError> {
    require_role(&request, Role::Moderator)?;
    Ok(next.run(request).await)
}

fn require_role(request: &Request, role: Role) -> Result<(), BackendError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| BackendError::unauthorized("Authentication required"))?;
    if !user.has_role(role) {
        tracing::warn!("{} lacks the {} role", user.username, role.as_str());
        return Err(BackendError::forbidden(format!("{} role required", role.as_str())));
    }
    Ok(())
}

/// Axum extractor for the authenticated user
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                BackendError::unauthorized("Authentication required")
            })
    }
}

//! Admin and moderation routes. The router wraps these in `auth_middleware`
//! followed by the matching role gate.

use axum::routing::{get, post, put};
use axum::Router;

use crate::backend::admin::handlers::*;
use crate::backend::server::state::AppState;

/// Routes for `Role::Admin`
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/roles", put(set_roles))
        .route("/api/admin/users/{id}/ban", post(ban_user))
        .route("/api/admin/users/{id}/unban", post(unban_user))
        .route("/api/admin/badges", post(create_badge))
        .route("/api/admin/broadcast", post(broadcast_announcement))
        .route("/api/admin/logs", get(action_logs))
        .route("/api/admin/stats", get(stats))
}

/// Routes for `Role::Moderator` (admins pass too)
pub fn moderation_routes() -> Router<AppState> {
    Router::new()
        .route("/api/moderation/posts/{id}/remove", post(remove_post))
        .route("/api/moderation/comments/{id}/remove", post(remove_comment))
}

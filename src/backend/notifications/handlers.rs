//! Notification HTTP Handlers
//!
//! Other users' notifications answer 404, never 403.

use axum::extract::{Path, Query, State};
use serde_json::json;
use uuid::Uuid;

use super::db;
use crate::backend::error::{ok, ok_with, ApiResult, BackendError};
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::api::{Page, Paginated};
use crate::shared::notifications::{Notification, NotificationQuery, UnreadCount};

/// List notifications
///
/// # Example Request
///
/// ```http
/// GET /api/notifications?unread_only=true&page=1&limit=20 HTTP/1.1
/// Authorization: Bearer <token>
/// ```
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Paginated<Notification>> {
    let page = Page::new(query.page, query.limit);
    let (items, total) = db::list_notifications(&state.db, user.user_id, query.unread_only, page).await?;
    ok(Paginated::new(items, page, total))
}

pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<UnreadCount> {
    let unread = db::unread_count(&state.db, user.user_id).await?;
    ok(UnreadCount { unread })
}

pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<Notification> {
    let notification = db::mark_read(&state.db, user.user_id, notification_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Notification not found"))?;
    ok(notification)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<serde_json::Value> {
    let updated = db::mark_all_read(&state.db, user.user_id).await?;
    ok_with("All notifications marked as read", json!({ "updated": updated }))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<()> {
    if !db::delete_notification(&state.db, user.user_id, notification_id).await? {
        return Err(BackendError::not_found("Notification not found"));
    }
    ok_with("Notification deleted", ())
}

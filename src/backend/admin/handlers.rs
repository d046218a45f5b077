//! Admin and Moderation HTTP Handlers
//!
//! Mounted behind `require_admin` or `require_moderator`, so the handlers
//! only check rules about the target, not the caller's role.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use super::db;
use crate::backend::blog::db as blog_db;
use crate::backend::error::{created, ok, ok_with, ApiResult, BackendError, CreatedResult};
use crate::backend::gamification::db as gamification_db;
use crate::backend::gamification::rules::thresholds_valid;
use crate::backend::middleware::AuthUser;
use crate::backend::notifications::notify;
use crate::backend::server::state::AppState;
use crate::shared::admin::{
    AdminActionLog, AdminStats, AdminUserQuery, AdminUserView, BanRequest, BroadcastRequest,
    BroadcastResult, ModerationRequest, SetRolesRequest,
};
use crate::shared::api::{Page, PageQuery, Paginated};
use crate::shared::gamification::{Badge, CreateBadgeRequest};
use crate::shared::notifications::NotificationKind;
use crate::shared::users::Role;
use crate::shared::validation::{clean_optional, clean_required};

pub const MAX_REASON_LENGTH: usize = 500;
pub const MAX_ANNOUNCEMENT_TITLE_LENGTH: usize = 200;
pub const MAX_ANNOUNCEMENT_BODY_LENGTH: usize = 2000;

async fn load_user(state: &AppState, user_id: Uuid) -> Result<AdminUserView, BackendError> {
    db::get_user(&state.db, user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))
}

/// Validate a role list; `user` is always kept
fn normalize_roles(requested: &[String]) -> Result<Vec<String>, BackendError> {
    let mut roles = vec![Role::User.as_str().to_string()];
    for raw in requested {
        let role = Role::from_str(raw.trim())
            .ok_or_else(|| BackendError::bad_request(format!("Unknown role: {}", raw)))?;
        let name = role.as_str().to_string();
        if !roles.contains(&name) {
            roles.push(name);
        }
    }
    Ok(roles)
}

/// `GET /api/admin/users?search&page&limit`
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<AdminUserQuery>,
) -> ApiResult<Paginated<AdminUserView>> {
    let page = Page::new(query.page, query.limit);
    let (users, total) = db::list_users(&state.db, query.search.as_deref(), page).await?;
    ok(Paginated::new(users, page, total))
}

/// Replace a user's roles
///
/// # Errors
///
/// * `400 Bad Request` - unknown role, or an admin dropping their own admin role
/// * `404 Not Found` - no such user
pub async fn set_roles(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<SetRolesRequest>,
) -> ApiResult<AdminUserView> {
    let roles = normalize_roles(&request.roles)?;
    let target = load_user(&state, user_id).await?;
    if target.id == admin.user_id && !roles.iter().any(|r| r == Role::Admin.as_str()) {
        return Err(BackendError::bad_request("You cannot remove your own admin role"));
    }

    let updated = db::set_roles(&state.db, target.id, &roles).await?;
    db::log_action(
        &state.db,
        admin.user_id,
        "set_roles",
        "user",
        Some(target.id),
        Some(&roles.join(",")),
    )
    .await?;

    tracing::info!("{} set roles of {} to {:?}", admin.username, target.username, roles);
    ok_with("Roles updated", updated)
}

/// `POST /api/admin/users/{id}/ban`
pub async fn ban_user(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<BanRequest>,
) -> ApiResult<AdminUserView> {
    if user_id == admin.user_id {
        return Err(BackendError::bad_request("You cannot ban yourself"));
    }
    let target = load_user(&state, user_id).await?;
    let reason = clean_optional("reason", request.reason.as_deref(), MAX_REASON_LENGTH)?;

    let updated = db::set_ban(&state.db, target.id, true, reason.as_deref()).await?;
    db::log_action(&state.db, admin.user_id, "ban", "user", Some(target.id), reason.as_deref()).await?;

    tracing::info!("{} banned {}", admin.username, target.username);
    ok_with("User banned", updated)
}

/// `POST /api/admin/users/{id}/unban`
pub async fn unban_user(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<AdminUserView> {
    let target = load_user(&state, user_id).await?;
    let updated = db::set_ban(&state.db, target.id, false, None).await?;
    db::log_action(&state.db, admin.user_id, "unban", "user", Some(target.id), None).await?;

    tracing::info!("{} unbanned {}", admin.username, target.username);
    ok_with("User unbanned", updated)
}

/// Define a new badge
///
/// # Errors
///
/// * `400 Bad Request` - empty key or name, thresholds empty or not strictly
///   increasing positive values, negative points
/// * `409 Conflict` - key already exists
pub async fn create_badge(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Json(mut request): Json<CreateBadgeRequest>,
) -> CreatedResult<Badge> {
    request.key = clean_required("key", &request.key, 50)?.to_lowercase();
    request.name = clean_required("name", &request.name, 100)?;
    request.description = clean_optional("description", request.description.as_deref(), 500)?;
    if !thresholds_valid(&request.thresholds) {
        return Err(BackendError::bad_request(
            "thresholds must be non-empty, positive and strictly increasing",
        ));
    }
    if request.points_per_level < 0 {
        return Err(BackendError::bad_request("points_per_level must not be negative"));
    }

    let badge = gamification_db::create_badge(&state.db, &request).await?;
    db::log_action(&state.db, admin.user_id, "create_badge", "badge", Some(badge.id), None).await?;

    tracing::info!("{} created badge {}", admin.username, badge.key);
    created("Badge created", badge)
}

/// Send an announcement notification to every active user
pub async fn broadcast_announcement(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Json(request): Json<BroadcastRequest>,
) -> ApiResult<BroadcastResult> {
    let title = clean_required("title", &request.title, MAX_ANNOUNCEMENT_TITLE_LENGTH)?;
    let body = clean_optional("body", request.body.as_deref(), MAX_ANNOUNCEMENT_BODY_LENGTH)?;

    let recipients = db::active_user_ids(&state.db).await?;
    for &user_id in &recipients {
        notify(
            &state,
            user_id,
            NotificationKind::Announcement,
            &title,
            body.as_deref(),
            json!({ "from": admin.username }),
        )
        .await?;
    }
    db::log_action(&state.db, admin.user_id, "broadcast", "notification", None, Some(&title)).await?;

    tracing::info!("{} broadcast an announcement to {} users", admin.username, recipients.len());
    ok_with(
        "Announcement sent",
        BroadcastResult {
            recipients: recipients.len() as i64,
        },
    )
}

/// `GET /api/admin/logs?page&limit`
pub async fn action_logs(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paginated<AdminActionLog>> {
    let page = query.page();
    let (logs, total) = db::list_actions(&state.db, page).await?;
    ok(Paginated::new(logs, page, total))
}

/// `GET /api/admin/stats`
pub async fn stats(State(state): State<AppState>) -> ApiResult<AdminStats> {
    ok(db::stats(&state.db).await?)
}

/// `POST /api/moderation/posts/{id}/remove` - moderator or admin
pub async fn remove_post(
    State(state): State<AppState>,
    AuthUser(moderator): AuthUser,
    Path(post_id): Path<Uuid>,
    Json(request): Json<ModerationRequest>,
) -> ApiResult<()> {
    let post = blog_db::get_post(&state.db, post_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Post not found"))?;
    let reason = clean_optional("reason", request.reason.as_deref(), MAX_REASON_LENGTH)?;

    blog_db::soft_delete_post(&state.db, post.id).await?;
    db::log_action(&state.db, moderator.user_id, "remove_post", "post", Some(post.id), reason.as_deref()).await?;

    tracing::info!("{} removed post {}", moderator.username, post.id);
    ok_with("Post removed", ())
}

/// `POST /api/moderation/comments/{id}/remove` - moderator or admin
pub async fn remove_comment(
    State(state): State<AppState>,
    AuthUser(moderator): AuthUser,
    Path(comment_id): Path<Uuid>,
    Json(request): Json<ModerationRequest>,
) -> ApiResult<()> {
    let comment = blog_db::get_comment(&state.db, comment_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Comment not found"))?;
    let reason = clean_optional("reason", request.reason.as_deref(), MAX_REASON_LENGTH)?;

    blog_db::soft_delete_comment(&state.db, comment.id).await?;
    db::log_action(
        &state.db,
        moderator.user_id,
        "remove_comment",
        "comment",
        Some(comment.id),
        reason.as_deref(),
    )
    .await?;

    tracing::info!("{} removed comment {}", moderator.username, comment.id);
    ok_with("Comment removed", ())
}

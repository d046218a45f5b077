//! Group HTTP Handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use super::db;
use crate::backend::auth::users::get_user_by_id;
use crate::backend::chat::db as chat_db;
use crate::backend::error::{created, ok, ok_with, ApiResult, BackendError, CreatedResult};
use crate::backend::middleware::{AuthUser, AuthenticatedUser};
use crate::backend::notifications::notify;
use crate::backend::server::state::AppState;
use crate::backend::subscription::limits::ensure_can_create_group;
use crate::shared::api::{Page, Paginated};
use crate::shared::chat::ChatKind;
use crate::shared::groups::{
    AddMemberRequest, CreateGroupRequest, Group, GroupListQuery, GroupMember, GroupRole, GroupView,
    UpdateGroupRequest,
};
use crate::shared::notifications::NotificationKind;
use crate::shared::validation::{clean_optional, clean_required};

pub const MAX_GROUP_NAME_LENGTH: usize = 100;
pub const MAX_GROUP_DESCRIPTION_LENGTH: usize = 1000;

async fn view(state: &AppState, group: Group) -> Result<GroupView, BackendError> {
    let member_count = db::member_count(&state.db, group.id).await?;
    Ok(GroupView { group, member_count })
}

async fn load_group(state: &AppState, group_id: Uuid) -> Result<Group, BackendError> {
    db::get_group(&state.db, group_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Group not found"))
}

/// Load a group the caller may see; private groups look missing to outsiders
async fn visible_group(
    state: &AppState,
    group_id: Uuid,
    user: &AuthenticatedUser,
) -> Result<(Group, Option<GroupRole>), BackendError> {
    let group = load_group(state, group_id).await?;
    let role = db::member_role(&state.db, group_id, user.user_id).await?;
    if group.is_private && role.is_none() && !user.is_admin() {
        return Err(BackendError::not_found("Group not found"));
    }
    Ok((group, role))
}

async fn managed_group(
    state: &AppState,
    group_id: Uuid,
    user: &AuthenticatedUser,
) -> Result<Group, BackendError> {
    let (group, role) = visible_group(state, group_id, user).await?;
    if !role.is_some_and(|r| r.can_manage()) {
        return Err(BackendError::forbidden("Only group admins can do that"));
    }
    Ok(group)
}

/// Create a group together with its chat
///
/// # Errors
///
/// * `400 Bad Request` - empty or overlong name/description
/// * `403 Forbidden` - free plan owned-group limit reached
///
/// # Example Request
///
/// ```http
/// POST /api/groups HTTP/1.1
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "name": "Morning Runners", "description": "5k before work", "is_private": false }
/// ```
pub async fn create_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateGroupRequest>,
) -> CreatedResult<GroupView> {
    let name = clean_required("name", &request.name, MAX_GROUP_NAME_LENGTH)?;
    let description = clean_optional(
        "description",
        request.description.as_deref(),
        MAX_GROUP_DESCRIPTION_LENGTH,
    )?;
    ensure_can_create_group(&state.db, user.user_id).await?;

    let group_id = Uuid::new_v4();
    let chat = chat_db::create_chat(
        &state.db,
        ChatKind::Group,
        Some(&name),
        Some(group_id),
        user.user_id,
        None,
    )
    .await?;
    let group = db::insert_group(
        &state.db,
        group_id,
        &name,
        description.as_deref(),
        user.user_id,
        request.is_private,
        chat.id,
    )
    .await?;
    db::add_member(&state.db, group.id, user.user_id, GroupRole::Owner).await?;
    chat_db::add_participant(&state.db, chat.id, user.user_id).await?;

    tracing::info!("Group {} created by {}", group.id, user.username);
    created("Group created", view(&state, group).await?)
}

/// `GET /api/groups?search&page&limit` - public groups
pub async fn list_groups(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(query): Query<GroupListQuery>,
) -> ApiResult<Paginated<GroupView>> {
    let page = Page::new(query.page, query.limit);
    let (groups, total) = db::list_public(&state.db, query.search.as_deref(), page).await?;

    let mut items = Vec::with_capacity(groups.len());
    for group in groups {
        items.push(view(&state, group).await?);
    }
    ok(Paginated::new(items, page, total))
}

/// `GET /api/groups/mine`
pub async fn my_groups(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Vec<GroupView>> {
    let groups = db::groups_for_member(&state.db, user.user_id).await?;
    let mut items = Vec::with_capacity(groups.len());
    for group in groups {
        items.push(view(&state, group).await?);
    }
    ok(items)
}

/// `GET /api/groups/{id}`
pub async fn get_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
) -> ApiResult<GroupView> {
    let (group, _) = visible_group(&state, group_id, &user).await?;
    ok(view(&state, group).await?)
}

/// `PATCH /api/groups/{id}` - owner or group admin
pub async fn update_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
    Json(request): Json<UpdateGroupRequest>,
) -> ApiResult<GroupView> {
    let group = managed_group(&state, group_id, &user).await?;

    let name = match request.name.as_deref() {
        Some(raw) => clean_required("name", raw, MAX_GROUP_NAME_LENGTH)?,
        None => group.name.clone(),
    };
    let description = match request.description.as_deref() {
        Some(raw) => clean_optional("description", Some(raw), MAX_GROUP_DESCRIPTION_LENGTH)?,
        None => group.description.clone(),
    };
    let is_private = request.is_private.unwrap_or(group.is_private);

    let updated = db::update_group(&state.db, group.id, &name, description.as_deref(), is_private).await?;
    if updated.name != group.name {
        chat_db::rename_chat(&state.db, updated.chat_id, &updated.name).await?;
    }

    tracing::info!("Group {} updated by {}", group.id, user.username);
    ok_with("Group updated", view(&state, updated).await?)
}

/// `DELETE /api/groups/{id}` - owner or site admin; soft delete
pub async fn delete_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
) -> ApiResult<()> {
    let group = load_group(&state, group_id).await?;
    if group.owner_id != user.user_id && !user.is_admin() {
        return Err(BackendError::forbidden("Only the owner can delete this group"));
    }

    db::soft_delete(&state.db, group.id).await?;
    tracing::info!("Group {} deleted by {}", group.id, user.username);
    ok_with("Group deleted", ())
}

/// Join a public group
///
/// # Errors
///
/// * `403 Forbidden` - the group is private
/// * `409 Conflict` - already a member
pub async fn join_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
) -> ApiResult<GroupView> {
    let group = load_group(&state, group_id).await?;
    if db::member_role(&state.db, group.id, user.user_id).await?.is_some() {
        return Err(BackendError::conflict("Already a member of this group"));
    }
    if group.is_private {
        return Err(BackendError::forbidden("This group is private"));
    }

    db::add_member(&state.db, group.id, user.user_id, GroupRole::Member).await?;
    chat_db::add_participant(&state.db, group.chat_id, user.user_id).await?;

    notify(
        &state,
        group.owner_id,
        NotificationKind::GroupJoined,
        &format!("{} joined {}", user.username, group.name),
        None,
        json!({ "group_id": group.id, "user_id": user.user_id }),
    )
    .await?;

    tracing::info!("{} joined group {}", user.username, group.id);
    ok_with("Joined group", view(&state, group).await?)
}

/// `POST /api/groups/{id}/leave` - the owner cannot leave
pub async fn leave_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
) -> ApiResult<()> {
    let group = load_group(&state, group_id).await?;
    if group.owner_id == user.user_id {
        return Err(BackendError::bad_request(
            "The owner cannot leave the group; delete it instead",
        ));
    }
    if !db::remove_member(&state.db, group.id, user.user_id).await? {
        return Err(BackendError::not_found("Not a member of this group"));
    }
    chat_db::remove_participant(&state.db, group.chat_id, user.user_id).await?;

    tracing::info!("{} left group {}", user.username, group.id);
    ok_with("Left group", ())
}

/// `GET /api/groups/{id}/members`
pub async fn list_members(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Vec<GroupMember>> {
    let (group, _) = visible_group(&state, group_id, &user).await?;
    ok(db::members(&state.db, group.id).await?)
}

/// `POST /api/groups/{id}/members` - group admin adds a user
pub async fn add_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<Uuid>,
    Json(request): Json<AddMemberRequest>,
) -> CreatedResult<Vec<GroupMember>> {
    let group = managed_group(&state, group_id, &user).await?;

    let target = get_user_by_id(&state.db, request.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| BackendError::not_found("User not found"))?;
    if db::member_role(&state.db, group.id, target.id).await?.is_some() {
        return Err(BackendError::conflict("User is already a member"));
    }

    let role = if request.make_admin {
        GroupRole::Admin
    } else {
        GroupRole::Member
    };
    db::add_member(&state.db, group.id, target.id, role).await?;
    chat_db::add_participant(&state.db, group.chat_id, target.id).await?;

    tracing::info!("{} added {} to group {}", user.username, target.username, group.id);
    created("Member added", db::members(&state.db, group.id).await?)
}

/// `DELETE /api/groups/{id}/members/{user_id}` - the owner cannot be removed
pub async fn remove_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((group_id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    let group = managed_group(&state, group_id, &user).await?;
    if member_id == group.owner_id {
        return Err(BackendError::bad_request("The group owner cannot be removed"));
    }
    if !db::remove_member(&state.db, group.id, member_id).await? {
        return Err(BackendError::not_found("Not a member of this group"));
    }
    chat_db::remove_participant(&state.db, group.chat_id, member_id).await?;

    tracing::info!("{} removed {} from group {}", user.username, member_id, group.id);
    ok_with("Member removed", ())
}

//! Goal HTTP Handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::db;
use crate::backend::error::{created, ok, ok_with, ApiResult, BackendError, CreatedResult};
use crate::backend::gamification::rules::{GOAL_POINTS, MILESTONE_POINTS, TASK_POINTS};
use crate::backend::gamification::{record_activity, ActivityRecord};
use crate::backend::middleware::{AuthUser, AuthenticatedUser};
use crate::backend::server::state::AppState;
use crate::backend::subscription::limits::ensure_can_add_goal;
use crate::shared::api::{Page, Paginated};
use crate::shared::goals::{
    compute_progress, CreateGoalRequest, CreateMilestoneRequest, CreateTaskRequest, Goal,
    GoalDetail, GoalListQuery, GoalStatus, Milestone, Task, UpdateGoalRequest, UpdateItemRequest,
};
use crate::shared::validation::{clean_optional, clean_required};

pub const MAX_GOAL_TITLE_LENGTH: usize = 200;
pub const MAX_GOAL_DESCRIPTION_LENGTH: usize = 2000;
pub const MAX_CATEGORY_LENGTH: usize = 50;
pub const MAX_ITEM_TITLE_LENGTH: usize = 200;

async fn load_goal(state: &AppState, goal_id: Uuid) -> Result<Goal, BackendError> {
    db::get_goal(&state.db, goal_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Goal not found"))
}

async fn own_goal(state: &AppState, goal_id: Uuid, user: &AuthenticatedUser) -> Result<Goal, BackendError> {
    let goal = load_goal(state, goal_id).await?;
    if goal.owner_id != user.user_id {
        if goal.is_public {
            return Err(BackendError::forbidden("Only the owner can change this goal"));
        }
        return Err(BackendError::not_found("Goal not found"));
    }
    Ok(goal)
}

/// Recompute progress from the children unless the goal is already completed
async fn refresh_progress(state: &AppState, goal: &Goal) -> Result<(), BackendError> {
    if goal.status == GoalStatus::Completed {
        return Ok(());
    }
    let (completed, total) = db::item_counts(&state.db, goal.id).await?;
    db::set_progress(&state.db, goal.id, compute_progress(completed, total)).await?;
    Ok(())
}

async fn detail(state: &AppState, goal: Goal) -> Result<GoalDetail, BackendError> {
    let milestones = db::list_milestones(&state.db, goal.id).await?;
    let tasks = db::list_tasks(&state.db, goal.id).await?;
    Ok(GoalDetail {
        goal,
        milestones,
        tasks,
    })
}

/// `GET /api/goals?status&page&limit` - the caller's goals
pub async fn list_goals(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<GoalListQuery>,
) -> ApiResult<Paginated<Goal>> {
    let page = Page::new(query.page, query.limit);
    let (goals, total) = db::list_for_owner(&state.db, user.user_id, query.status, false, page).await?;
    ok(Paginated::new(goals, page, total))
}

/// `GET /api/users/{id}/goals` - another user's public goals
pub async fn list_user_goals(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(owner_id): Path<Uuid>,
    Query(query): Query<GoalListQuery>,
) -> ApiResult<Paginated<Goal>> {
    let page = Page::new(query.page, query.limit);
    let public_only = owner_id != user.user_id;
    let (goals, total) = db::list_for_owner(&state.db, owner_id, query.status, public_only, page).await?;
    ok(Paginated::new(goals, page, total))
}

/// Create a goal
///
/// # Errors
///
/// * `400 Bad Request` - invalid title, description or category
/// * `403 Forbidden` - free plan active-goal limit reached
pub async fn create_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateGoalRequest>,
) -> CreatedResult<Goal> {
    let title = clean_required("title", &request.title, MAX_GOAL_TITLE_LENGTH)?;
    let description = clean_optional(
        "description",
        request.description.as_deref(),
        MAX_GOAL_DESCRIPTION_LENGTH,
    )?;
    let category = clean_optional("category", request.category.as_deref(), MAX_CATEGORY_LENGTH)?;
    ensure_can_add_goal(&state.db, user.user_id).await?;

    let goal = db::insert_goal(
        &state.db,
        user.user_id,
        &title,
        description.as_deref(),
        category.as_deref(),
        request.target_date,
        request.is_public,
    )
    .await?;

    tracing::info!("Goal {} created by {}", goal.id, user.username);
    created("Goal created", goal)
}

/// `GET /api/goals/{id}` - owner, or anyone for public goals
pub async fn get_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(goal_id): Path<Uuid>,
) -> ApiResult<GoalDetail> {
    let goal = load_goal(&state, goal_id).await?;
    if goal.owner_id != user.user_id && !goal.is_public {
        return Err(BackendError::not_found("Goal not found"));
    }
    ok(detail(&state, goal).await?)
}

/// Update a goal
///
/// `status` may move between `active` and `abandoned`; completed goals keep
/// their status.
pub async fn update_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(goal_id): Path<Uuid>,
    Json(request): Json<UpdateGoalRequest>,
) -> ApiResult<Goal> {
    let goal = own_goal(&state, goal_id, &user).await?;

    let status = match request.status {
        None => goal.status,
        Some(status) if status == goal.status => status,
        Some(GoalStatus::Completed) => {
            return Err(BackendError::bad_request("Use the complete endpoint to finish a goal"))
        }
        Some(_) if goal.status == GoalStatus::Completed => {
            return Err(BackendError::conflict("Completed goals cannot change status"))
        }
        Some(GoalStatus::Active) => {
            ensure_can_add_goal(&state.db, user.user_id).await?;
            GoalStatus::Active
        }
        Some(status) => status,
    };

    let title = match request.title.as_deref() {
        Some(raw) => clean_required("title", raw, MAX_GOAL_TITLE_LENGTH)?,
        None => goal.title.clone(),
    };
    let description = match request.description.as_deref() {
        Some(raw) => clean_optional("description", Some(raw), MAX_GOAL_DESCRIPTION_LENGTH)?,
        None => goal.description.clone(),
    };
    let category = match request.category.as_deref() {
        Some(raw) => clean_optional("category", Some(raw), MAX_CATEGORY_LENGTH)?,
        None => goal.category.clone(),
    };

    let updated = db::update_goal(
        &state.db,
        goal.id,
        &title,
        description.as_deref(),
        category.as_deref(),
        request.target_date.or(goal.target_date),
        request.is_public.unwrap_or(goal.is_public),
        status,
    )
    .await?;
    ok_with("Goal updated", updated)
}

/// `DELETE /api/goals/{id}` - removes milestones and tasks too
pub async fn delete_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(goal_id): Path<Uuid>,
) -> ApiResult<()> {
    let goal = own_goal(&state, goal_id, &user).await?;
    db::delete_goal(&state.db, goal.id).await?;
    tracing::info!("Goal {} deleted by {}", goal.id, user.username);
    ok_with("Goal deleted", ())
}

/// Complete an active goal
///
/// # Errors
///
/// * `409 Conflict` - the goal is already completed
/// * `400 Bad Request` - the goal was abandoned
pub async fn complete_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(goal_id): Path<Uuid>,
) -> ApiResult<Goal> {
    let goal = own_goal(&state, goal_id, &user).await?;
    match goal.status {
        GoalStatus::Completed => return Err(BackendError::conflict("Goal is already completed")),
        GoalStatus::Abandoned => {
            return Err(BackendError::bad_request("Reactivate the goal before completing it"))
        }
        GoalStatus::Active => {}
    }

    let completed = db::complete_goal(&state.db, goal.id).await?;
    record_activity(
        &state,
        ActivityRecord::new(user.user_id, "goal_completed")
            .entity("goal", goal.id)
            .points(GOAL_POINTS)
            .metadata(json!({ "title": goal.title })),
    )
    .await?;

    tracing::info!("Goal {} completed by {}", goal.id, user.username);
    ok_with("Goal completed", completed)
}

/// `POST /api/goals/{id}/milestones`
pub async fn create_milestone(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(goal_id): Path<Uuid>,
    Json(request): Json<CreateMilestoneRequest>,
) -> CreatedResult<Milestone> {
    let goal = own_goal(&state, goal_id, &user).await?;
    let title = clean_required("title", &request.title, MAX_ITEM_TITLE_LENGTH)?;

    let milestone = db::insert_milestone(&state.db, goal.id, &title, request.due_date).await?;
    refresh_progress(&state, &goal).await?;
    created("Milestone added", milestone)
}

async fn goal_milestone(
    state: &AppState,
    goal: &Goal,
    milestone_id: Uuid,
) -> Result<Milestone, BackendError> {
    db::get_milestone(&state.db, milestone_id)
        .await?
        .filter(|m| m.goal_id == goal.id)
        .ok_or_else(|| BackendError::not_found("Milestone not found"))
}

/// Update a milestone; completing it for the first time awards points
pub async fn update_milestone(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((goal_id, milestone_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateItemRequest>,
) -> ApiResult<Milestone> {
    let goal = own_goal(&state, goal_id, &user).await?;
    let milestone = goal_milestone(&state, &goal, milestone_id).await?;

    let title = match request.title.as_deref() {
        Some(raw) => clean_required("title", raw, MAX_ITEM_TITLE_LENGTH)?,
        None => milestone.title.clone(),
    };
    let is_completed = request.is_completed.unwrap_or(milestone.is_completed);
    let first_completion = is_completed && milestone.completed_at.is_none();
    let completed_at = if first_completion {
        Some(Utc::now())
    } else {
        milestone.completed_at
    };

    let updated = db::update_milestone(
        &state.db,
        milestone.id,
        &title,
        request.due_date.or(milestone.due_date),
        is_completed,
        completed_at,
    )
    .await?;
    refresh_progress(&state, &goal).await?;

    if first_completion {
        record_activity(
            &state,
            ActivityRecord::new(user.user_id, "milestone_completed")
                .entity("milestone", milestone.id)
                .points(MILESTONE_POINTS)
                .metadata(json!({ "goal_id": goal.id })),
        )
        .await?;
    }

    ok_with("Milestone updated", updated)
}

/// `DELETE /api/goals/{id}/milestones/{milestone_id}`
pub async fn delete_milestone(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((goal_id, milestone_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    let goal = own_goal(&state, goal_id, &user).await?;
    let milestone = goal_milestone(&state, &goal, milestone_id).await?;
    db::delete_milestone(&state.db, milestone.id).await?;
    refresh_progress(&state, &goal).await?;
    ok_with("Milestone deleted", ())
}

/// `POST /api/goals/{id}/tasks`
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(goal_id): Path<Uuid>,
    Json(request): Json<CreateTaskRequest>,
) -> CreatedResult<Task> {
    let goal = own_goal(&state, goal_id, &user).await?;
    let title = clean_required("title", &request.title, MAX_ITEM_TITLE_LENGTH)?;
    if let Some(milestone_id) = request.milestone_id {
        goal_milestone(&state, &goal, milestone_id).await?;
    }

    let task = db::insert_task(
        &state.db,
        goal.id,
        user.user_id,
        request.milestone_id,
        &title,
        request.due_date,
    )
    .await?;
    refresh_progress(&state, &goal).await?;
    created("Task added", task)
}

async fn goal_task(state: &AppState, goal: &Goal, task_id: Uuid) -> Result<Task, BackendError> {
    db::get_task(&state.db, task_id)
        .await?
        .filter(|t| t.goal_id == goal.id)
        .ok_or_else(|| BackendError::not_found("Task not found"))
}

/// Update a task; completing it for the first time awards points
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((goal_id, task_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateItemRequest>,
) -> ApiResult<Task> {
    let goal = own_goal(&state, goal_id, &user).await?;
    let task = goal_task(&state, &goal, task_id).await?;

    let title = match request.title.as_deref() {
        Some(raw) => clean_required("title", raw, MAX_ITEM_TITLE_LENGTH)?,
        None => task.title.clone(),
    };
    let is_completed = request.is_completed.unwrap_or(task.is_completed);
    let first_completion = is_completed && task.completed_at.is_none();
    let completed_at = if first_completion {
        Some(Utc::now())
    } else {
        task.completed_at
    };

    let updated = db::update_task(
        &state.db,
        task.id,
        &title,
        request.due_date.or(task.due_date),
        is_completed,
        completed_at,
    )
    .await?;
    refresh_progress(&state, &goal).await?;

    if first_completion {
        record_activity(
            &state,
            ActivityRecord::new(user.user_id, "task_completed")
                .entity("task", task.id)
                .points(TASK_POINTS)
                .metadata(json!({ "goal_id": goal.id })),
        )
        .await?;
    }

    ok_with("Task updated", updated)
}

/// `DELETE /api/goals/{id}/tasks/{task_id}`
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((goal_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    let goal = own_goal(&state, goal_id, &user).await?;
    let task = goal_task(&state, &goal, task_id).await?;
    db::delete_task(&state.db, task.id).await?;
    refresh_progress(&state, &goal).await?;
    ok_with("Task deleted", ())
}

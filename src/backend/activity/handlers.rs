//! Activity HTTP Handlers

use axum::extract::{Query, State};

use super::db;
use crate::backend::error::{ok, ApiResult};
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::activity::ActivityEntry;
use crate::shared::api::{PageQuery, Paginated};

/// `GET /api/activity/me`
pub async fn my_activity(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paginated<ActivityEntry>> {
    let page = query.page();
    let (items, total) = db::list_for_user(&state.db, user.user_id, page).await?;
    ok(Paginated::new(items, page, total))
}

/// `GET /api/activity/feed` - what friends have been up to
pub async fn friends_feed(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paginated<ActivityEntry>> {
    let page = query.page();
    let (items, total) = db::friends_feed(&state.db, user.user_id, page).await?;
    ok(Paginated::new(items, page, total))
}

//! Subscription HTTP Handlers

use axum::extract::State;

use super::{db, limits};
use crate::backend::error::{ok, ok_with, ApiResult, BackendError};
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::billing::{plan_catalog, PlanInfo, Subscription, SubscriptionOverview, UsageStats};

/// `GET /api/subscriptions/plans`
pub async fn list_plans() -> ApiResult<Vec<PlanInfo>> {
    ok(plan_catalog())
}

/// `GET /api/subscriptions/me`
pub async fn my_subscription(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<SubscriptionOverview> {
    let subscription = db::get_by_user(&state.db, user.user_id).await?;
    let plan = subscription
        .as_ref()
        .map(|s| s.effective_plan())
        .unwrap_or_default();
    ok(SubscriptionOverview { plan, subscription })
}

/// Usage against the plan's limits
///
/// # Example Response
///
/// ```json
/// {
///   "success": true,
///   "message": null,
///   "data": {
///     "plan": "free",
///     "active_goals": 2,
///     "owned_groups": 3,
///     "max_active_goals": 5,
///     "max_owned_groups": 3,
///     "limit_exceeded": true
///   }
/// }
/// ```
pub async fn get_usage_stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<UsageStats> {
    ok(limits::usage(&state.db, user.user_id).await?)
}

/// Mark the subscription to end with the current period
///
/// Only the local record changes; the provider confirms the end of the
/// subscription later through the webhook.
///
/// # Errors
///
/// * `404 Not Found` - no active subscription
pub async fn cancel_subscription(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Subscription> {
    let subscription = db::get_by_user(&state.db, user.user_id)
        .await?
        .filter(|s| s.status.grants_access())
        .ok_or_else(|| BackendError::not_found("No active subscription"))?;

    let subscription = db::set_cancel_at_period_end(&state.db, subscription.id).await?;
    tracing::info!("{} scheduled cancellation of subscription {}", user.username, subscription.id);
    ok_with("Subscription will end with the current billing period", subscription)
}

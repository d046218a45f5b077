/**
 * Public Routes
 *
 * - `GET /api/health`
 * - `POST /api/auth/signup`, `POST /api/auth/login`
 * - `GET /api/subscriptions/plans`, `GET /api/badges`
 * - `POST /api/webhooks/billing` - authenticated by signature, not token
 * - `GET /ws` - authenticated by `?token=` or bearer header before upgrade
 */

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

use crate::backend::auth::{login, signup};
use crate::backend::error::{ok, ApiResult};
use crate::backend::gamification::handlers::list_badges;
use crate::backend::realtime::ws_handler;
use crate::backend::server::state::AppState;
use crate::backend::subscription::api::list_plans;
use crate::backend::subscription::webhook::handle_billing_webhook;

/// Liveness plus a database round trip
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let database = match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::error!("Health check database query failed: {}", e);
            "unavailable"
        }
    };
    ok(json!({
        "status": "ok",
        "database": database,
        "connected_users": state.hub.room_count(),
    }))
}

pub fn configure_public_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/health", get(health))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/subscriptions/plans", get(list_plans))
        .route("/api/badges", get(list_badges))
        .route("/api/webhooks/billing", post(handle_billing_webhook))
        .route("/ws", get(ws_handler))
}

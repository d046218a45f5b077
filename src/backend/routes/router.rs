/**
 * Router Configuration
 *
 * `create_router` assembles the route groups and applies the global layers.
 *
 * # Layer Order
 *
 * Outermost first:
 * 1. CORS (`CORS_ORIGIN`, or any origin)
 * 2. `TraceLayer` request logging
 * 3. Per-client rate limiting (health and webhook exempt)
 * 4. Per-group `route_layer`s: `auth_middleware`, then the role gate
 *
 * `route_layer` only wraps matched routes, so an unknown path reaches the
 * fallback as a 404 envelope instead of a 401.
 */

use axum::http::{HeaderValue, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::Response;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::backend::error::conversion::error_response;
use crate::backend::middleware::{
    auth_middleware, rate_limit_middleware, require_admin, require_moderator,
};
use crate::backend::routes::admin_routes::{admin_routes, moderation_routes};
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::routes::public_routes::configure_public_routes;
use crate::backend::server::config::AppConfig;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let authenticated = configure_api_routes(Router::new())
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    let admin = admin_routes()
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    let moderation = moderation_routes()
        .route_layer(from_fn(require_moderator))
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    let cors = cors_layer(&app_state.config);

    configure_public_routes(Router::new())
        .merge(authenticated)
        .merge(admin)
        .merge(moderation)
        .fallback(not_found)
        .layer(from_fn_with_state(app_state.clone(), rate_limit_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match config.cors_origin.as_deref() {
        None => layer.allow_origin(Any),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => layer.allow_origin(value),
            Err(_) => {
                tracing::warn!("Invalid CORS_ORIGIN {:?}; allowing any origin", origin);
                layer.allow_origin(Any)
            }
        },
    }
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Route not found")
}

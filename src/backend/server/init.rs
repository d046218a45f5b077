/**
 * Server Initialization
 *
 * 1. Read `AppConfig` from the environment
 * 2. Open the SQLite pool and apply migrations (in-memory fallback)
 * 3. Build `AppState` (hub, email queue, rate limiter)
 * 4. Start the periodic room cleanup task
 * 5. Build the router
 */

use std::time::Duration;

use axum::Router;
use thiserror::Error;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, AppConfig, ConfigError};
use crate::backend::server::state::AppState;

/// Interval between sweeps of websocket rooms nobody listens to
pub const ROOM_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum InitError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create and configure the Axum application from the environment
pub async fn create_app() -> Result<Router<()>, InitError> {
    let config = AppConfig::from_env()?;
    let (app, _) = create_app_with_config(config).await?;
    Ok(app)
}

/// Same as `create_app` with an explicit configuration; also returns the state
pub async fn create_app_with_config(config: AppConfig) -> Result<(Router<()>, AppState), InitError> {
    tracing::info!("Initializing Stride backend server");

    let pool = load_database(&config.database_url).await?;
    let app_state = AppState::new(pool, config);

    spawn_room_cleanup(&app_state);

    let app = build_router(app_state.clone());
    tracing::info!("Router configured with periodic cleanup task");

    Ok((app, app_state))
}

/// Router over an existing state; tests use this with an in-memory pool
pub fn build_router(app_state: AppState) -> Router<()> {
    create_router(app_state)
}

fn spawn_room_cleanup(app_state: &AppState) {
    let hub = app_state.hub.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ROOM_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = hub.cleanup_inactive_rooms();
            if removed > 0 {
                tracing::debug!("Cleaned up {} inactive realtime rooms", removed);
            }
        }
    });
}

/**
 * Application State
 *
 * `AppState` is cloned into every handler. All fields are cheap handles:
 * the SQLite pool, the shared configuration, the per-user event hub, the
 * email queue and the rate limiter. The `FromRef` impls let handlers
 * extract only the part they need, e.g. `State(pool): State<SqlitePool>`.
 */

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::backend::jobs::EmailQueue;
use crate::backend::middleware::rate_limit::RateLimiter;
use crate::backend::realtime::RealtimeHub;
use crate::backend::server::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,

    pub config: Arc<AppConfig>,

    /// Per-user broadcast rooms for websocket delivery
    pub hub: RealtimeHub,

    /// Outbound email; a logging no-op unless enabled
    pub email: EmailQueue,

    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Assemble state from a ready pool and configuration
    ///
    /// The email worker is started here, so this must run inside a tokio
    /// runtime when email is enabled.
    pub fn new(db: SqlitePool, config: AppConfig) -> Self {
        let rate_limiter = RateLimiter::new(
            config.rate_limit_max,
            Duration::from_secs(config.rate_limit_window_secs),
        );
        let email = EmailQueue::start(&config.email);

        Self {
            db,
            config: Arc::new(config),
            hub: RealtimeHub::new(),
            email,
            rate_limiter,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for RealtimeHub {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hub.clone()
    }
}

impl FromRef<AppState> for EmailQueue {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.email.clone()
    }
}

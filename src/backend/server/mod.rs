//! Server Module
//!
//! Everything needed to stand the HTTP server up.
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports and documentation
//! ├── state.rs  - AppState and FromRef implementations
//! ├── config.rs - Environment configuration and database loading
//! └── init.rs   - Server initialization and app creation
//! ```
//!
//! `AppState` is the single state type behind every handler. Its fields are
//! cheap handles (pool, `Arc<AppConfig>`, hub, email queue, rate limiter), so
//! cloning it per request costs a few reference-count bumps.

/// Application state management
pub mod state;

/// Configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::{AppConfig, ConfigError};
pub use init::{build_router, create_app, create_app_with_config};
pub use state::AppState;

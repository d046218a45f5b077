//! Route Configuration Module
//!
//! Routes are grouped by who may call them:
//!
//! - **`public_routes`** - no token: health, signup/login, plan catalogue,
//!   badge catalogue, the billing webhook and the websocket upgrade (which
//!   authenticates itself before upgrading)
//! - **`api_routes`** - every authenticated REST resource
//! - **`admin_routes`** - site admin and moderation endpoints, gated by role
//! - **`router`** - assembles the groups and applies the global layers
//!
//! ```text
//! routes/
//! ├── mod.rs           - Module exports and documentation
//! ├── router.rs        - create_router, layers, fallback
//! ├── public_routes.rs - Unauthenticated endpoints
//! ├── api_routes.rs    - Authenticated endpoints
//! └── admin_routes.rs  - Admin and moderator endpoints
//! ```

pub mod router;

pub mod public_routes;

pub mod api_routes;

pub mod admin_routes;

pub use router::create_router;

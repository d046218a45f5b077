//! Middleware Module
//!
//! HTTP middleware applied by the router.
//!
//! - **`auth`** - bearer authentication, role gates and the `AuthUser` extractor
//! - **`rate_limit`** - per-client fixed-window rate limiting

pub mod auth;

pub mod rate_limit;

pub use auth::{auth_middleware, require_admin, require_moderator, AuthUser, AuthenticatedUser};
pub use rate_limit::{rate_limit_middleware, RateLimiter};

//! Shared Module
//!
//! Types that cross the wire: request bodies, response records, the JSON
//! envelope, and the websocket event protocol. Everything here serializes
//! with serde and carries no server dependencies, apart from optional sqlx
//! row derives when the `ssr` feature is on.

/// Response envelope and pagination
pub mod api;

/// Shared error types
pub mod error;

/// Websocket event protocol
pub mod event;

/// Input validation and free-text sanitization
pub mod validation;

/// User profiles and roles
pub mod users;

/// Friendships
pub mod social;

/// Groups and memberships
pub mod groups;

/// Chats, messages, reactions
pub mod chat;

/// Blog posts and comments
pub mod blog;

/// Goals, milestones, tasks
pub mod goals;

/// Challenges and participation
pub mod challenges;

/// Points, levels, badges, streaks, leaderboards
pub mod gamification;

/// User notifications
pub mod notifications;

/// Activity log entries
pub mod activity;

/// Subscription plans and billing records
pub mod billing;

/// Admin-only records
pub mod admin;

/// Re-export commonly used types for convenience
pub use api::{ApiResponse, Paginated, Page};
pub use error::SharedError;
pub use event::{ClientEvent, ServerEvent};

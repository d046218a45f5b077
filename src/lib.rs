// Increase recursion limit for complex async operations
#![recursion_limit = "256"]

//! Stride - Main Library
//!
//! Stride is a social productivity backend: people sign up, befriend each
//! other, chat, write blog posts, set goals, join challenges, and earn
//! points, badges and streaks along the way. Premium plans are billed through
//! an external payment provider that reports back over a signed webhook.
//!
//! # Module Structure
//!
//! - **`shared`** - Serializable types shared by the server and any client
//!   - Response envelope and pagination
//!   - Domain records (users, chats, goals, challenges, ...)
//!   - Real-time socket events
//!   - Input validation and sanitization
//!
//! - **`backend`** - Server-side code (only compiled with the `ssr` feature)
//!   - Axum HTTP server, JWT authentication, role gates
//!   - SQLite persistence through sqlx
//!   - Websocket hub for chat and notification push
//!   - Billing webhook, email queue, rate limiting
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - builds the server and everything it needs.
//!   Without it only the `shared` types are compiled.
//!
//! # Usage
//!
//! ```rust,no_run
//! use stride::backend::server::init::create_app;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app().await?;
//! // Serve `app` with axum::serve
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;

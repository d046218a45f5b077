//! Backend Module
//!
//! The Axum server: HTTP handlers, SQLite persistence, JWT authentication,
//! the websocket hub and the background email worker. Only compiled with
//! the `ssr` feature.
//!
//! # Architecture
//!
//! Infrastructure:
//!
//! - **`server`** - configuration, `AppState`, startup
//! - **`routes`** - router assembly and global layers
//! - **`middleware`** - bearer authentication, role gates, rate limiting
//! - **`error`** - `BackendError` and the response envelope helpers
//! - **`realtime`** - per-user broadcast rooms and the `/ws` endpoint
//! - **`jobs`** - outbound email queue
//!
//! Features:
//!
//! - **`auth`**, **`users`** - accounts, sessions, profiles
//! - **`social`** - friend requests, friendships, blocks
//! - **`groups`** - groups with a backing group chat
//! - **`chat`** - direct and group chats, messages, reactions, read receipts
//! - **`blog`** - posts, likes, threaded comments
//! - **`goals`** - goals with milestones and tasks
//! - **`challenges`** - shared targets with progress and leaderboards
//! - **`gamification`** - points, levels, streaks, badges, leaderboards
//! - **`notifications`**, **`activity`** - per-user inbox and activity log
//! - **`subscription`** - plans, limits, billing webhook
//! - **`admin`** - user management, moderation, audit log
//!
//! # Handler Conventions
//!
//! Handlers take `State<AppState>`, the `AuthUser` extractor where the
//! route is authenticated, then `Path`/`Query`/`Json`. They return
//! `ApiResult<T>` or `CreatedResult<T>` and propagate failures with `?`;
//! `BackendError` renders the `{ success: false, message, status }` body.

pub mod server;

pub mod routes;

pub mod error;

pub mod middleware;

pub mod realtime;

pub mod jobs;

pub mod auth;

pub mod users;

pub mod social;

pub mod groups;

pub mod chat;

pub mod blog;

pub mod goals;

pub mod challenges;

pub mod gamification;

pub mod notifications;

pub mod activity;

pub mod subscription;

pub mod admin;

pub use error::BackendError;
pub use server::{create_app, AppState};

//! Activity Log
//!
//! Gamified actions are recorded here; a user's friends see them in their
//! feed.

pub mod db;

pub mod handlers;

pub use db::log_activity;

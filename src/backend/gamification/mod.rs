//! Gamification
//!
//! Points, levels, streaks, badges and leaderboards.
//!
//! - **`rules`** - pure arithmetic (levels, streak transitions, ranking)
//! - **`db`** - ledger, streak, badge and leaderboard queries
//! - **`service`** - `record_activity` and badge evaluation used by other modules
//! - **`handlers`** - HTTP endpoints

pub mod rules;

pub mod db;

pub mod service;

pub mod handlers;

pub use service::{award_points, evaluate_badges, record_activity, record_streak, ActivityRecord};

//! Administration
//!
//! User management, badge definitions, announcements and statistics for
//! admins, plus content removal for moderators. Every action is written to
//! the admin action log.

pub mod db;

pub mod handlers;

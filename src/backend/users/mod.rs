//! User Profiles
//!
//! Profile reads and edits, password changes, self-deactivation and user
//! search. Account creation and login live in `auth`.

pub mod db;

pub mod handlers;

//! Goals
//!
//! Goals with milestones and tasks. Progress is recomputed from the children
//! whenever one changes, until the goal itself is completed.

pub mod db;

pub mod handlers;

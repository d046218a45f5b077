//! Blog
//!
//! Posts move draft -> published (-> archived). Publishing sets
//! `published_at` the first time only, and only that first time awards
//! points. Posts and comments are soft-deleted.

pub mod db;

pub mod handlers;

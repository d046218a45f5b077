//! Friends
//!
//! Friend requests, friendships and blocks. A friendship is one row per
//! ordered pair; checks always look at both directions.

pub mod db;

pub mod handlers;

pub use db::are_friends;

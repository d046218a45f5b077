//! Challenges
//!
//! Time-boxed targets that users join and report progress against. The
//! update that first reaches the target completes the challenge for that
//! participant and pays its reward; later updates only add progress.

pub mod db;

pub mod handlers;

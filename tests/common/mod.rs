//! Common test utilities and helpers
//!
//! - In-memory database fixture
//! - The full router driven in-process
//! - Account helpers
//! - Envelope assertion macros

#![allow(dead_code)]

pub mod app;
pub mod assertions;
pub mod auth_helpers;
pub mod database;

pub use app::*;
pub use auth_helpers::*;
pub use database::*;

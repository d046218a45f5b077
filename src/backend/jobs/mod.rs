//! Background Jobs
//!
//! - **`email`** - optional outbound email queue

pub mod email;

pub use email::{EmailJob, EmailQueue};

//! Subscriptions and Billing
//!
//! Billing state is driven by the payment provider's webhook; the API side
//! only reads it, except for a local cancel-at-period-end flag.
//!
//! - **`db`** - subscription and webhook-event queries
//! - **`limits`** - free-plan caps on active goals and owned groups
//! - **`api`** - plans, current subscription, usage, cancel
//! - **`webhook`** - signed provider webhook

pub mod db;

pub mod limits;

pub mod api;

pub mod webhook;

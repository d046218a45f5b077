//! Real-time Module
//!
//! Per-user broadcast rooms and the websocket endpoint that feeds them.
//!
//! ```text
//! realtime/
//! ├── mod.rs       - Module exports
//! ├── broadcast.rs - RealtimeHub (user id -> broadcast room)
//! └── socket.rs    - GET /ws upgrade and client event dispatch
//! ```
//!
//! Events are defined in [`crate::shared::event`]. Rooms are keyed by user,
//! not by chat, so one subscription per socket covers every chat and every
//! notification the user receives.

/// Per-user broadcast rooms
pub mod broadcast;

/// Websocket endpoint
pub mod socket;

pub use broadcast::RealtimeHub;
pub use socket::ws_handler;

//! Chat Backend Module
//!
//! Direct and group conversations over REST and the websocket.
//!
//! # Architecture
//!
//! - **`db`** - chats, participants, messages, reactions, read receipts
//! - **`service`** - operations shared by REST and the socket; each mutation
//!   broadcasts to every participant's room
//! - **`handlers`** - `/api/chats/...` HTTP handlers

/// Database operations for chats and messages
pub mod db;

/// Operations shared by REST and the websocket
pub mod service;

/// HTTP handlers
pub mod handlers;

/**
 * Real-time Event Protocol
 *
 * Frames on the websocket are JSON objects of the form
 * `{ "event": "<name>", "data": { ... } }`. Clients send `ClientEvent`s and
 * receive `ServerEvent`s. Every server event is delivered to per-user rooms,
 * except `Error` and `Pong` which only go back to the sending connection.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::chat::{ChatMessage, ReactionSummary, ReadReceipt};
use crate::shared::notifications::Notification;

/// Event pushed from the server to connected clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// First frame after a successful upgrade
    Connected { user_id: Uuid },
    NewMessage(ChatMessage),
    MessageEdited(ChatMessage),
    MessageDeleted { chat_id: Uuid, message_id: Uuid },
    ReactionUpdated {
        chat_id: Uuid,
        message_id: Uuid,
        reactions: Vec<ReactionSummary>,
    },
    MessagesRead(ReadReceipt),
    UserTyping {
        chat_id: Uuid,
        user_id: Uuid,
        username: String,
        is_typing: bool,
    },
    NewNotification(Notification),
    Pong,
    Error { message: String },
}

impl ServerEvent {
    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "connected",
            ServerEvent::NewMessage(_) => "newMessage",
            ServerEvent::MessageEdited(_) => "messageEdited",
            ServerEvent::MessageDeleted { .. } => "messageDeleted",
            ServerEvent::ReactionUpdated { .. } => "reactionUpdated",
            ServerEvent::MessagesRead(_) => "messagesRead",
            ServerEvent::UserTyping { .. } => "userTyping",
            ServerEvent::NewNotification(_) => "newNotification",
            ServerEvent::Pong => "pong",
            ServerEvent::Error { .. } => "error",
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }
}

/// Event sent by a client over the websocket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    SendMessage {
        chat_id: Uuid,
        content: String,
        reply_to: Option<Uuid>,
    },
    EditMessage { message_id: Uuid, content: String },
    DeleteMessage { message_id: Uuid },
    AddReaction { message_id: Uuid, emoji: String },
    RemoveReaction { message_id: Uuid, emoji: String },
    Typing { chat_id: Uuid },
    StopTyping { chat_id: Uuid },
    MarkRead {
        chat_id: Uuid,
        message_id: Option<Uuid>,
    },
    Ping,
}

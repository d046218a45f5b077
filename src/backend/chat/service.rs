//! Chat Service
//!
//! Every chat operation lives here so the REST handlers and the websocket
//! dispatcher behave the same. Each mutation persists first and then emits
//! the matching `ServerEvent` to every participant's room.

use chrono::Utc;
use uuid::Uuid;

use super::db;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthenticatedUser;
use crate::backend::server::state::AppState;
use crate::backend::social::are_friends;
use crate::shared::chat::{
    summarize_reactions, Chat, ChatKind, ChatMessage, ChatSummary, ReactionSummary, ReadReceipt,
    MAX_EMOJI_LENGTH, MAX_MESSAGE_LENGTH,
};
use crate::shared::validation::clean_required;
use crate::shared::ServerEvent;

pub const MAX_CHAT_NAME_LENGTH: usize = 100;

/// Load a chat the user takes part in
///
/// Unknown chats are 404, chats the user is not in are 403.
pub async fn ensure_participant(
    app_state: &AppState,
    chat_id: Uuid,
    user_id: Uuid,
) -> Result<Chat, BackendError> {
    let chat = db::get_chat(&app_state.db, chat_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Chat not found"))?;
    if !db::is_participant(&app_state.db, chat_id, user_id).await? {
        return Err(BackendError::forbidden("You are not a participant of this chat"));
    }
    Ok(chat)
}

async fn broadcast(app_state: &AppState, chat_id: Uuid, event: ServerEvent) -> Result<(), BackendError> {
    let participants = db::participant_ids(&app_state.db, chat_id).await?;
    let delivered = app_state.hub.emit_to_users(&participants, &event);
    tracing::debug!(
        "Chat {} event {} delivered to {} connection(s)",
        chat_id,
        event.name(),
        delivered
    );
    Ok(())
}

async fn load_message(app_state: &AppState, message_id: Uuid) -> Result<ChatMessage, BackendError> {
    db::get_message(&app_state.db, message_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Message not found"))
}

async fn with_reactions(app_state: &AppState, mut message: ChatMessage) -> Result<ChatMessage, BackendError> {
    let rows = db::message_reactions(&app_state.db, message.id).await?;
    message.reactions = summarize_reactions(&rows);
    Ok(message)
}

pub async fn summarize(app_state: &AppState, chat: Chat, user_id: Uuid) -> Result<ChatSummary, BackendError> {
    let participants = db::participants(&app_state.db, chat.id).await?;
    let last_message = db::last_message(&app_state.db, chat.id).await?;
    let unread_count = db::unread_count(&app_state.db, chat.id, user_id).await?;
    Ok(ChatSummary {
        chat,
        participants,
        last_message,
        unread_count,
    })
}

pub async fn list_chats(app_state: &AppState, user_id: Uuid) -> Result<Vec<ChatSummary>, BackendError> {
    let chats = db::chats_for_user(&app_state.db, user_id).await?;
    let mut summaries = Vec::with_capacity(chats.len());
    for chat in chats {
        summaries.push(summarize(app_state, chat, user_id).await?);
    }
    Ok(summaries)
}

/// Open (or return) the direct chat with a friend
///
/// Returns the chat and whether it was created by this call.
pub async fn open_direct_chat(
    app_state: &AppState,
    user: &AuthenticatedUser,
    other_id: Uuid,
) -> Result<(Chat, bool), BackendError> {
    if other_id == user.user_id {
        return Err(BackendError::bad_request("You cannot start a chat with yourself"));
    }
    if !are_friends(&app_state.db, user.user_id, other_id).await? {
        return Err(BackendError::forbidden("You can only message friends"));
    }

    let key = db::direct_key(user.user_id, other_id);
    if let Some(chat) = db::find_direct(&app_state.db, &key).await? {
        return Ok((chat, false));
    }

    let chat = db::create_chat(
        &app_state.db,
        ChatKind::Direct,
        None,
        None,
        user.user_id,
        Some(&key),
    )
    .await?;
    db::add_participant(&app_state.db, chat.id, user.user_id).await?;
    db::add_participant(&app_state.db, chat.id, other_id).await?;

    tracing::info!("Direct chat {} opened by {}", chat.id, user.username);
    Ok((chat, true))
}

/// Ad-hoc group chat with the creator and any of their friends
pub async fn create_group_chat(
    app_state: &AppState,
    user: &AuthenticatedUser,
    name: &str,
    participant_ids: &[Uuid],
) -> Result<Chat, BackendError> {
    let name = clean_required("name", name, MAX_CHAT_NAME_LENGTH)?;

    for &id in participant_ids.iter().filter(|&&id| id != user.user_id) {
        if !are_friends(&app_state.db, user.user_id, id).await? {
            return Err(BackendError::forbidden("Group chats can only include friends"));
        }
    }

    let chat = db::create_chat(&app_state.db, ChatKind::Group, Some(&name), None, user.user_id, None).await?;
    db::add_participant(&app_state.db, chat.id, user.user_id).await?;
    for &id in participant_ids {
        db::add_participant(&app_state.db, chat.id, id).await?;
    }

    tracing::info!("Group chat {} created by {}", chat.id, user.username);
    Ok(chat)
}

/// Messages newest first; `before` must be a message of the same chat
pub async fn list_messages(
    app_state: &AppState,
    user_id: Uuid,
    chat_id: Uuid,
    limit: i64,
    before: Option<Uuid>,
) -> Result<Vec<ChatMessage>, BackendError> {
    ensure_participant(app_state, chat_id, user_id).await?;

    let cursor = match before {
        Some(id) => {
            let message = load_message(app_state, id).await?;
            if message.chat_id != chat_id {
                return Err(BackendError::bad_request("Cursor message belongs to another chat"));
            }
            Some(message.created_at)
        }
        None => None,
    };

    Ok(db::list_messages(&app_state.db, chat_id, limit, cursor).await?)
}

pub async fn send_message(
    app_state: &AppState,
    user: &AuthenticatedUser,
    chat_id: Uuid,
    content: &str,
    reply_to: Option<Uuid>,
) -> Result<ChatMessage, BackendError> {
    ensure_participant(app_state, chat_id, user.user_id).await?;
    let content = clean_required("content", content, MAX_MESSAGE_LENGTH)?;

    if let Some(parent_id) = reply_to {
        let parent = load_message(app_state, parent_id).await?;
        if parent.chat_id != chat_id {
            return Err(BackendError::bad_request("Reply target belongs to another chat"));
        }
    }

    let id = db::insert_message(&app_state.db, chat_id, user.user_id, &content, reply_to).await?;
    let message = load_message(app_state, id).await?;

    broadcast(app_state, chat_id, ServerEvent::NewMessage(message.clone())).await?;
    Ok(message)
}

pub async fn edit_message(
    app_state: &AppState,
    user: &AuthenticatedUser,
    message_id: Uuid,
    content: &str,
) -> Result<ChatMessage, BackendError> {
    let message = load_message(app_state, message_id).await?;
    ensure_participant(app_state, message.chat_id, user.user_id).await?;

    if message.sender_id != user.user_id {
        return Err(BackendError::forbidden("You can only edit your own messages"));
    }
    if message.is_deleted {
        return Err(BackendError::bad_request("Cannot edit a deleted message"));
    }

    let content = clean_required("content", content, MAX_MESSAGE_LENGTH)?;
    db::edit_message(&app_state.db, message_id, &content).await?;

    let edited = with_reactions(app_state, load_message(app_state, message_id).await?).await?;
    broadcast(app_state, edited.chat_id, ServerEvent::MessageEdited(edited.clone())).await?;
    Ok(edited)
}

/// Soft delete by the sender or a moderator
pub async fn delete_message(
    app_state: &AppState,
    user: &AuthenticatedUser,
    message_id: Uuid,
) -> Result<(), BackendError> {
    let message = load_message(app_state, message_id).await?;
    if message.is_deleted {
        return Err(BackendError::not_found("Message not found"));
    }

    let moderating = user.is_moderator();
    if !moderating {
        ensure_participant(app_state, message.chat_id, user.user_id).await?;
    }
    if message.sender_id != user.user_id && !moderating {
        return Err(BackendError::forbidden("You can only delete your own messages"));
    }

    db::soft_delete_message(&app_state.db, message_id).await?;
    if message.sender_id != user.user_id {
        tracing::info!("Moderator {} removed message {}", user.username, message_id);
    }

    broadcast(
        app_state,
        message.chat_id,
        ServerEvent::MessageDeleted {
            chat_id: message.chat_id,
            message_id,
        },
    )
    .await
}

fn clean_emoji(emoji: &str) -> Result<String, BackendError> {
    let emoji = emoji.trim();
    if emoji.is_empty() || emoji.chars().count() > MAX_EMOJI_LENGTH {
        return Err(BackendError::bad_request(format!(
            "emoji must be 1-{} characters",
            MAX_EMOJI_LENGTH
        )));
    }
    Ok(emoji.to_string())
}

async fn reaction_target(
    app_state: &AppState,
    user: &AuthenticatedUser,
    message_id: Uuid,
) -> Result<ChatMessage, BackendError> {
    let message = load_message(app_state, message_id).await?;
    ensure_participant(app_state, message.chat_id, user.user_id).await?;
    if message.is_deleted {
        return Err(BackendError::bad_request("Cannot react to a deleted message"));
    }
    Ok(message)
}

async fn emit_reactions(app_state: &AppState, message: &ChatMessage) -> Result<Vec<ReactionSummary>, BackendError> {
    let rows = db::message_reactions(&app_state.db, message.id).await?;
    let reactions = summarize_reactions(&rows);
    broadcast(
        app_state,
        message.chat_id,
        ServerEvent::ReactionUpdated {
            chat_id: message.chat_id,
            message_id: message.id,
            reactions: reactions.clone(),
        },
    )
    .await?;
    Ok(reactions)
}

/// Adding the same reaction twice is a no-op
pub async fn add_reaction(
    app_state: &AppState,
    user: &AuthenticatedUser,
    message_id: Uuid,
    emoji: &str,
) -> Result<Vec<ReactionSummary>, BackendError> {
    let emoji = clean_emoji(emoji)?;
    let message = reaction_target(app_state, user, message_id).await?;
    db::add_reaction(&app_state.db, message_id, user.user_id, &emoji).await?;
    emit_reactions(app_state, &message).await
}

pub async fn remove_reaction(
    app_state: &AppState,
    user: &AuthenticatedUser,
    message_id: Uuid,
    emoji: &str,
) -> Result<Vec<ReactionSummary>, BackendError> {
    let emoji = clean_emoji(emoji)?;
    let message = load_message(app_state, message_id).await?;
    ensure_participant(app_state, message.chat_id, user.user_id).await?;

    if !db::remove_reaction(&app_state.db, message_id, user.user_id, &emoji).await? {
        return Err(BackendError::not_found("Reaction not found"));
    }
    emit_reactions(app_state, &message).await
}

/// Mark every message up to `message_id` (or the latest) as read
pub async fn mark_read(
    app_state: &AppState,
    user: &AuthenticatedUser,
    chat_id: Uuid,
    message_id: Option<Uuid>,
) -> Result<ReadReceipt, BackendError> {
    ensure_participant(app_state, chat_id, user.user_id).await?;

    let upto = match message_id {
        Some(id) => {
            let message = load_message(app_state, id).await?;
            if message.chat_id != chat_id {
                return Err(BackendError::bad_request("Message belongs to another chat"));
            }
            Some(message)
        }
        None => db::last_message(&app_state.db, chat_id).await?,
    };

    let read_at = Utc::now();
    let marked = match &upto {
        Some(message) => {
            db::mark_read(&app_state.db, chat_id, user.user_id, message.created_at, read_at).await?
        }
        None => 0,
    };

    let receipt = ReadReceipt {
        chat_id,
        user_id: user.user_id,
        last_read_message_id: upto.map(|m| m.id),
        messages_marked: marked as i64,
        read_at,
    };
    broadcast(app_state, chat_id, ServerEvent::MessagesRead(receipt.clone())).await?;
    Ok(receipt)
}

/// Tell the other participants the user started or stopped typing
pub async fn typing(
    app_state: &AppState,
    user: &AuthenticatedUser,
    chat_id: Uuid,
    is_typing: bool,
) -> Result<(), BackendError> {
    ensure_participant(app_state, chat_id, user.user_id).await?;

    let others: Vec<Uuid> = db::participant_ids(&app_state.db, chat_id)
        .await?
        .into_iter()
        .filter(|&id| id != user.user_id)
        .collect();

    app_state.hub.emit_to_users(
        &others,
        &ServerEvent::UserTyping {
            chat_id,
            user_id: user.user_id,
            username: user.username.clone(),
            is_typing,
        },
    );
    Ok(())
}

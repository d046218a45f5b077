/**
 * Database Operations for Chats and Messages
 *
 * Chats, their participants, messages, reactions and read receipts.
 * Messages are never removed; deleting one blanks its content.
 */

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::chat::{summarize_reactions, Chat, ChatKind, ChatMessage, MessageReaction};
use crate::shared::users::UserSummary;

const MESSAGE_SELECT: &str = r#"
    SELECT m.id, m.chat_id, m.sender_id, u.username AS sender_username, m.content,
           m.reply_to, m.is_edited, m.edited_at, m.is_deleted, m.created_at
    FROM messages m
    JOIN users u ON u.id = m.sender_id
"#;

/// Key that makes a direct chat unique per unordered pair
pub fn direct_key(a: Uuid, b: Uuid) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("{}:{}", low, high)
}

pub async fn create_chat(
    pool: &SqlitePool,
    kind: ChatKind,
    name: Option<&str>,
    group_id: Option<Uuid>,
    created_by: Uuid,
    direct_key: Option<&str>,
) -> Result<Chat, sqlx::Error> {
    sqlx::query_as::<_, Chat>(
        r#"
        INSERT INTO chats (id, kind, name, group_id, created_by, direct_key, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(kind)
    .bind(name)
    .bind(group_id)
    .bind(created_by)
    .bind(direct_key)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn get_chat(pool: &SqlitePool, chat_id: Uuid) -> Result<Option<Chat>, sqlx::Error> {
    sqlx::query_as::<_, Chat>("SELECT * FROM chats WHERE id = $1")
        .bind(chat_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_direct(pool: &SqlitePool, key: &str) -> Result<Option<Chat>, sqlx::Error> {
    sqlx::query_as::<_, Chat>("SELECT * FROM chats WHERE direct_key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await
}

pub async fn rename_chat(pool: &SqlitePool, chat_id: Uuid, name: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE chats SET name = $1 WHERE id = $2")
        .bind(name)
        .bind(chat_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn add_participant(pool: &SqlitePool, chat_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT OR IGNORE INTO chat_participants (chat_id, user_id, joined_at) VALUES ($1, $2, $3)",
    )
    .bind(chat_id)
    .bind(user_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn remove_participant(pool: &SqlitePool, chat_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM chat_participants WHERE chat_id = $1 AND user_id = $2")
        .bind(chat_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn is_participant(pool: &SqlitePool, chat_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM chat_participants WHERE chat_id = $1 AND user_id = $2",
    )
    .bind(chat_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub async fn participant_ids(pool: &SqlitePool, chat_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_id FROM chat_participants WHERE chat_id = $1")
        .bind(chat_id)
        .fetch_all(pool)
        .await
}

pub async fn participants(pool: &SqlitePool, chat_id: Uuid) -> Result<Vec<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.id, u.username, u.display_name, u.avatar_url
        FROM chat_participants p
        JOIN users u ON u.id = p.user_id
        WHERE p.chat_id = $1
        ORDER BY p.joined_at
        "#,
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await
}

/// Chats the user takes part in, most recently active first
pub async fn chats_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Chat>, sqlx::Error> {
    sqlx::query_as::<_, Chat>(
        r#"
        SELECT c.*
        FROM chats c
        JOIN chat_participants p ON p.chat_id = c.id
        WHERE p.user_id = $1
        ORDER BY COALESCE(c.last_message_at, c.created_at) DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn insert_message(
    pool: &SqlitePool,
    chat_id: Uuid,
    sender_id: Uuid,
    content: &str,
    reply_to: Option<Uuid>,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO messages (id, chat_id, sender_id, content, reply_to, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(chat_id)
    .bind(sender_id)
    .bind(content)
    .bind(reply_to)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query("UPDATE chats SET last_message_at = $1 WHERE id = $2")
        .bind(now)
        .bind(chat_id)
        .execute(pool)
        .await?;

    Ok(id)
}

/// A message without its reactions
pub async fn get_message(pool: &SqlitePool, message_id: Uuid) -> Result<Option<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(&format!("{} WHERE m.id = $1", MESSAGE_SELECT))
        .bind(message_id)
        .fetch_optional(pool)
        .await
}

pub async fn last_message(pool: &SqlitePool, chat_id: Uuid) -> Result<Option<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(&format!(
        "{} WHERE m.chat_id = $1 ORDER BY m.created_at DESC LIMIT 1",
        MESSAGE_SELECT
    ))
    .bind(chat_id)
    .fetch_optional(pool)
    .await
}

/// Newest first, optionally only those strictly older than `before`
pub async fn list_messages(
    pool: &SqlitePool,
    chat_id: Uuid,
    limit: i64,
    before: Option<DateTime<Utc>>,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    let mut messages = sqlx::query_as::<_, ChatMessage>(&format!(
        r#"{}
        WHERE m.chat_id = $1 AND ($2 IS NULL OR m.created_at < $2)
        ORDER BY m.created_at DESC
        LIMIT $3"#,
        MESSAGE_SELECT
    ))
    .bind(chat_id)
    .bind(before)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut reactions = chat_reactions(pool, chat_id).await?;
    for message in &mut messages {
        if let Some(rows) = reactions.remove(&message.id) {
            message.reactions = summarize_reactions(&rows);
        }
    }
    Ok(messages)
}

pub async fn edit_message(pool: &SqlitePool, message_id: Uuid, content: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE messages SET content = $1, is_edited = 1, edited_at = $2 WHERE id = $3")
        .bind(content)
        .bind(Utc::now())
        .bind(message_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn soft_delete_message(pool: &SqlitePool, message_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE messages SET content = '', is_deleted = 1 WHERE id = $1")
        .bind(message_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn add_reaction(
    pool: &SqlitePool,
    message_id: Uuid,
    user_id: Uuid,
    emoji: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO message_reactions (message_id, user_id, emoji, created_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(message_id)
    .bind(user_id)
    .bind(emoji)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn remove_reaction(
    pool: &SqlitePool,
    message_id: Uuid,
    user_id: Uuid,
    emoji: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM message_reactions WHERE message_id = $1 AND user_id = $2 AND emoji = $3",
    )
    .bind(message_id)
    .bind(user_id)
    .bind(emoji)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn message_reactions(
    pool: &SqlitePool,
    message_id: Uuid,
) -> Result<Vec<MessageReaction>, sqlx::Error> {
    sqlx::query_as::<_, MessageReaction>(
        "SELECT * FROM message_reactions WHERE message_id = $1 ORDER BY created_at",
    )
    .bind(message_id)
    .fetch_all(pool)
    .await
}

async fn chat_reactions(
    pool: &SqlitePool,
    chat_id: Uuid,
) -> Result<HashMap<Uuid, Vec<MessageReaction>>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MessageReaction>(
        r#"
        SELECT r.*
        FROM message_reactions r
        JOIN messages m ON m.id = r.message_id
        WHERE m.chat_id = $1
        ORDER BY r.created_at
        "#,
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await?;

    let mut by_message: HashMap<Uuid, Vec<MessageReaction>> = HashMap::new();
    for row in rows {
        by_message.entry(row.message_id).or_default().push(row);
    }
    Ok(by_message)
}

/// Messages from others the user has not read yet
pub async fn unread_count(pool: &SqlitePool, chat_id: Uuid, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM messages m
        WHERE m.chat_id = $1 AND m.sender_id != $2 AND m.is_deleted = 0
          AND NOT EXISTS (
              SELECT 1 FROM message_reads r WHERE r.message_id = m.id AND r.user_id = $2
          )
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Record reads for every message from others up to `upto`; returns how many were new
pub async fn mark_read(
    pool: &SqlitePool,
    chat_id: Uuid,
    user_id: Uuid,
    upto: DateTime<Utc>,
    read_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO message_reads (message_id, user_id, read_at)
        SELECT id, $2, $4 FROM messages
        WHERE chat_id = $1 AND sender_id != $2 AND is_deleted = 0 AND created_at <= $3
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .bind(upto)
    .bind(read_at)
    .execute(pool)
    .await?;

    sqlx::query("UPDATE chat_participants SET last_read_at = $1 WHERE chat_id = $2 AND user_id = $3")
        .bind(read_at)
        .bind(chat_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

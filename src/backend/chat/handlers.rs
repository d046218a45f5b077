//! Chat HTTP Handlers
//!
//! Thin wrappers over [`super::service`]; the websocket dispatcher calls the
//! same functions.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use super::service;
use crate::backend::error::{created, ok, ok_with, ApiResult, BackendError, CreatedResult};
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::chat::{
    ChatMessage, ChatSummary, CreateDirectChatRequest, CreateGroupChatRequest, EditMessageRequest,
    MarkReadRequest, MessagesQuery, ReactionRequest, ReactionSummary, ReadReceipt,
    SendMessageRequest, TypingRequest,
};

/// `GET /api/chats`
pub async fn list_chats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Vec<ChatSummary>> {
    ok(service::list_chats(&state, user.user_id).await?)
}

/// Open a direct chat with a friend
///
/// Returns the existing chat when the pair already has one.
///
/// # Errors
///
/// * `400 Bad Request` - the target is the caller
/// * `403 Forbidden` - the two users are not friends
///
/// # Example Request
///
/// ```http
/// POST /api/chats/direct HTTP/1.1
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "user_id": "6f1c..." }
/// ```
pub async fn open_direct_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateDirectChatRequest>,
) -> CreatedResult<ChatSummary> {
    let (chat, _created) = service::open_direct_chat(&state, &user, request.user_id).await?;
    let summary = service::summarize(&state, chat, user.user_id).await?;
    created("Direct chat ready", summary)
}

/// `POST /api/chats/group`
pub async fn create_group_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateGroupChatRequest>,
) -> CreatedResult<ChatSummary> {
    let chat = service::create_group_chat(&state, &user, &request.name, &request.participant_ids).await?;
    let summary = service::summarize(&state, chat, user.user_id).await?;
    created("Group chat created", summary)
}

/// `GET /api/chats/{id}`
pub async fn get_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<Uuid>,
) -> ApiResult<ChatSummary> {
    let chat = service::ensure_participant(&state, chat_id, user.user_id).await?;
    ok(service::summarize(&state, chat, user.user_id).await?)
}

/// `GET /api/chats/{id}/messages?limit&before`
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<Uuid>,
    Query(query): Query<MessagesQuery>,
) -> ApiResult<Vec<ChatMessage>> {
    ok(service::list_messages(&state, user.user_id, chat_id, query.limit(), query.before).await?)
}

/// `POST /api/chats/{id}/messages`
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> CreatedResult<ChatMessage> {
    let message =
        service::send_message(&state, &user, chat_id, &request.content, request.reply_to).await?;
    created("Message sent", message)
}

/// `PATCH /api/messages/{id}`
pub async fn edit_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<Uuid>,
    Json(request): Json<EditMessageRequest>,
) -> ApiResult<ChatMessage> {
    ok_with(
        "Message edited",
        service::edit_message(&state, &user, message_id, &request.content).await?,
    )
}

/// `DELETE /api/messages/{id}`
pub async fn delete_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<Uuid>,
) -> ApiResult<()> {
    service::delete_message(&state, &user, message_id).await?;
    ok_with("Message deleted", ())
}

/// `POST /api/messages/{id}/reactions`
pub async fn add_reaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<Uuid>,
    Json(request): Json<ReactionRequest>,
) -> ApiResult<Vec<ReactionSummary>> {
    ok(service::add_reaction(&state, &user, message_id, &request.emoji).await?)
}

/// `DELETE /api/messages/{id}/reactions`
pub async fn remove_reaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<Uuid>,
    Json(request): Json<ReactionRequest>,
) -> ApiResult<Vec<ReactionSummary>> {
    ok(service::remove_reaction(&state, &user, message_id, &request.emoji).await?)
}

/// `POST /api/chats/{id}/read`; an empty body marks everything
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<ReadReceipt> {
    let request: MarkReadRequest = if body.is_empty() {
        MarkReadRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| BackendError::bad_request(format!("Invalid request body: {}", e)))?
    };
    let message_id = request.message_id;
    ok(service::mark_read(&state, &user, chat_id, message_id).await?)
}

/// `POST /api/chats/{id}/typing`
pub async fn typing(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<Uuid>,
    Json(request): Json<TypingRequest>,
) -> ApiResult<()> {
    service::typing(&state, &user, chat_id, request.is_typing).await?;
    ok(())
}

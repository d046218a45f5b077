/**
 * Websocket Endpoint
 *
 * `GET /ws?token=<jwt>` (or `Authorization: Bearer`). The token is checked
 * before the upgrade, so a bad token gets a plain 401 envelope.
 *
 * Once connected the socket subscribes to the user's room and:
 *
 * 1. sends `connected`
 * 2. forwards every room event to the client
 * 3. dispatches each client frame into the chat service
 *
 * Failures and `pong` go back to this connection only. Everything else
 * reaches the client through the room, like any other participant.
 */

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::backend::chat::service;
use crate::backend::error::conversion::error_response;
use crate::backend::middleware::auth::{authenticate_token, bearer_token};
use crate::backend::middleware::AuthenticatedUser;
use crate::backend::server::state::AppState;
use crate::shared::{ClientEvent, ServerEvent};

#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// Authenticate, then upgrade
pub async fn ws_handler(
    State(app_state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let token = query
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(&headers));

    let Some(token) = token else {
        tracing::warn!("Websocket connection without a token");
        return error_response(StatusCode::UNAUTHORIZED, "Missing authentication token");
    };

    let user = match authenticate_token(&app_state, token).await {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    match upgrade {
        Ok(ws) => {
            tracing::info!("Websocket upgrade for {}", user.username);
            ws.on_upgrade(move |socket| handle_socket(socket, app_state, user))
        }
        Err(rejection) => {
            tracing::warn!("Websocket upgrade rejected: {}", rejection);
            rejection.into_response()
        }
    }
}

async fn handle_socket(socket: WebSocket, app_state: AppState, user: AuthenticatedUser) {
    let (mut sink, mut stream) = socket.split();
    let mut room = app_state.hub.subscribe(user.user_id);

    if send_event(&mut sink, &ServerEvent::Connected { user_id: user.user_id })
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = dispatch(&app_state, &user, text.as_str()).await {
                        if send_event(&mut sink, &reply).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("Websocket read error for {}: {}", user.username, e);
                    break;
                }
            },
            event = room.recv() => match event {
                Ok(event) => {
                    if send_event(&mut sink, &event).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Socket for {} lagged, skipped {} events", user.username, skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    tracing::info!("Websocket closed for {}", user.username);
}

async fn send_event(
    sink: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("Failed to serialize {} event: {}", event.name(), e);
            return Ok(());
        }
    };
    sink.send(Message::Text(text.into())).await
}

/// Handle one client frame; returns the reply meant for this connection only
pub async fn dispatch(app_state: &AppState, user: &AuthenticatedUser, raw: &str) -> Option<ServerEvent> {
    let event: ClientEvent = match serde_json::from_str(raw) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!("Unreadable frame from {}: {}", user.username, e);
            return Some(ServerEvent::error(format!("Invalid event: {}", e)));
        }
    };

    let result = match event {
        ClientEvent::Ping => return Some(ServerEvent::Pong),
        ClientEvent::SendMessage {
            chat_id,
            content,
            reply_to,
        } => service::send_message(app_state, user, chat_id, &content, reply_to)
            .await
            .map(|_| ()),
        ClientEvent::EditMessage { message_id, content } => {
            service::edit_message(app_state, user, message_id, &content)
                .await
                .map(|_| ())
        }
        ClientEvent::DeleteMessage { message_id } => {
            service::delete_message(app_state, user, message_id).await
        }
        ClientEvent::AddReaction { message_id, emoji } => {
            service::add_reaction(app_state, user, message_id, &emoji)
                .await
                .map(|_| ())
        }
        ClientEvent::RemoveReaction { message_id, emoji } => {
            service::remove_reaction(app_state, user, message_id, &emoji)
                .await
                .map(|_| ())
        }
        ClientEvent::Typing { chat_id } => service::typing(app_state, user, chat_id, true).await,
        ClientEvent::StopTyping { chat_id } => service::typing(app_state, user, chat_id, false).await,
        ClientEvent::MarkRead { chat_id, message_id } => {
            service::mark_read(app_state, user, chat_id, message_id)
                .await
                .map(|_| ())
        }
    };

    match result {
        Ok(()) => None,
        Err(e) => {
            tracing::debug!("Socket event from {} failed: {}", user.username, e.message());
            Some(ServerEvent::error(e.message()))
        }
    }
}

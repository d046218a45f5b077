//! Notifications
//!
//! `notify` is the single entry point other modules use: it stores the
//! notification and pushes `newNotification` to the user's room. The HTTP
//! handlers let users page through, mark and delete their own notifications.

pub mod db;

pub mod handlers;

use serde_json::Value;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::notifications::{Notification, NotificationKind};
use crate::shared::ServerEvent;

/// Persist a notification, then emit it to the recipient's live connections
pub async fn notify(
    app_state: &AppState,
    user_id: Uuid,
    kind: NotificationKind,
    title: &str,
    body: Option<&str>,
    data: Value,
) -> Result<Notification, BackendError> {
    let notification = db::insert_notification(&app_state.db, user_id, kind, title, body, &data).await?;
    app_state
        .hub
        .emit_to_user(user_id, ServerEvent::NewNotification(notification.clone()));
    Ok(notification)
}

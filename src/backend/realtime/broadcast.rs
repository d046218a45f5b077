/**
 * Real-time Event Hub
 *
 * One `tokio::sync::broadcast` channel per user ("room"). Every open socket
 * of that user subscribes to the room, so an event emitted to a user reaches
 * all of their devices. Rooms are created lazily on first use and pruned by
 * the periodic cleanup task once nobody listens.
 *
 * Emitting to a room nobody listens to is a no-op.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::shared::ServerEvent;

/// Buffered events per room before slow receivers start lagging
pub const ROOM_CAPACITY: usize = 100;

/// Per-user broadcast rooms
#[derive(Clone, Default)]
pub struct RealtimeHub {
    rooms: Arc<Mutex<HashMap<Uuid, broadcast::Sender<ServerEvent>>>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<Uuid, broadcast::Sender<ServerEvent>>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.rooms.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get or create the sender for a user's room
    pub fn get_sender(&self, user_id: Uuid) -> broadcast::Sender<ServerEvent> {
        self.rooms()
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .clone()
    }

    /// Join a user's room
    pub fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<ServerEvent> {
        self.get_sender(user_id).subscribe()
    }

    /// Emit an event to one user
    ///
    /// # Returns
    ///
    /// Number of live connections that received the event (0 if none)
    pub fn emit_to_user(&self, user_id: Uuid, event: ServerEvent) -> usize {
        let sender = match self.rooms().get(&user_id) {
            Some(sender) => sender.clone(),
            None => return 0,
        };

        let name = event.name();
        match sender.send(event) {
            Ok(count) => {
                tracing::debug!("[Realtime] {} delivered to {} connection(s) of {}", name, count, user_id);
                count
            }
            Err(_) => {
                tracing::debug!("[Realtime] No listeners for {} in room {}", name, user_id);
                0
            }
        }
    }

    /// Emit the same event to several users
    pub fn emit_to_users(&self, user_ids: &[Uuid], event: &ServerEvent) -> usize {
        user_ids
            .iter()
            .map(|user_id| self.emit_to_user(*user_id, event.clone()))
            .sum()
    }

    /// Drop rooms without subscribers, returning how many were removed
    pub fn cleanup_inactive_rooms(&self) -> usize {
        let mut rooms = self.rooms();
        let before = rooms.len();
        rooms.retain(|_, sender| sender.receiver_count() > 0);
        before - rooms.len()
    }

    /// Live connections for a user
    pub fn subscriber_count(&self, user_id: Uuid) -> usize {
        self.rooms()
            .get(&user_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }
}

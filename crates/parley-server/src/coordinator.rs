//! The session coordinator: the single owner of directory and history
//! state, and the one place that decides who receives what.
//!
//! Every inbound event is validated, applied, and enqueued for delivery
//! under one mutex. The fan-out registry is synchronous and non-blocking,
//! so the lock is held across the enqueue; that makes delivery order for
//! every connection identical to the order mutations were applied in,
//! history appends included. Lock order is coordinator state first, then
//! the registry's own lock; the transport never takes them in reverse.
//!
//! Failure policy: handlers never propagate errors to the connection task.
//! Anything that goes wrong is logged, counted, and reported to the caller
//! as a negative acknowledgement.

use std::sync::Arc;

use metrics::{counter, gauge};
use parking_lot::Mutex;
use parley_core::errors::SessionError;
use parley_core::events::ServerEvent;
use parley_core::ids::{ConnectionId, MessageId};
use parley_core::types::ChatMessage;
use tracing::{error, info, warn};

use crate::directory::Directory;
use crate::history::HistoryStore;
use crate::metrics::{
    MESSAGES_TOTAL, RENAMES_TOTAL, REQUESTS_REJECTED_TOTAL, ROOM_JOINS_TOTAL, ROOM_LEAVES_TOTAL,
    WS_CONNECTIONS_ACTIVE,
};
use crate::websocket::fanout::FanoutRegistry;

struct CoordinatorState {
    directory: Directory,
    history: HistoryStore,
}

/// Serializes all session mutations and computes fan-out for every event.
///
/// Directory and history are owned exclusively by this type; nothing else
/// writes to them. All operations are in-memory and complete before the
/// handler returns its acknowledgement.
pub struct SessionCoordinator {
    state: Mutex<CoordinatorState>,
    fanout: Arc<FanoutRegistry>,
}

impl SessionCoordinator {
    /// Create a coordinator delivering through `fanout`, retaining at most
    /// `history_cap` messages.
    pub fn new(fanout: Arc<FanoutRegistry>, history_cap: usize) -> Self {
        Self {
            state: Mutex::new(CoordinatorState {
                directory: Directory::new(),
                history: HistoryStore::new(history_cap),
            }),
            fanout,
        }
    }

    /// A connection was established.
    ///
    /// Registers the user under a generated `User_<short>` name, sends the
    /// full user list and the unscoped history replay to the new
    /// connection, and announces the join to everyone else.
    pub fn handle_connect(&self, id: &ConnectionId) {
        let mut state = self.state.lock();
        let default_name = format!("User_{}", id.short());
        let user = match state.directory.register(id.clone(), default_name) {
            Ok(user) => user,
            Err(e) => {
                // The transport guarantees unique identities; refuse to
                // clobber the existing registration.
                error!(conn_id = %id, error = %e, "transport contract violation on connect");
                return;
            }
        };

        info!(conn_id = %id, username = %user.username, "user connected");
        gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

        let users = state.directory.list_users(None);
        self.fanout.send_to(id, &ServerEvent::UserList { users });
        self.fanout
            .broadcast_all(&ServerEvent::UserJoined(user), Some(id));
        for message in state.history.query(None) {
            self.fanout.send_to(id, &ServerEvent::Message(message));
        }
    }

    /// A connection went away.
    ///
    /// Unregisters the user (idempotent) and emits `userLeft` to their last
    /// room, or to everyone when they were unscoped.
    pub fn handle_disconnect(&self, id: &ConnectionId) {
        let mut state = self.state.lock();
        let Some(user) = state.directory.unregister(id) else {
            // Already gone; nothing to announce.
            return;
        };

        info!(conn_id = %id, username = %user.username, "user disconnected");
        gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);

        let event = ServerEvent::UserLeft { id: id.clone() };
        match user.room.as_deref() {
            Some(room) => self.fanout.broadcast_room(room, &event, Some(id)),
            None => self.fanout.broadcast_all(&event, Some(id)),
        }
    }

    /// Join a room, leaving the current one if any.
    ///
    /// Replays the room's history and presence list to the joiner and
    /// announces the join to the rest of the room. Returns the ack value.
    pub fn join_room(&self, id: &ConnectionId, room: &str) -> bool {
        match self.try_join_room(id, room) {
            Ok(()) => true,
            Err(e) => {
                warn!(conn_id = %id, room, error = %e, "joinRoom rejected");
                counter!(REQUESTS_REJECTED_TOTAL, "op" => "joinRoom").increment(1);
                false
            }
        }
    }

    fn try_join_room(&self, id: &ConnectionId, room: &str) -> Result<(), SessionError> {
        let room = room.trim();
        if room.is_empty() {
            return Err(SessionError::Validation("room name is empty".into()));
        }

        let mut state = self.state.lock();
        state.directory.set_room(id, Some(room.to_owned()))?;
        let user = state
            .directory
            .get(id)
            .cloned()
            .ok_or(SessionError::NotFound)?;

        // Rebinding replaces any previous room group membership.
        self.fanout.bind_room(id, room);
        counter!(ROOM_JOINS_TOTAL).increment(1);
        info!(conn_id = %id, room, "joined room");

        for message in state.history.query(Some(room)) {
            self.fanout.send_to(id, &ServerEvent::Message(message));
        }
        let users = state.directory.list_users(Some(room));
        self.fanout.send_to(id, &ServerEvent::UserList { users });
        self.fanout
            .broadcast_room(room, &ServerEvent::UserJoined(user), Some(id));
        Ok(())
    }

    /// Leave the current room, returning to the unscoped channel.
    ///
    /// No presence broadcast is emitted to former room-mates; `userLeft`
    /// only ever accompanies a disconnect. Returns the ack value.
    pub fn leave_room(&self, id: &ConnectionId) -> bool {
        let mut state = self.state.lock();
        let left = match state.directory.get(id) {
            Some(user) if user.room.is_some() => state.directory.set_room(id, None).is_ok(),
            _ => false,
        };
        if !left {
            counter!(REQUESTS_REJECTED_TOTAL, "op" => "leaveRoom").increment(1);
            return false;
        }

        self.fanout.clear_room(id);
        counter!(ROOM_LEAVES_TOTAL).increment(1);
        info!(conn_id = %id, "left room");
        true
    }

    /// Send a chat message scoped to the sender's current room.
    ///
    /// Room-scoped messages go to the whole room group including the
    /// sender; unscoped messages go to every connected user. Returns the
    /// ack value.
    pub fn send_message(&self, id: &ConnectionId, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            counter!(REQUESTS_REJECTED_TOTAL, "op" => "sendMessage").increment(1);
            return false;
        }

        let mut state = self.state.lock();
        let Some(user) = state.directory.get(id) else {
            // Raced a disconnect; non-fatal no-op.
            counter!(REQUESTS_REJECTED_TOTAL, "op" => "sendMessage").increment(1);
            return false;
        };
        let message = ChatMessage {
            id: MessageId::generate(),
            username: user.username.clone(),
            message: trimmed.to_owned(),
            timestamp: chrono::Utc::now(),
            room: user.room.clone(),
        };
        state.history.append(message.clone());
        counter!(MESSAGES_TOTAL).increment(1);

        // Enqueued under the same lock as the append, so every recipient
        // sees messages in retained-log order.
        let room = message.room.clone();
        let event = ServerEvent::Message(message);
        match room.as_deref() {
            Some(room) => self.fanout.broadcast_room(room, &event, None),
            None => self.fanout.broadcast_all(&event, None),
        }
        true
    }

    /// Change the caller's display name.
    ///
    /// Announces the rename to the caller's room (or to everyone when
    /// unscoped), excluding the caller. Returns the ack value.
    pub fn set_username(&self, id: &ConnectionId, name: &str) -> bool {
        let mut state = self.state.lock();
        let Some(user) = state.directory.get(id) else {
            counter!(RENAMES_TOTAL, "status" => "rejected").increment(1);
            return false;
        };
        let old_name = user.username.clone();
        let room = user.room.clone();
        if let Err(e) = state.directory.rename(id, name) {
            warn!(conn_id = %id, error = %e, "setUsername rejected");
            counter!(RENAMES_TOTAL, "status" => "rejected").increment(1);
            return false;
        }
        let new_name = name.trim();

        counter!(RENAMES_TOTAL, "status" => "ok").increment(1);
        info!(conn_id = %id, old = %old_name, new = %new_name, "user renamed");

        let event = ServerEvent::SystemMessage {
            message: format!("{old_name} is now known as {new_name}"),
        };
        match room.as_deref() {
            Some(room) => self.fanout.broadcast_room(room, &event, Some(id)),
            None => self.fanout.broadcast_all(&event, Some(id)),
        }
        true
    }

    /// Number of connected users, for the status endpoint.
    pub fn connected_users(&self) -> usize {
        self.state.lock().directory.len()
    }
}

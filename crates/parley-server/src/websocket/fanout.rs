//! Event fan-out to connected WebSocket clients.
//!
//! The registry owns every connection's outbound channel and the room-group
//! binding used to address a subset of connections. Delivery is best
//! effort: sends never block, and a client that keeps dropping frames is
//! forcibly removed.
//!
//! Every method here is synchronous. The coordinator calls into the
//! registry while holding its own state lock, so enqueue order across
//! connections is exactly the order in which handlers ran.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use metrics::counter;
use parking_lot::RwLock;
use parley_core::events::ServerEvent;
use parley_core::ids::ConnectionId;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::metrics::WS_BROADCAST_DROPS_TOTAL;

/// Maximum total lifetime frame drops before forcibly removing a slow client.
const MAX_TOTAL_DROPS: u64 = 100;

/// Outbound channel capacity per connection.
pub const OUTBOUND_CAPACITY: usize = 256;

/// A connected client's outbound half.
pub struct ClientConnection {
    /// Connection identity, unique per live connection.
    pub id: ConnectionId,
    tx: mpsc::Sender<Arc<String>>,
    room: parking_lot::Mutex<Option<String>>,
    drops: AtomicU64,
}

impl ClientConnection {
    /// Wrap an outbound sender for a new connection.
    pub fn new(id: ConnectionId, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            tx,
            room: parking_lot::Mutex::new(None),
            drops: AtomicU64::new(0),
        }
    }

    /// Queue a serialized frame without blocking. Returns `false` (and
    /// counts a drop) when the client's channel is full or closed.
    pub fn send(&self, frame: Arc<String>) -> bool {
        if self.tx.try_send(frame).is_ok() {
            true
        } else {
            let _ = self.drops.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Lifetime count of dropped frames.
    pub fn drop_count(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }

    /// Bind this connection to a room group.
    pub fn bind_room(&self, room: &str) {
        *self.room.lock() = Some(room.to_owned());
    }

    /// Remove this connection from its room group.
    pub fn clear_room(&self) {
        *self.room.lock() = None;
    }

    /// Current room group, if any.
    pub fn room(&self) -> Option<String> {
        self.room.lock().clone()
    }
}

/// Registry of live connections and their room groups.
///
/// The coordinator addresses all outbound events through this type: a
/// single connection, a named room group, or every connection.
pub struct FanoutRegistry {
    /// Connected clients indexed by connection ID.
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
    /// Atomic counter tracking total connections (avoids read-locking for count queries).
    active_count: AtomicUsize,
}

impl FanoutRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Add a connection.
    pub fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write();
        if conns.insert(connection.id.clone(), connection).is_none() {
            let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove a connection by ID.
    pub fn remove(&self, id: &ConnectionId) {
        let mut conns = self.connections.write();
        if conns.remove(id).is_some() {
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Bind a connection to a room group, replacing any previous binding.
    pub fn bind_room(&self, id: &ConnectionId, room: &str) {
        let conns = self.connections.read();
        if let Some(conn) = conns.get(id) {
            conn.bind_room(room);
        }
    }

    /// Clear a connection's room group binding.
    pub fn clear_room(&self, id: &ConnectionId) {
        let conns = self.connections.read();
        if let Some(conn) = conns.get(id) {
            conn.clear_room();
        }
    }

    /// Deliver an event to one connection.
    pub fn send_to(&self, id: &ConnectionId, event: &ServerEvent) {
        let Some(json) = serialize(event) else { return };
        let conns = self.connections.read();
        if let Some(conn) = conns.get(id)
            && !conn.send(json)
        {
            counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
            warn!(conn_id = %conn.id, drops = conn.drop_count(), "failed to send event to client (channel full)");
        }
    }

    /// Deliver an event to every member of a room group, optionally
    /// excluding one connection (usually the originator).
    pub fn broadcast_room(&self, room: &str, event: &ServerEvent, exclude: Option<&ConnectionId>) {
        self.broadcast_to(
            |c| c.room().as_deref() == Some(room) && Some(&c.id) != exclude,
            event,
            room,
        );
    }

    /// Deliver an event to every connection, optionally excluding one.
    pub fn broadcast_all(&self, event: &ServerEvent, exclude: Option<&ConnectionId>) {
        self.broadcast_to(|c| Some(&c.id) != exclude, event, "all");
    }

    /// Serialize once, fan out to matching clients, remove slow clients.
    fn broadcast_to(
        &self,
        filter: impl Fn(&ClientConnection) -> bool,
        event: &ServerEvent,
        label: &str,
    ) {
        let Some(json) = serialize(event) else { return };
        let mut to_remove = Vec::new();
        {
            let conns = self.connections.read();
            let mut recipients = 0u32;
            for conn in conns.values() {
                if filter(conn) {
                    recipients += 1;
                    if !conn.send(Arc::clone(&json)) {
                        counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                        let drops = conn.drop_count();
                        if drops >= MAX_TOTAL_DROPS {
                            warn!(conn_id = %conn.id, label, drops, "disconnecting slow client");
                            to_remove.push(conn.id.clone());
                        } else {
                            warn!(conn_id = %conn.id, label, total_drops = drops, "failed to send event to client (channel full)");
                        }
                    }
                }
            }
            debug!(label, recipients, "broadcast event");
        }
        if !to_remove.is_empty() {
            let mut conns = self.connections.write();
            for id in &to_remove {
                if conns.remove(id).is_some() {
                    let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Number of active connections.
    pub fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

impl Default for FanoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize(event: &ServerEvent) -> Option<Arc<String>> {
    match serde_json::to_string(event) {
        Ok(j) => Some(Arc::new(j)),
        Err(e) => {
            warn!(error = %e, "failed to serialize event");
            None
        }
    }
}

//! Branded identifier newtypes.
//!
//! Plain strings are easy to mix up across call sites; these newtypes keep
//! connection handles and message IDs apart at compile time while staying
//! transparent on the wire.

use std::fmt;
use std::sync::LazyLock;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use uuid::timestamp::Timestamp;
use uuid::timestamp::context::ContextV7;

// Shared v7 counter state; keeps IDs monotonic even within one millisecond.
// ContextV7 is not Sync, so the static goes behind a mutex.
static V7_CONTEXT: LazyLock<Mutex<ContextV7>> = LazyLock::new(|| Mutex::new(ContextV7::new()));

/// Opaque handle for a live client connection.
///
/// Assigned by the transport layer when the WebSocket upgrade completes and
/// valid until disconnect. The directory references connections by this ID
/// but never owns them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a fresh connection ID (UUID v7).
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First six characters, used to derive default display names
    /// (`User_<short>`).
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(6)
            .map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique message identifier.
///
/// UUID v7 drawn from a shared [`ContextV7`]: globally unique and strictly
/// ordered by creation time, so consumers can use it for identity and dedup
/// without a separate sequence number.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh message ID (UUID v7).
    pub fn generate() -> Self {
        Self(Uuid::new_v7(Timestamp::now(&*V7_CONTEXT.lock())).to_string())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_connection_ids_are_unique() {
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn short_is_six_chars() {
        let id = ConnectionId::from("abcdef123456");
        assert_eq!(id.short(), "abcdef");
    }

    #[test]
    fn short_handles_tiny_ids() {
        let id = ConnectionId::from("ab");
        assert_eq!(id.short(), "ab");
    }

    #[test]
    fn message_ids_order_by_creation() {
        // The shared context keeps IDs strictly increasing, even when many
        // land in the same millisecond.
        let ids: Vec<MessageId> = (0..64).map(|_| MessageId::generate()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn message_ids_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| (0..64).map(|_| MessageId::generate()).collect::<Vec<_>>())
            })
            .collect();
        let mut all: Vec<MessageId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    #[test]
    fn connection_id_serde_transparent() {
        let id = ConnectionId::from("conn-1");
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::json!("conn-1"));
        let back: ConnectionId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }
}

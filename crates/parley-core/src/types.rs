//! The data model: connected users and chat messages.
//!
//! Both types serialize camelCase to match the wire format the web client
//! already speaks. Optional `room` fields are left off the wire entirely
//! when absent (the unscoped default channel).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConnectionId, MessageId};

/// A currently-connected user.
///
/// Exactly one `User` exists per live connection; the directory owns all
/// of them. Created on connect with a generated default display name,
/// mutated by rename and room changes, destroyed on disconnect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Connection this user is bound to.
    pub id: ConnectionId,
    /// Display name, unique among connected users (case-sensitive).
    pub username: String,
    /// Current room, or `None` for the unscoped default channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
}

/// A sent chat message. Immutable once created.
///
/// The author's display name is captured at send time; a later rename
/// does not rewrite history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Unique, creation-ordered ID.
    pub id: MessageId,
    /// Author display name at send time.
    pub username: String,
    /// Message body.
    pub message: String,
    /// When the message was sent.
    pub timestamp: DateTime<Utc>,
    /// Room scope, or `None` for the unscoped default channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap()
    }

    #[test]
    fn user_serializes_camel_case() {
        let user = User {
            id: ConnectionId::from("conn-1"),
            username: "Alice".into(),
            room: None,
            connected_at: ts(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], "conn-1");
        assert_eq!(json["username"], "Alice");
        assert!(json.get("room").is_none());
        assert!(json.get("connectedAt").is_some());
    }

    #[test]
    fn user_room_present_when_set() {
        let user = User {
            id: ConnectionId::from("conn-1"),
            username: "Alice".into(),
            room: Some("lobby".into()),
            connected_at: ts(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["room"], "lobby");
    }

    #[test]
    fn message_roundtrip() {
        let msg = ChatMessage {
            id: MessageId::generate(),
            username: "Bob".into(),
            message: "hi".into(),
            timestamp: ts(),
            room: Some("lobby".into()),
        };
        let json = serde_json::to_value(&msg).unwrap();
        let back: ChatMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}

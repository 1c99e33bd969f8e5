//! The wire protocol: closed sets of tagged event frames.
//!
//! Two event families:
//!
//! - **[`ClientEvent`]**: Requests from a client (join/leave room, send
//!   message, set username). Each carries a client-chosen `seq` that the
//!   server echoes back in exactly one [`ServerEvent::Ack`].
//! - **[`ServerEvent`]**: Frames the coordinator fans out to clients
//!   (messages, presence changes, user lists) plus the per-request ack.
//!
//! Connection lifecycle (connect/disconnect) is not a frame; it is carried
//! by the WebSocket itself.

use serde::{Deserialize, Serialize};

use crate::ids::ConnectionId;
use crate::types::{ChatMessage, User};

/// Requests from a connected client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Join a room, leaving the current one if any.
    #[serde(rename = "joinRoom")]
    JoinRoom {
        /// Target room name.
        room: String,
        /// Acknowledgement correlator, echoed in the `Ack` reply.
        seq: u64,
    },

    /// Leave the current room, returning to the unscoped channel.
    #[serde(rename = "leaveRoom")]
    LeaveRoom {
        /// Acknowledgement correlator.
        seq: u64,
    },

    /// Send a message to the current room, or to everyone when unscoped.
    #[serde(rename = "sendMessage")]
    SendMessage {
        /// Message body.
        message: String,
        /// Acknowledgement correlator.
        seq: u64,
    },

    /// Change display name.
    #[serde(rename = "setUsername")]
    SetUsername {
        /// Requested display name.
        username: String,
        /// Acknowledgement correlator.
        seq: u64,
    },
}

impl ClientEvent {
    /// The acknowledgement correlator carried by every request.
    pub fn seq(&self) -> u64 {
        match self {
            Self::JoinRoom { seq, .. }
            | Self::LeaveRoom { seq }
            | Self::SendMessage { seq, .. }
            | Self::SetUsername { seq, .. } => *seq,
        }
    }
}

/// Frames delivered from the server to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A chat message (live or history replay).
    #[serde(rename = "message")]
    Message(ChatMessage),

    /// An informational notice (e.g. rename announcements).
    #[serde(rename = "systemMessage")]
    SystemMessage {
        /// Notice text.
        message: String,
    },

    /// A user connected or entered the recipient's room.
    #[serde(rename = "userJoined")]
    UserJoined(User),

    /// A user disconnected.
    #[serde(rename = "userLeft")]
    UserLeft {
        /// Connection that went away.
        id: ConnectionId,
    },

    /// Presence snapshot for the recipient's scope.
    #[serde(rename = "userList")]
    UserList {
        /// Connected users in scope.
        users: Vec<User>,
    },

    /// Per-request acknowledgement. Exactly one per [`ClientEvent`].
    #[serde(rename = "ack")]
    Ack {
        /// Correlator copied from the request.
        seq: u64,
        /// Whether the request was satisfied.
        success: bool,
    },
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::ids::MessageId;

    #[test]
    fn client_event_tags() {
        let event: ClientEvent =
            serde_json::from_value(json!({"type": "joinRoom", "room": "lobby", "seq": 3})).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                room: "lobby".into(),
                seq: 3
            }
        );

        let event: ClientEvent =
            serde_json::from_value(json!({"type": "leaveRoom", "seq": 4})).unwrap();
        assert_eq!(event, ClientEvent::LeaveRoom { seq: 4 });

        let event: ClientEvent =
            serde_json::from_value(json!({"type": "sendMessage", "message": "hi", "seq": 5}))
                .unwrap();
        assert_eq!(
            event,
            ClientEvent::SendMessage {
                message: "hi".into(),
                seq: 5
            }
        );

        let event: ClientEvent =
            serde_json::from_value(json!({"type": "setUsername", "username": "Alice", "seq": 6}))
                .unwrap();
        assert_eq!(
            event,
            ClientEvent::SetUsername {
                username: "Alice".into(),
                seq: 6
            }
        );
    }

    #[test]
    fn seq_accessor_covers_all_variants() {
        assert_eq!(
            ClientEvent::JoinRoom {
                room: "r".into(),
                seq: 1
            }
            .seq(),
            1
        );
        assert_eq!(ClientEvent::LeaveRoom { seq: 2 }.seq(), 2);
        assert_eq!(
            ClientEvent::SendMessage {
                message: "m".into(),
                seq: 3
            }
            .seq(),
            3
        );
        assert_eq!(
            ClientEvent::SetUsername {
                username: "u".into(),
                seq: 4
            }
            .seq(),
            4
        );
    }

    #[test]
    fn server_message_wire_shape() {
        let event = ServerEvent::Message(ChatMessage {
            id: MessageId::generate(),
            username: "Alice".into(),
            message: "hello".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap(),
            room: None,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["username"], "Alice");
        assert_eq!(json["message"], "hello");
        assert!(json.get("room").is_none());
    }

    #[test]
    fn server_event_tags() {
        let json = serde_json::to_value(ServerEvent::SystemMessage {
            message: "x is now known as y".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "systemMessage");

        let json = serde_json::to_value(ServerEvent::UserLeft {
            id: "conn-9".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "userLeft");
        assert_eq!(json["id"], "conn-9");

        let json = serde_json::to_value(ServerEvent::UserList { users: vec![] }).unwrap();
        assert_eq!(json["type"], "userList");
        assert_eq!(json["users"], json!([]));

        let json = serde_json::to_value(ServerEvent::Ack {
            seq: 7,
            success: true,
        })
        .unwrap();
        assert_eq!(json["type"], "ack");
        assert_eq!(json["seq"], 7);
        assert_eq!(json["success"], true);
    }

    #[test]
    fn unknown_client_event_is_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_value(json!({"type": "selfDestruct", "seq": 1}));
        assert!(result.is_err());
    }
}

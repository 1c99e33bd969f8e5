//! Error hierarchy for the session engine.
//!
//! Errors never cross the coordinator boundary as faults: each handler
//! converts them into a negative acknowledgement for the originating
//! request. The variants here exist so that the conversion site can log
//! and count the right thing.

use crate::ids::ConnectionId;

/// Errors from directory operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// An identity was registered twice. The transport layer guarantees
    /// unique identities, so this indicates a contract violation upstream.
    #[error("connection {id} is already registered")]
    AlreadyRegistered {
        /// The duplicated connection.
        id: ConnectionId,
    },

    /// The identity is not (or no longer) registered. Usually a benign
    /// race with disconnect.
    #[error("connection {id} is not registered")]
    NotFound {
        /// The missing connection.
        id: ConnectionId,
    },

    /// The requested display name is held by a different connected user.
    #[error("username {username:?} is already taken")]
    NameConflict {
        /// The contested name.
        username: String,
    },

    /// The requested display name failed validation.
    #[error("invalid username: {reason}")]
    InvalidName {
        /// What was wrong with it.
        reason: String,
    },
}

/// Errors from session coordinator handlers.
///
/// All of these surface to the caller only as `ack(false)`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    /// Empty or too-short input (room name, message text, username).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Rename target already in use by another connected user.
    #[error("name conflict")]
    NameConflict,

    /// The connection is no longer in the directory (raced a disconnect).
    #[error("connection not found")]
    NotFound,

    /// `leaveRoom` from a user who has no room.
    #[error("not in a room")]
    NoRoom,

    /// Unexpected failure during mutation; logged at the boundary.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DirectoryError> for SessionError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NameConflict { .. } => Self::NameConflict,
            DirectoryError::NotFound { .. } => Self::NotFound,
            DirectoryError::InvalidName { reason } => Self::Validation(reason),
            DirectoryError::AlreadyRegistered { .. } => Self::Internal(err.to_string()),
        }
    }
}

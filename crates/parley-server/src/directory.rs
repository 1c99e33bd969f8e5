//! The connection directory: identity → user mapping and display-name
//! uniqueness.
//!
//! A leaf component with no dependencies on the rest of the server. All
//! access happens under the coordinator's lock, so the directory itself is
//! plain single-threaded state.

use std::collections::HashMap;

use parley_core::errors::DirectoryError;
use parley_core::ids::ConnectionId;
use parley_core::types::User;

/// Minimum display name length after trimming.
pub const MIN_USERNAME_LEN: usize = 2;

/// Authoritative mapping from connection identity to user record.
///
/// Invariants held here:
/// - display names are unique among connected users (case-sensitive);
/// - a user has at most one room at a time;
/// - exactly one user per registered connection.
#[derive(Debug, Default)]
pub struct Directory {
    users: HashMap<ConnectionId, User>,
    // Registration order, so list_users is deterministic.
    order: Vec<ConnectionId>,
}

impl Directory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection with a default display name and no room.
    ///
    /// The transport layer guarantees unique identities; a duplicate here is
    /// a contract violation and returns [`DirectoryError::AlreadyRegistered`].
    pub fn register(
        &mut self,
        id: ConnectionId,
        default_name: String,
    ) -> Result<User, DirectoryError> {
        if self.users.contains_key(&id) {
            return Err(DirectoryError::AlreadyRegistered { id });
        }
        let user = User {
            id: id.clone(),
            username: default_name,
            room: None,
            connected_at: chrono::Utc::now(),
        };
        let _ = self.users.insert(id.clone(), user.clone());
        self.order.push(id);
        Ok(user)
    }

    /// Remove a connection. Idempotent: returns `None` if already absent.
    pub fn unregister(&mut self, id: &ConnectionId) -> Option<User> {
        let user = self.users.remove(id)?;
        self.order.retain(|o| o != id);
        Some(user)
    }

    /// Change a user's display name.
    ///
    /// Rejects names that are empty or shorter than [`MIN_USERNAME_LEN`]
    /// after trimming, and names held by a *different* connected user
    /// (exact, case-sensitive match).
    pub fn rename(&mut self, id: &ConnectionId, new_name: &str) -> Result<(), DirectoryError> {
        let trimmed = new_name.trim();
        if trimmed.len() < MIN_USERNAME_LEN {
            return Err(DirectoryError::InvalidName {
                reason: format!("username must be at least {MIN_USERNAME_LEN} characters"),
            });
        }
        if self.is_name_taken(trimmed, id) {
            return Err(DirectoryError::NameConflict {
                username: trimmed.to_owned(),
            });
        }
        let user = self
            .users
            .get_mut(id)
            .ok_or_else(|| DirectoryError::NotFound { id: id.clone() })?;
        user.username = trimmed.to_owned();
        Ok(())
    }

    /// Set or clear a user's room.
    ///
    /// No format validation beyond non-empty-or-absent; rooms have no
    /// stored entity of their own.
    pub fn set_room(
        &mut self,
        id: &ConnectionId,
        room: Option<String>,
    ) -> Result<(), DirectoryError> {
        let user = self
            .users
            .get_mut(id)
            .ok_or_else(|| DirectoryError::NotFound { id: id.clone() })?;
        user.room = room.filter(|r| !r.is_empty());
        Ok(())
    }

    /// Look up a user by connection.
    pub fn get(&self, id: &ConnectionId) -> Option<&User> {
        self.users.get(id)
    }

    /// Users in scope: everyone when `room` is `None`, else only users
    /// whose room matches. Registration order.
    pub fn list_users(&self, room: Option<&str>) -> Vec<User> {
        self.order
            .iter()
            .filter_map(|id| self.users.get(id))
            .filter(|u| match room {
                None => true,
                Some(r) => u.room.as_deref() == Some(r),
            })
            .cloned()
            .collect()
    }

    /// Whether `name` is held by any connected user other than `excluding`.
    pub fn is_name_taken(&self, name: &str, excluding: &ConnectionId) -> bool {
        self.users
            .values()
            .any(|u| u.username == name && &u.id != excluding)
    }

    /// Number of connected users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no users are connected.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

//! # parley-core
//!
//! Foundation types for the parley chat server.
//!
//! This crate provides the shared vocabulary the server crate depends on:
//!
//! - **Branded IDs**: [`ids::ConnectionId`], [`ids::MessageId`] as newtypes
//! - **Data model**: [`types::User`], [`types::ChatMessage`]
//! - **Wire events**: [`events::ClientEvent`], [`events::ServerEvent`], the
//!   closed set of protocol frames exchanged over WebSocket
//! - **Errors**: [`errors::DirectoryError`], [`errors::SessionError`] via `thiserror`
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `parley-server`. No I/O.

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod ids;
pub mod types;

//! WebSocket connection management and event fan-out.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `connection` | WebSocket upgrade, per-connection read/write loops |
//! | `fanout` | Connection registry, room groups, addressed delivery |
//!
//! ## Data Flow
//!
//! `connection` parses client frames and dispatches to the coordinator;
//! the coordinator addresses outbound events through `fanout`, which owns
//! every connection's outbound channel.

pub mod connection;
pub mod fanout;

//! # parley-server
//!
//! Axum HTTP + WebSocket server for the parley chat engine.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `directory` | Identity → user mapping, unique display names |
//! | `history` | Bounded append-only message log, queryable by room |
//! | `coordinator` | Session state machine: validate, mutate, compute fan-out |
//! | `websocket` | Connection registry, room groups, per-connection loops |
//! | `routes` | HTTP router: `/ws`, `/api/health`, `/api/status`, `/metrics` |
//! | `metrics` | Prometheus recorder and metric name constants |
//! | `config` | Binary CLI arguments |
//!
//! ## Data Flow
//!
//! `websocket::connection` parses inbound frames → `coordinator` (validate +
//! mutate directory/history + decide recipients) → `websocket::fanout`
//! delivers to the addressed connections.

#![deny(unsafe_code)]

pub mod config;
pub mod coordinator;
pub mod directory;
pub mod history;
pub mod metrics;
pub mod routes;
pub mod websocket;

//! Infrastructure layer for ras-relay.
//!
//! Handles all I/O: the TCP accept loop, the WebSocket handshake, the
//! transport adapters the session pumps run over, and reading the config file.
//!
//! # What does NOT belong here?
//!
//! - Pump logic or the processor seam (that is the application layer)
//! - Frame and config type definitions (that is the domain layer)

pub mod config_file;
pub mod transport;
pub mod ws_server;

pub use ws_server::{run_server, serve};

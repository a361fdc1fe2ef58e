//! ras-relay library crate.
//!
//! Relays RAS protocol messages between a browser client connected over
//! WebSocket and a message processor running inside this process.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser (binary RAS frames over WebSocket)
//!         ↕
//! [ras-relay]
//!   ├── domain/           Pure types: RelayConfig, Frame, SessionId, errors
//!   ├── application/      Session pumps, SessionBoundary, Processor seam
//!   └── infrastructure/
//!         ├── transport/  WebSocket and mock FrameReader/FrameWriter adapters
//!         ├── ws_server/  Accept loop + handshake (tokio-tungstenite)
//!         └── config_file/ TOML config loading
//!         ↕
//! Processor (EchoProcessor or your own)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `ras-core`, and talks to transports
//!   only through the [`application::FrameReader`] / [`application::FrameWriter`]
//!   traits.
//! - `infrastructure` depends on all other layers plus `tokio-tungstenite`.

/// Domain layer: pure configuration, frame and error types (no I/O).
pub mod domain;

/// Application layer: session pumps and the processor seam.
pub mod application;

/// Infrastructure layer: WebSocket server, transport adapters, config files.
pub mod infrastructure;

//! Domain layer for ras-relay.
//!
//! Pure types with no dependencies on I/O, networking, or the async runtime.
//!
//! # What belongs in the domain layer?
//!
//! - Relay and session configuration structures
//! - Transport frame types (kind + payload)
//! - Session identity types
//! - Error types that describe why a pump stopped
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or `WebSocket` types
//! - File I/O or environment variable reading

pub mod config;
pub mod errors;
pub mod frame;
pub mod session_id;

pub use config::{ConfigError, RelayConfig, SessionConfig};
pub use errors::{RelayError, TransportError};
pub use frame::{Frame, FrameKind};
pub use session_id::SessionId;

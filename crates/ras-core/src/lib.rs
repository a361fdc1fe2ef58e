//! # ras-core
//!
//! Shared library for the RAS remote-access relay containing the wire
//! protocol: message types, the static message registry and the frame codec.
//!
//! It has no dependencies on sockets, async runtimes or the WebSocket stack,
//! so the same code serves the relay and any native peer.
//!
//! # Architecture overview
//!
//! The relay sits between a browser and a remote-desktop backend.  Each
//! WebSocket frame carries exactly one message:
//!
//! ```text
//! [msg_type: u16 big-endian][body: variant-specific, self-delimiting]
//! ```
//!
//! - **`protocol::messages`** – the closed set of message variants and the
//!   direction rules ([`Role`]) that decide who may send what.
//! - **`protocol::registry`** – a static table per role mapping a type
//!   identifier to the decoder for that variant's body.
//! - **`protocol::codec`** – `encode_message` / `decode_message`, the only
//!   entry points that touch bytes.

pub mod protocol;

pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{Message, MessageType, Role};

//! Application layer for ras-relay.
//!
//! Knows *what* a session does and delegates *how* bytes move to whatever
//! transport adapter the infrastructure layer plugs in.
//!
//! # Responsibilities
//!
//! - Defining the transport ports ([`FrameReader`], [`FrameWriter`])
//! - Running the inbound and outbound pumps of a [`Session`]
//! - Handing the processor its [`SessionBoundary`]
//! - Defining the [`Processor`] seam and the bundled [`EchoProcessor`]
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or performing the WebSocket handshake
//! - Tokio-tungstenite types of any kind

pub mod boundary;
pub mod processor;
pub mod session;
pub mod transport;

pub use boundary::{ReceiveHandle, SendHandle, SessionBoundary, SessionClosed};
pub use processor::{EchoProcessor, Processor, ProcessorError};
#[cfg(test)]
pub use processor::MockProcessor;
pub use session::{decode_frame, Session, SessionTasks};
pub use transport::{FrameReader, FrameWriter};

//! Transport ports.
//!
//! A session needs four things from a transport: read the next frame, write a
//! frame, send a close control frame within a deadline, and close.  The two
//! halves are separate values so each pump can own one, but they share their
//! close state: once either side closes, reads on the other side fail.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Frame, TransportError};

/// The read half of a transport.
#[async_trait]
pub trait FrameReader: Send + 'static {
    /// Waits for the next complete data frame.
    ///
    /// Control traffic (pings, pongs) is handled inside the adapter.  Once the
    /// transport is closed from either side this returns an error, and keeps
    /// returning one.
    async fn next_frame(&mut self) -> Result<Frame, TransportError>;
}

/// The write half of a transport.
#[async_trait]
pub trait FrameWriter: Send + 'static {
    /// Writes one binary frame.  The frame is complete on the wire when this
    /// returns `Ok`.
    async fn write_frame(&mut self, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Sends a close control frame with an empty payload, giving up after
    /// `deadline`.
    async fn send_close(&mut self, deadline: Duration) -> Result<(), TransportError>;

    /// Closes the transport.  Idempotent; never fails.
    async fn close(&mut self);
}

//! The session boundary handed to a processor.
//!
//! Exactly two handles: a [`ReceiveHandle`] the processor reads decoded
//! messages from, and a [`SendHandle`] it pushes outgoing messages into.  They
//! are different types so the direction of each queue is checked at compile
//! time, and neither is `Clone`, so the processor is the only party holding
//! them.
//!
//! The processor must keep reading the receive handle, and must eventually
//! close (or drop) the send handle; that is what ends the session.

use ras_core::Message;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::SessionId;

/// Returned by [`SendHandle::send`] when the outbound pump is gone.  Carries
/// the message that could not be queued.
#[derive(Debug, Error)]
#[error("session outbound queue is closed")]
pub struct SessionClosed(pub Message);

/// Read-only end of the queue filled by the inbound pump.
#[derive(Debug)]
pub struct ReceiveHandle {
    rx: mpsc::Receiver<Message>,
}

impl ReceiveHandle {
    pub(crate) fn new(rx: mpsc::Receiver<Message>) -> Self {
        Self { rx }
    }

    /// Waits for the next message from the peer.
    ///
    /// Returns `None` once the inbound pump has stopped and every queued
    /// message has been delivered.  After that it always returns `None`.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}

/// Write-only end of the queue drained by the outbound pump.
#[derive(Debug)]
pub struct SendHandle {
    tx: mpsc::Sender<Message>,
}

impl SendHandle {
    pub(crate) fn new(tx: mpsc::Sender<Message>) -> Self {
        Self { tx }
    }

    /// Queues a message for the peer, waiting while the queue is full.
    ///
    /// After a write failure the outbound pump keeps accepting (and
    /// discarding) messages until this handle is closed, so a processor that
    /// keeps sending is never blocked by a dead link.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] only if the outbound pump task itself is gone.
    pub async fn send(&self, msg: Message) -> Result<(), SessionClosed> {
        self.tx.send(msg).await.map_err(|e| SessionClosed(e.0))
    }

    /// Closes the send queue.  Messages already queued are still written,
    /// then the outbound pump sends a close frame and closes the transport.
    pub fn close(self) {
        drop(self);
    }
}

/// The pair of handles a processor works with, plus the session's identity.
#[derive(Debug)]
pub struct SessionBoundary {
    id: SessionId,
    receive: ReceiveHandle,
    send: SendHandle,
}

impl SessionBoundary {
    pub(crate) fn new(id: SessionId, receive: ReceiveHandle, send: SendHandle) -> Self {
        Self { id, receive, send }
    }

    /// The identifier of the session these handles belong to.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Splits the boundary into its two handles.
    pub fn into_parts(self) -> (ReceiveHandle, SendHandle) {
        (self.receive, self.send)
    }
}

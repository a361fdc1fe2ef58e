//! Sessions: the two pumps that connect one transport to one processor.
//!
//! ```text
//!                 ┌──────────── inbound pump ────────────┐
//!  FrameReader ──►│ next_frame → kind check → decode     │──► ReceiveHandle
//!                 └──────────────────────────────────────┘
//!                 ┌──────────── outbound pump ───────────┐
//!  FrameWriter ◄──│ write_frame ← encode                 │◄── SendHandle
//!                 └──────────────────────────────────────┘
//! ```
//!
//! Each pump runs in its own Tokio task and owns one half of the transport.
//! They share no state beyond the two bounded queues and the transport's close
//! signal, and shutdown cascades through those:
//!
//! - Transport read failure (including a normal close), a non-binary frame or
//!   an undecodable message stops the inbound pump, which drops its end of the
//!   receive queue.  That is the only place the receive queue is closed.
//! - The processor closing its send handle makes the outbound pump send a
//!   close frame (bounded by the configured deadline), close the transport and
//!   exit.
//! - A write or encode failure makes the outbound pump close the transport at
//!   once, then keep taking and discarding messages until the processor closes
//!   its send handle, so a processor that keeps sending never blocks.
//!
//! Nothing is retried and no timeout applies other than the close deadline.

use std::time::Duration;

use ras_core::{decode_message, encode_message, Message, Role};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::application::boundary::{ReceiveHandle, SendHandle, SessionBoundary};
use crate::application::transport::{FrameReader, FrameWriter};
use crate::domain::{Frame, RelayError, SessionConfig, SessionId};

/// Entry point for starting sessions.
pub struct Session;

impl Session {
    /// Starts the inbound and outbound pumps for one transport.
    ///
    /// Consumes both transport halves, so a transport can only ever have one
    /// pump of each kind.  Must be called from within a Tokio runtime.
    ///
    /// Returns the boundary to hand to a processor and a handle for waiting
    /// on the pumps.
    pub fn start<R, W>(reader: R, writer: W, config: &SessionConfig) -> (SessionBoundary, SessionTasks)
    where
        R: FrameReader,
        W: FrameWriter,
    {
        let id = SessionId::new();
        // `mpsc::channel` panics on zero; validated configs never get here with it.
        let capacity = config.queue_capacity.max(1);

        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);

        let inbound = tokio::spawn(run_inbound(id, config.role, reader, inbound_tx));
        let outbound = tokio::spawn(run_outbound(
            id,
            config.role,
            writer,
            outbound_rx,
            config.close_deadline(),
        ));

        debug!(
            "session {id}: pumps started (role={:?}, queue_capacity={capacity})",
            config.role
        );

        let boundary = SessionBoundary::new(
            id,
            ReceiveHandle::new(inbound_rx),
            SendHandle::new(outbound_tx),
        );
        (boundary, SessionTasks { id, inbound, outbound })
    }
}

/// Join handles for the two pump tasks of a session.
#[derive(Debug)]
pub struct SessionTasks {
    id: SessionId,
    inbound: JoinHandle<()>,
    outbound: JoinHandle<()>,
}

impl SessionTasks {
    /// The identifier of the session these tasks serve.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns `true` once both pumps have exited.
    pub fn is_finished(&self) -> bool {
        self.inbound.is_finished() && self.outbound.is_finished()
    }

    /// Waits for both pumps to exit.
    ///
    /// The inbound pump exits once the transport is closed; the outbound pump
    /// exits once the processor has closed its send handle.
    pub async fn join(self) {
        let id = self.id;
        for (name, task) in [("inbound", self.inbound), ("outbound", self.outbound)] {
            if let Err(e) = task.await {
                warn!("session {id}: {name} pump task ended abnormally: {e}");
            }
        }
    }
}

/// Turns one transport frame into a message as received by `role`.
///
/// # Errors
///
/// - [`RelayError::UnexpectedFrameKind`] for any non-binary frame, whatever
///   its payload.
/// - [`RelayError::Protocol`] if the codec rejects the payload.
pub fn decode_frame(role: Role, frame: &Frame) -> Result<Message, RelayError> {
    if !frame.is_binary() {
        return Err(RelayError::UnexpectedFrameKind(frame.kind));
    }
    Ok(decode_message(role, &frame.payload)?)
}

// ── Inbound pump ──────────────────────────────────────────────────────────────

async fn run_inbound<R: FrameReader>(
    id: SessionId,
    role: Role,
    mut reader: R,
    tx: mpsc::Sender<Message>,
) {
    let mut delivered: u64 = 0;
    loop {
        let msg = match read_message(role, &mut reader).await {
            Ok(msg) => msg,
            Err(e) if e.is_normal_close() => {
                debug!("session {id}: inbound pump stopped after {delivered} message(s): {e}");
                break;
            }
            Err(e) => {
                warn!("session {id}: inbound pump stopped after {delivered} message(s): {e}");
                break;
            }
        };

        trace!("session {id}: received {:?}", msg.message_type());

        // Blocks while the processor is behind; that is the backpressure.
        if tx.send(msg).await.is_err() {
            debug!("session {id}: receive handle dropped; nobody left to deliver to");
            break;
        }
        delivered += 1;
    }
    // Dropping the only sender closes the receive queue exactly once.
    drop(tx);
}

async fn read_message<R: FrameReader>(role: Role, reader: &mut R) -> Result<Message, RelayError> {
    let frame = reader
        .next_frame()
        .await
        .map_err(RelayError::TransportReadFailure)?;
    decode_frame(role, &frame)
}

// ── Outbound pump ─────────────────────────────────────────────────────────────

async fn run_outbound<W: FrameWriter>(
    id: SessionId,
    role: Role,
    mut writer: W,
    mut rx: mpsc::Receiver<Message>,
    close_deadline: Duration,
) {
    let mut written: u64 = 0;
    while let Some(msg) = rx.recv().await {
        if let Err(e) = write_message(role, &mut writer, &msg).await {
            warn!("session {id}: outbound pump stopped after {written} message(s): {e}");
            writer.close().await;
            let discarded = drain(&mut rx).await;
            debug!("session {id}: discarded {discarded} message(s) queued after the failure");
            return;
        }
        trace!("session {id}: sent {:?}", msg.message_type());
        written += 1;
    }

    debug!("session {id}: send queue closed after {written} message(s); closing transport");
    if let Err(e) = writer.send_close(close_deadline).await {
        debug!("session {id}: close frame not delivered: {e}");
    }
    writer.close().await;
}

async fn write_message<W: FrameWriter>(
    role: Role,
    writer: &mut W,
    msg: &Message,
) -> Result<(), RelayError> {
    let payload = encode_message(role, msg)?;
    writer
        .write_frame(payload)
        .await
        .map_err(RelayError::TransportWriteFailure)
}

/// Takes and discards messages until the processor closes its send handle.
async fn drain(rx: &mut mpsc::Receiver<Message>) -> usize {
    let mut discarded = 0;
    while rx.recv().await.is_some() {
        discarded += 1;
    }
    discarded
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! In-memory transport for tests.
//!
//! [`mock_transport`] returns a reader and writer to hand to
//! [`Session::start`](crate::application::Session::start), plus a
//! [`MockPeer`] that plays the remote end: it feeds frames to the reader,
//! records what the writer puts on the "wire", and can make writes fail.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use async_trait::async_trait;
use ras_core::{encode_message, Message, Role};
use tokio::sync::{mpsc, watch};

use super::closed_signal;
use crate::application::transport::{FrameReader, FrameWriter};
use crate::domain::{Frame, TransportError};

/// Something the writer put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    /// A binary data frame.
    Frame(Vec<u8>),
    /// A close control frame.
    CloseFrame,
}

type FrameResult = Result<Frame, TransportError>;

#[derive(Default)]
struct Shared {
    events: Mutex<Vec<WireEvent>>,
    fail_writes_after: Mutex<Option<usize>>,
    stall_close: Mutex<bool>,
    write_attempts: AtomicUsize,
    close_calls: AtomicUsize,
}

/// Creates a connected mock reader, writer and peer.
pub fn mock_transport() -> (MockFrameReader, MockFrameWriter, MockPeer) {
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();
    let (closed_tx, closed_rx) = watch::channel(false);
    let shared = Arc::new(Shared::default());

    let reader = MockFrameReader {
        frames: frame_rx,
        closed: closed_rx.clone(),
    };
    let writer = MockFrameWriter {
        shared: Arc::clone(&shared),
        closed: closed_tx,
    };
    let peer = MockPeer {
        frames: Mutex::new(Some(frame_tx)),
        shared,
        closed: closed_rx,
    };
    (reader, writer, peer)
}

/// Read half of the mock transport.
pub struct MockFrameReader {
    frames: mpsc::UnboundedReceiver<FrameResult>,
    closed: watch::Receiver<bool>,
}

#[async_trait]
impl FrameReader for MockFrameReader {
    async fn next_frame(&mut self) -> Result<Frame, TransportError> {
        tokio::select! {
            biased;
            _ = closed_signal(&mut self.closed) => Err(TransportError::Closed),
            next = self.frames.recv() => match next {
                Some(result) => result,
                None => Err(TransportError::PeerClosed {
                    code: None,
                    reason: "peer hung up".to_string(),
                }),
            },
        }
    }
}

/// Write half of the mock transport.
pub struct MockFrameWriter {
    shared: Arc<Shared>,
    closed: watch::Sender<bool>,
}

impl MockFrameWriter {
    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

#[async_trait]
impl FrameWriter for MockFrameWriter {
    async fn write_frame(&mut self, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let attempt = self.shared.write_attempts.fetch_add(1, Ordering::SeqCst);
        let limit = *self.shared.fail_writes_after.lock().expect("lock poisoned");
        if limit.is_some_and(|n| attempt >= n) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "injected write failure",
            )));
        }
        self.shared
            .events
            .lock()
            .expect("lock poisoned")
            .push(WireEvent::Frame(payload));
        Ok(())
    }

    async fn send_close(&mut self, deadline: Duration) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let stalled = *self.shared.stall_close.lock().expect("lock poisoned");
        if stalled {
            tokio::time::sleep(deadline).await;
            return Err(TransportError::Timeout(deadline));
        }
        self.shared
            .events
            .lock()
            .expect("lock poisoned")
            .push(WireEvent::CloseFrame);
        Ok(())
    }

    async fn close(&mut self) {
        self.shared.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.send_replace(true);
    }
}

/// The remote end of a mock transport.
pub struct MockPeer {
    frames: Mutex<Option<mpsc::UnboundedSender<FrameResult>>>,
    shared: Arc<Shared>,
    closed: watch::Receiver<bool>,
}

impl MockPeer {
    fn feed(&self, item: FrameResult) {
        let guard = self.frames.lock().expect("lock poisoned");
        if let Some(tx) = guard.as_ref() {
            // The reader may already be gone; tests only care about what it saw.
            let _ = tx.send(item);
        }
    }

    /// Queues a raw frame for the reader.
    pub fn push_frame(&self, frame: Frame) {
        self.feed(Ok(frame));
    }

    /// Encodes `msg` as sent by `sender` and queues it as a binary frame.
    ///
    /// # Panics
    ///
    /// Panics if `sender` may not send `msg`.
    pub fn push_message(&self, sender: Role, msg: &Message) {
        let payload = encode_message(sender, msg).expect("peer message must be encodable");
        self.push_frame(Frame::binary(payload));
    }

    /// Makes the reader's next read fail with `err`.
    pub fn push_error(&self, err: TransportError) {
        self.feed(Err(err));
    }

    /// Ends the peer's stream; once queued frames are read the reader reports
    /// `PeerClosed`.
    pub fn hang_up(&self) {
        self.frames.lock().expect("lock poisoned").take();
    }

    /// Makes every write attempt from the `n`th (zero-based) onwards fail.
    pub fn fail_writes_after(&self, n: usize) {
        *self.shared.fail_writes_after.lock().expect("lock poisoned") = Some(n);
    }

    /// Makes `send_close` run into its deadline instead of succeeding.
    pub fn stall_close(&self) {
        *self.shared.stall_close.lock().expect("lock poisoned") = true;
    }

    /// Everything written so far, in order.
    pub fn events(&self) -> Vec<WireEvent> {
        self.shared.events.lock().expect("lock poisoned").clone()
    }

    /// Only the data frames written so far, in order.
    pub fn written_frames(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                WireEvent::Frame(bytes) => Some(bytes),
                WireEvent::CloseFrame => None,
            })
            .collect()
    }

    /// Number of times the writer's `close` was called.
    pub fn close_calls(&self) -> usize {
        self.shared.close_calls.load(Ordering::SeqCst)
    }

    /// Returns `true` once the writer has closed the transport (or been
    /// dropped).
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow() || self.closed.has_changed().is_err()
    }

    /// Waits until the writer closes the transport.
    pub async fn wait_closed(&self) {
        let mut rx = self.closed.clone();
        closed_signal(&mut rx).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reader_returns_frames_in_order_then_peer_closed() {
        // Arrange
        let (mut reader, _writer, peer) = mock_transport();
        peer.push_frame(Frame::binary(vec![1]));
        peer.push_frame(Frame::text("x"));
        peer.hang_up();

        // Act / Assert
        assert_eq!(reader.next_frame().await.unwrap(), Frame::binary(vec![1]));
        assert_eq!(reader.next_frame().await.unwrap(), Frame::text("x"));
        assert!(matches!(
            reader.next_frame().await,
            Err(TransportError::PeerClosed { .. })
        ));
    }

    #[tokio::test]
    async fn test_writer_close_fails_pending_read() {
        let (mut reader, mut writer, peer) = mock_transport();
        let pending = tokio::spawn(async move { reader.next_frame().await });

        writer.close().await;

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(TransportError::Closed)));
        assert!(peer.is_closed());
    }

    #[tokio::test]
    async fn test_dropping_writer_counts_as_closed() {
        let (mut reader, writer, peer) = mock_transport();
        drop(writer);
        assert!(matches!(reader.next_frame().await, Err(TransportError::Closed)));
        assert!(peer.is_closed());
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_counted() {
        let (_reader, mut writer, peer) = mock_transport();
        writer.close().await;
        writer.close().await;
        assert_eq!(peer.close_calls(), 2);
        assert!(matches!(
            writer.write_frame(vec![0]).await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_injected_failure_starts_at_requested_write() {
        let (_reader, mut writer, peer) = mock_transport();
        peer.fail_writes_after(1);

        assert!(writer.write_frame(vec![1]).await.is_ok());
        assert!(writer.write_frame(vec![2]).await.is_err());
        assert_eq!(peer.written_frames(), vec![vec![1]]);
    }

    #[tokio::test]
    async fn test_stalled_close_times_out_after_deadline() {
        let (_reader, mut writer, peer) = mock_transport();
        peer.stall_close();

        let result = writer.send_close(Duration::from_millis(10)).await;

        assert!(matches!(result, Err(TransportError::Timeout(_))));
        assert!(peer.events().is_empty());
    }
}

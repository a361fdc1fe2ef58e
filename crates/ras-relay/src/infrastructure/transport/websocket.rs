//! WebSocket transport adapter over tokio-tungstenite.
//!
//! [`WsTransport::split`] divides an upgraded [`WebSocketStream`] into a
//! [`WsFrameReader`] and a [`WsFrameWriter`].  The adapter:
//!
//! - passes binary and text data frames through as [`Frame`]s;
//! - skips ping, pong and raw frames (tungstenite answers pings on its own the
//!   next time the writer flushes);
//! - reports a peer close frame, or the end of the stream, as
//!   [`TransportError::PeerClosed`];
//! - sends its own close control frame with an empty payload.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::WebSocketStream;

use super::closed_signal;
use crate::application::transport::{FrameReader, FrameWriter};
use crate::domain::{Frame, TransportError};

/// Constructor namespace for WebSocket transports.
pub struct WsTransport;

impl WsTransport {
    /// Splits an upgraded WebSocket into a reader and a writer that share a
    /// close signal.
    pub fn split<S>(stream: WebSocketStream<S>) -> (WsFrameReader<S>, WsFrameWriter<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, stream) = stream.split();
        let (closed_tx, closed_rx) = watch::channel(false);
        (
            WsFrameReader {
                stream,
                closed: closed_rx,
            },
            WsFrameWriter {
                sink: Some(sink),
                closed: closed_tx,
            },
        )
    }
}

/// Read half of a WebSocket transport.
pub struct WsFrameReader<S> {
    stream: SplitStream<WebSocketStream<S>>,
    closed: watch::Receiver<bool>,
}

#[async_trait]
impl<S> FrameReader for WsFrameReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn next_frame(&mut self) -> Result<Frame, TransportError> {
        loop {
            let next = tokio::select! {
                biased;
                _ = closed_signal(&mut self.closed) => return Err(TransportError::Closed),
                next = self.stream.next() => next,
            };

            match next {
                Some(Ok(WsMessage::Binary(data))) => return Ok(Frame::binary(data)),
                Some(Ok(WsMessage::Text(text))) => return Ok(Frame::text(text)),
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
                    continue;
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    let (code, reason) = match frame {
                        Some(f) => (Some(u16::from(f.code)), f.reason.into_owned()),
                        None => (None, String::new()),
                    };
                    return Err(TransportError::PeerClosed { code, reason });
                }
                Some(Err(e)) => return Err(map_ws_error(e)),
                None => {
                    return Err(TransportError::PeerClosed {
                        code: None,
                        reason: "stream ended".to_string(),
                    })
                }
            }
        }
    }
}

/// Write half of a WebSocket transport.
///
/// Closing drops the sink right away; the socket is released as soon as the
/// reader, which stops on the same signal, has dropped its half too.
pub struct WsFrameWriter<S> {
    sink: Option<SplitSink<WebSocketStream<S>, WsMessage>>,
    closed: watch::Sender<bool>,
}

impl<S> WsFrameWriter<S> {
    fn open_sink(&mut self) -> Result<&mut SplitSink<WebSocketStream<S>, WsMessage>, TransportError> {
        if *self.closed.borrow() {
            return Err(TransportError::Closed);
        }
        self.sink.as_mut().ok_or(TransportError::Closed)
    }
}

#[async_trait]
impl<S> FrameWriter for WsFrameWriter<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn write_frame(&mut self, payload: Vec<u8>) -> Result<(), TransportError> {
        // `send` flushes, so the frame is complete on the wire when it returns.
        self.open_sink()?
            .send(WsMessage::Binary(payload))
            .await
            .map_err(map_ws_error)
    }

    async fn send_close(&mut self, deadline: Duration) -> Result<(), TransportError> {
        let sink = self.open_sink()?;
        match timeout(deadline, sink.send(WsMessage::Close(None))).await {
            Ok(result) => result.map_err(map_ws_error),
            Err(_) => Err(TransportError::Timeout(deadline)),
        }
    }

    async fn close(&mut self) {
        self.closed.send_replace(true);
        // No close frame on this path; the peer sees the connection drop.
        self.sink.take();
    }
}

fn map_ws_error(e: WsError) -> TransportError {
    match e {
        WsError::Io(io) => TransportError::Io(io),
        closed @ (WsError::ConnectionClosed | WsError::AlreadyClosed) => {
            TransportError::PeerClosed {
                code: None,
                reason: closed.to_string(),
            }
        }
        other => TransportError::Link(other.to_string()),
    }
}

//! The processor seam.
//!
//! A [`Processor`] is whatever sits on the far side of the session boundary:
//! it reads decoded messages from the receive handle, pushes replies into the
//! send handle, and ends the session by closing the send handle.  The relay
//! runs one `serve` call per connection.

use async_trait::async_trait;
use ras_core::Message;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::application::boundary::{SessionBoundary, SessionClosed};

/// Errors a processor may end with.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The outbound side of the session went away while sending.
    #[error(transparent)]
    SessionClosed(#[from] SessionClosed),

    /// The peer did not follow the expected message sequence.
    #[error("handshake failed: {0}")]
    Handshake(String),
}

/// Application logic run against one session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Processor: Send + Sync + 'static {
    /// Serves one session until it is finished.
    ///
    /// Whatever the outcome, the boundary is dropped when this returns, which
    /// closes the send handle and lets the outbound pump shut the transport.
    async fn serve(&self, boundary: SessionBoundary) -> Result<(), ProcessorError>;
}

/// Demonstration processor bundled with the relay binary.
///
/// Logs the client's protocol request, echoes `Binary` and `Text` messages
/// back unchanged, and ignores input events.  Ends when the client goes away.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoProcessor;

#[async_trait]
impl Processor for EchoProcessor {
    async fn serve(&self, boundary: SessionBoundary) -> Result<(), ProcessorError> {
        let id = boundary.id();
        let (mut receive, send) = boundary.into_parts();

        while let Some(msg) = receive.recv().await {
            match msg {
                Message::Protocol(p) => {
                    info!("session {id}: client requested protocol '{}'", p.protocol);
                }
                Message::Binary(_) | Message::Text(_) => {
                    send.send(msg).await?;
                }
                Message::KeyboardEvent(k) => {
                    trace!("session {id}: key {:#x} down={}", k.key, k.down);
                }
                Message::MouseEvent(m) => {
                    trace!("session {id}: mouse ({}, {}) buttons={:#07b}", m.x, m.y, m.buttons);
                }
                other => {
                    debug!("session {id}: ignoring {:?}", other.message_type());
                }
            }
        }

        debug!("session {id}: receive queue ended; echo processor done");
        send.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::Session;
    use crate::domain::SessionConfig;
    use crate::infrastructure::transport::mock::{mock_transport, WireEvent};
    use ras_core::protocol::{MouseEventMessage, ProtocolMessage};
    use ras_core::{decode_message, Role};

    #[tokio::test]
    async fn test_echo_processor_echoes_text_and_binary_only() {
        // Arrange
        let (reader, writer, peer) = mock_transport();
        let (boundary, tasks) = Session::start(reader, writer, &SessionConfig::default());
        peer.push_message(
            Role::Client,
            &Message::Protocol(ProtocolMessage {
                protocol: "vnc".into(),
            }),
        );
        peer.push_message(
            Role::Client,
            &Message::MouseEvent(MouseEventMessage {
                buttons: 1,
                x: 3,
                y: 4,
            }),
        );
        peer.push_message(Role::Client, &Message::Text("hi".into()));
        peer.push_message(Role::Client, &Message::Binary(vec![1, 2, 3]));
        peer.hang_up();

        // Act
        EchoProcessor.serve(boundary).await.unwrap();
        tasks.join().await;

        // Assert
        let echoed: Vec<Message> = peer
            .written_frames()
            .iter()
            .map(|f| decode_message(Role::Client, f).unwrap())
            .collect();
        assert_eq!(
            echoed,
            vec![Message::Text("hi".into()), Message::Binary(vec![1, 2, 3])]
        );
        assert_eq!(peer.events().last(), Some(&WireEvent::CloseFrame));
    }
}

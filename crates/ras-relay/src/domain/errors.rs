//! Error taxonomy for the session pumps.
//!
//! Every error here is terminal for the pump that hit it: it is logged at the
//! point of failure and the pump tears down.  None of these values ever reach
//! the processor, which only observes that its receive queue has ended.

use std::time::Duration;

use ras_core::ProtocolError;
use thiserror::Error;

use crate::domain::frame::FrameKind;

/// Failures reported by a transport adapter.
#[derive(Debug, Error)]
pub enum TransportError {
    /// This side closed the transport; pending and later reads fail with it.
    #[error("transport closed locally")]
    Closed,

    /// The peer closed the connection, either with a close frame or by
    /// ending the stream.
    #[error("peer closed the connection (code {code:?}): {reason}")]
    PeerClosed { code: Option<u16>, reason: String },

    /// An operation did not finish before its deadline.
    #[error("transport operation timed out after {0:?}")]
    Timeout(Duration),

    /// An OS-level socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure of the underlying framing library.
    #[error("link error: {0}")]
    Link(String),
}

impl TransportError {
    /// Returns `true` for the ordinary ways a connection ends, which are
    /// logged at a lower level than genuine failures.
    pub fn is_normal_close(&self) -> bool {
        matches!(
            self,
            TransportError::Closed | TransportError::PeerClosed { .. }
        )
    }
}

/// Why a session pump stopped.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Reading the next frame failed, including a normal close.
    #[error("transport read failed: {0}")]
    TransportReadFailure(#[source] TransportError),

    /// Writing a frame failed.
    #[error("transport write failed: {0}")]
    TransportWriteFailure(#[source] TransportError),

    /// A frame arrived that is not a binary frame.
    #[error("unexpected {0:?} frame; only binary frames carry messages")]
    UnexpectedFrameKind(FrameKind),

    /// The frame codec rejected a message.  Covers the unsupported type,
    /// malformed body and not-sendable cases.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl RelayError {
    /// Returns `true` if the pump stopped because the connection ended
    /// normally rather than because something went wrong.
    pub fn is_normal_close(&self) -> bool {
        match self {
            RelayError::TransportReadFailure(e) => e.is_normal_close(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_close_read_failure_is_normal() {
        let err = RelayError::TransportReadFailure(TransportError::PeerClosed {
            code: Some(1000),
            reason: String::new(),
        });
        assert!(err.is_normal_close());
    }

    #[test]
    fn test_io_read_failure_is_not_normal() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = RelayError::TransportReadFailure(TransportError::Io(io));
        assert!(!err.is_normal_close());
    }

    #[test]
    fn test_write_failure_is_never_normal() {
        let err = RelayError::TransportWriteFailure(TransportError::Closed);
        assert!(!err.is_normal_close());
    }

    #[test]
    fn test_protocol_error_converts_and_displays_transparently() {
        let err: RelayError = ProtocolError::UnsupportedType(4242).into();
        assert!(matches!(
            err,
            RelayError::Protocol(ProtocolError::UnsupportedType(4242))
        ));
        assert_eq!(
            err.to_string(),
            ProtocolError::UnsupportedType(4242).to_string()
        );
    }

    #[test]
    fn test_unexpected_frame_kind_message_names_the_kind() {
        let err = RelayError::UnexpectedFrameKind(FrameKind::Text);
        assert!(err.to_string().contains("Text"));
    }
}

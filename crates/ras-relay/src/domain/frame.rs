//! Transport frames as seen by the session pumps.
//!
//! A transport delivers whole frames, each tagged with a [`FrameKind`].  Only
//! binary frames carry RAS messages; every other kind ends the session.

/// The kind of a transport frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// A binary data frame; the payload is one encoded RAS message.
    Binary,
    /// A text data frame.  Never valid for this protocol.
    Text,
}

/// One complete data frame read from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Creates a binary frame.
    pub fn binary(payload: Vec<u8>) -> Self {
        Self {
            kind: FrameKind::Binary,
            payload,
        }
    }

    /// Creates a text frame from a UTF-8 string.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: FrameKind::Text,
            payload: text.into().into_bytes(),
        }
    }

    /// Returns `true` if this frame can carry a RAS message.
    pub fn is_binary(&self) -> bool {
        self.kind == FrameKind::Binary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_constructor_sets_kind() {
        let frame = Frame::binary(vec![0, 1, b'x']);
        assert!(frame.is_binary());
        assert_eq!(frame.payload, vec![0, 1, b'x']);
    }

    #[test]
    fn test_text_constructor_keeps_utf8_bytes() {
        let frame = Frame::text("héllo");
        assert_eq!(frame.kind, FrameKind::Text);
        assert!(!frame.is_binary());
        assert_eq!(frame.payload, "héllo".as_bytes());
    }
}

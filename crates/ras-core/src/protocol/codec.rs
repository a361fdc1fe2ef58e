//! Binary codec for encoding and decoding RAS protocol messages.
//!
//! Wire format (one message per transport frame):
//! ```text
//! [msg_type:2][body:N]
//! ```
//! The transport supplies the frame boundaries, so there is no length field in
//! the header.  Each body is self-delimiting: variable-size fields carry their
//! own big-endian length prefix.  All multi-byte integers are big-endian.

use thiserror::Error;
use tracing::trace;

use crate::protocol::messages::{
    CopyMessage, CursorMessage, KeyboardEventMessage, Message, MessageType, MouseEventMessage,
    PngMessage, ProtocolMessage, ResizeMessage, Role, TYPE_ID_SIZE,
};
use crate::protocol::registry;

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The frame is too short to hold the message type identifier.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The message type identifier has no entry in the registry for this role.
    #[error("unsupported message type: {0}")]
    UnsupportedType(u16),

    /// The body could not be parsed (truncated field, bad length prefix, UTF-8 error).
    #[error("malformed body: {0}")]
    MalformedBody(String),

    /// The message cannot be sent by the encoding role.
    #[error("{message_type:?} is not sendable by the {role:?} role")]
    NotSendable { message_type: MessageType, role: Role },

    /// A variable-size field does not fit its length prefix.
    #[error("{field} is {len} bytes, the wire format allows at most {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `msg` as `role` into a complete frame payload.
///
/// The type identifier is written first, followed by the body.  The caller
/// hands the returned buffer to the transport as a single binary frame.
///
/// # Errors
///
/// Returns [`ProtocolError::NotSendable`] if `role` may not send this message
/// type (nothing is encoded in that case), or [`ProtocolError::FieldTooLong`]
/// if a variable-size field exceeds its length prefix.
///
/// # Examples
///
/// ```rust
/// use ras_core::protocol::{decode_message, encode_message, Message, Role};
///
/// let msg = Message::Text("hi".to_string());
/// let frame = encode_message(Role::Server, &msg).unwrap();
/// assert_eq!(decode_message(Role::Client, &frame).unwrap(), msg);
/// ```
pub fn encode_message(role: Role, msg: &Message) -> Result<Vec<u8>, ProtocolError> {
    let message_type = msg.message_type();
    if !role.can_send(message_type) {
        return Err(ProtocolError::NotSendable { message_type, role });
    }

    let mut buf = Vec::with_capacity(TYPE_ID_SIZE + body_size_hint(msg));
    buf.extend_from_slice(&message_type.id().to_be_bytes());
    encode_body(&mut buf, msg)?;
    Ok(buf)
}

/// Decodes one message received by `role` from a complete frame payload.
///
/// Bytes following the self-delimited body are ignored.
///
/// # Errors
///
/// - [`ProtocolError::InsufficientData`] if the frame is shorter than the
///   type identifier.
/// - [`ProtocolError::UnsupportedType`] if the identifier is not registered
///   for `role`; the body is never inspected in that case.
/// - [`ProtocolError::MalformedBody`] if the body does not parse.
pub fn decode_message(role: Role, frame: &[u8]) -> Result<Message, ProtocolError> {
    if frame.len() < TYPE_ID_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: TYPE_ID_SIZE,
            available: frame.len(),
        });
    }

    let id = u16::from_be_bytes([frame[0], frame[1]]);
    let registration =
        registry::variant_for(role, id).ok_or(ProtocolError::UnsupportedType(id))?;

    let mut body = BodyReader::new(registration.message_type(), &frame[TYPE_ID_SIZE..]);
    let msg = registration.decode(&mut body)?;

    if body.remaining() > 0 {
        trace!(
            "ignoring {} trailing bytes after {:?} body",
            body.remaining(),
            registration.message_type()
        );
    }
    Ok(msg)
}

// ── Body encoding ─────────────────────────────────────────────────────────────

fn encode_body(buf: &mut Vec<u8>, msg: &Message) -> Result<(), ProtocolError> {
    match msg {
        Message::Binary(bytes) => write_prefixed(buf, bytes, Prefix::U32, "Binary.bytes")?,
        Message::Text(text) => write_prefixed(buf, text.as_bytes(), Prefix::U32, "Text.text")?,
        Message::Protocol(m) => encode_protocol(buf, m)?,
        Message::Resize(m) => encode_resize(buf, m),
        Message::KeyboardEvent(m) => encode_keyboard_event(buf, m),
        Message::Png(m) => encode_png(buf, m)?,
        Message::MouseEvent(m) => encode_mouse_event(buf, m),
        Message::Copy(m) => encode_copy(buf, m),
        Message::Cursor(m) => encode_cursor(buf, m)?,
    }
    Ok(())
}

fn body_size_hint(msg: &Message) -> usize {
    match msg {
        Message::Binary(bytes) => 4 + bytes.len(),
        Message::Text(text) => 4 + text.len(),
        Message::Protocol(m) => 1 + m.protocol.len(),
        Message::Resize(_) => 4,
        Message::KeyboardEvent(_) => 5,
        Message::Png(m) => 12 + m.img.len(),
        Message::MouseEvent(_) => 6,
        Message::Copy(_) => 12,
        Message::Cursor(m) => 8 + m.img.len(),
    }
}

fn encode_protocol(buf: &mut Vec<u8>, m: &ProtocolMessage) -> Result<(), ProtocolError> {
    write_prefixed(buf, m.protocol.as_bytes(), Prefix::U8, "Protocol.protocol")
}

fn encode_resize(buf: &mut Vec<u8>, m: &ResizeMessage) {
    buf.extend_from_slice(&m.width.to_be_bytes());
    buf.extend_from_slice(&m.height.to_be_bytes());
}

fn encode_keyboard_event(buf: &mut Vec<u8>, m: &KeyboardEventMessage) {
    buf.push(if m.down { 0x01 } else { 0x00 });
    buf.extend_from_slice(&m.key.to_be_bytes());
}

fn encode_png(buf: &mut Vec<u8>, m: &PngMessage) -> Result<(), ProtocolError> {
    buf.extend_from_slice(&m.x.to_be_bytes());
    buf.extend_from_slice(&m.y.to_be_bytes());
    buf.extend_from_slice(&m.width.to_be_bytes());
    buf.extend_from_slice(&m.height.to_be_bytes());
    write_prefixed(buf, &m.img, Prefix::U32, "Png.img")
}

fn encode_mouse_event(buf: &mut Vec<u8>, m: &MouseEventMessage) {
    buf.extend_from_slice(&m.buttons.to_be_bytes());
    buf.extend_from_slice(&m.x.to_be_bytes());
    buf.extend_from_slice(&m.y.to_be_bytes());
}

fn encode_copy(buf: &mut Vec<u8>, m: &CopyMessage) {
    for value in [m.dx, m.dy, m.width, m.height, m.sx, m.sy] {
        buf.extend_from_slice(&value.to_be_bytes());
    }
}

fn encode_cursor(buf: &mut Vec<u8>, m: &CursorMessage) -> Result<(), ProtocolError> {
    buf.extend_from_slice(&m.x.to_be_bytes());
    buf.extend_from_slice(&m.y.to_be_bytes());
    write_prefixed(buf, &m.img, Prefix::U32, "Cursor.img")
}

// ── Body decoding ─────────────────────────────────────────────────────────────
//
// One decoder per registered variant.  The registry stores these as function
// pointers so dispatch is a table lookup rather than a match on the id.

pub(crate) fn decode_binary(r: &mut BodyReader<'_>) -> Result<Message, ProtocolError> {
    let bytes = r.prefixed_bytes(Prefix::U32, "bytes")?;
    Ok(Message::Binary(bytes.to_vec()))
}

pub(crate) fn decode_text(r: &mut BodyReader<'_>) -> Result<Message, ProtocolError> {
    Ok(Message::Text(r.prefixed_string(Prefix::U32, "text")?))
}

pub(crate) fn decode_protocol(r: &mut BodyReader<'_>) -> Result<Message, ProtocolError> {
    let protocol = r.prefixed_string(Prefix::U8, "protocol")?;
    Ok(Message::Protocol(ProtocolMessage { protocol }))
}

pub(crate) fn decode_resize(r: &mut BodyReader<'_>) -> Result<Message, ProtocolError> {
    Ok(Message::Resize(ResizeMessage {
        width: r.u16("width")?,
        height: r.u16("height")?,
    }))
}

pub(crate) fn decode_keyboard_event(r: &mut BodyReader<'_>) -> Result<Message, ProtocolError> {
    // Any non-zero flag counts as key-down.
    let down = r.u8("downFlag")? != 0;
    let key = r.u32("key")?;
    Ok(Message::KeyboardEvent(KeyboardEventMessage { down, key }))
}

pub(crate) fn decode_png(r: &mut BodyReader<'_>) -> Result<Message, ProtocolError> {
    Ok(Message::Png(PngMessage {
        x: r.u16("x")?,
        y: r.u16("y")?,
        width: r.u16("width")?,
        height: r.u16("height")?,
        img: r.prefixed_bytes(Prefix::U32, "img")?.to_vec(),
    }))
}

pub(crate) fn decode_mouse_event(r: &mut BodyReader<'_>) -> Result<Message, ProtocolError> {
    Ok(Message::MouseEvent(MouseEventMessage {
        buttons: r.u16("buttons")?,
        x: r.u16("x")?,
        y: r.u16("y")?,
    }))
}

pub(crate) fn decode_copy(r: &mut BodyReader<'_>) -> Result<Message, ProtocolError> {
    Ok(Message::Copy(CopyMessage {
        dx: r.u16("dx")?,
        dy: r.u16("dy")?,
        width: r.u16("width")?,
        height: r.u16("height")?,
        sx: r.u16("sx")?,
        sy: r.u16("sy")?,
    }))
}

pub(crate) fn decode_cursor(r: &mut BodyReader<'_>) -> Result<Message, ProtocolError> {
    Ok(Message::Cursor(CursorMessage {
        x: r.u16("x")?,
        y: r.u16("y")?,
        img: r.prefixed_bytes(Prefix::U32, "img")?.to_vec(),
    }))
}

// ── Utility helpers ───────────────────────────────────────────────────────────

/// Width of the length prefix in front of a variable-size field.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Prefix {
    U8,
    U32,
}

impl Prefix {
    fn max_len(self) -> usize {
        match self {
            Prefix::U8 => u8::MAX as usize,
            Prefix::U32 => u32::MAX as usize,
        }
    }
}

/// Writes a length prefix of the given width followed by `bytes`.
fn write_prefixed(
    buf: &mut Vec<u8>,
    bytes: &[u8],
    prefix: Prefix,
    field: &'static str,
) -> Result<(), ProtocolError> {
    let len = bytes.len();
    if len > prefix.max_len() {
        return Err(ProtocolError::FieldTooLong {
            field,
            len,
            max: prefix.max_len(),
        });
    }
    match prefix {
        Prefix::U8 => buf.push(len as u8),
        Prefix::U32 => buf.extend_from_slice(&(len as u32).to_be_bytes()),
    }
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Cursor over a message body.  Every read is bounds-checked and reports the
/// offending field in its [`ProtocolError::MalformedBody`] message.
pub(crate) struct BodyReader<'a> {
    message_type: MessageType,
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BodyReader<'a> {
    pub(crate) fn new(message_type: MessageType, buf: &'a [u8]) -> Self {
        Self {
            message_type,
            buf,
            pos: 0,
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, field: &str) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::MalformedBody(format!(
                "{:?}.{field}: need {n} bytes at offset {}, got {}",
                self.message_type,
                self.pos,
                self.remaining()
            )));
        }
        let buf = self.buf;
        let slice = &buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self, field: &str) -> Result<u8, ProtocolError> {
        Ok(self.take(1, field)?[0])
    }

    fn u16(&mut self, field: &str) -> Result<u16, ProtocolError> {
        let b = self.take(2, field)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, field: &str) -> Result<u32, ProtocolError> {
        let b = self.take(4, field)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn prefixed_bytes(&mut self, prefix: Prefix, field: &str) -> Result<&'a [u8], ProtocolError> {
        let len = match prefix {
            Prefix::U8 => self.u8(field)? as usize,
            Prefix::U32 => self.u32(field)? as usize,
        };
        self.take(len, field)
    }

    fn prefixed_string(&mut self, prefix: Prefix, field: &str) -> Result<String, ProtocolError> {
        let bytes = self.prefixed_bytes(prefix, field)?;
        let s = std::str::from_utf8(bytes).map_err(|e| {
            ProtocolError::MalformedBody(format!(
                "{:?}.{field}: invalid UTF-8: {e}",
                self.message_type
            ))
        })?;
        Ok(s.to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

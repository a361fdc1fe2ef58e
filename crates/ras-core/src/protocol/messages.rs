//! All RAS protocol message types.
//!
//! Every message travels in its own transport frame, prefixed by a 2-byte
//! big-endian [`MessageType`] identifier.  Identifiers below 1000 are generic
//! payload carriers usable in both directions; identifiers from 1000 upwards
//! belong to the remote-desktop vocabulary and flow in one direction only.

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Size of the message type identifier that starts every frame.
pub const TYPE_ID_SIZE: usize = 2;

// ── Message type codes ────────────────────────────────────────────────────────

/// All message type codes understood by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum MessageType {
    // Generic carriers (both directions)
    Binary = 0,
    Text = 1,
    // Client → server
    Protocol = 1000,
    KeyboardEvent = 1002,
    MouseEvent = 1004,
    // Server → client
    Resize = 1001,
    Png = 1003,
    Copy = 1005,
    Cursor = 1007,
}

impl MessageType {
    /// Every known message type, in identifier order.
    pub const ALL: [MessageType; 9] = [
        MessageType::Binary,
        MessageType::Text,
        MessageType::Protocol,
        MessageType::Resize,
        MessageType::KeyboardEvent,
        MessageType::Png,
        MessageType::MouseEvent,
        MessageType::Copy,
        MessageType::Cursor,
    ];

    /// Returns the numeric identifier written on the wire.
    pub fn id(self) -> u16 {
        self as u16
    }

    /// Returns which side of the link is allowed to originate this type.
    pub fn origin(self) -> Origin {
        match self {
            MessageType::Binary | MessageType::Text => Origin::Either,
            MessageType::Protocol | MessageType::KeyboardEvent | MessageType::MouseEvent => {
                Origin::Client
            }
            MessageType::Resize | MessageType::Png | MessageType::Copy | MessageType::Cursor => {
                Origin::Server
            }
        }
    }
}

impl TryFrom<u16> for MessageType {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, ()> {
        match value {
            0 => Ok(MessageType::Binary),
            1 => Ok(MessageType::Text),
            1000 => Ok(MessageType::Protocol),
            1001 => Ok(MessageType::Resize),
            1002 => Ok(MessageType::KeyboardEvent),
            1003 => Ok(MessageType::Png),
            1004 => Ok(MessageType::MouseEvent),
            1005 => Ok(MessageType::Copy),
            1007 => Ok(MessageType::Cursor),
            _ => Err(()),
        }
    }
}

// ── Direction ─────────────────────────────────────────────────────────────────

/// The side of the link that may originate a message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Client,
    Server,
    Either,
}

/// The end of the link a codec is working for.
///
/// A role decides which message types may be decoded (received) and which may
/// be encoded (sent).  The relay normally runs as [`Role::Server`]; the client
/// role exists for native peers and for tests that play the browser's part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Server,
    Client,
}

impl Role {
    /// Returns the role at the other end of the link.
    pub fn peer(self) -> Role {
        match self {
            Role::Server => Role::Client,
            Role::Client => Role::Server,
        }
    }

    /// Returns `true` if this role is allowed to send `message_type`.
    pub fn can_send(self, message_type: MessageType) -> bool {
        match (self, message_type.origin()) {
            (_, Origin::Either) => true,
            (Role::Server, Origin::Server) | (Role::Client, Origin::Client) => true,
            _ => false,
        }
    }

    /// Returns `true` if this role accepts `message_type` from its peer.
    pub fn can_receive(self, message_type: MessageType) -> bool {
        self.peer().can_send(message_type)
    }
}

// ── Per-message payload structs ───────────────────────────────────────────────

/// PROTOCOL (1000): the remote-desktop protocol the client wants proxied
/// (e.g. `"vnc"`).  Sent first after the connection opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolMessage {
    /// Protocol name; at most 255 bytes of UTF-8.
    pub protocol: String,
}

/// RESIZE (1001): the remote framebuffer changed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeMessage {
    pub width: u16,
    pub height: u16,
}

/// KEYBOARD_EVENT (1002): a key was pressed or released in the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardEventMessage {
    /// `true` for key-down, `false` for key-up.
    pub down: bool,
    /// X11 keysym of the key (printable ASCII maps to itself).
    pub key: u32,
}

/// PNG (1003): a PNG-encoded rectangle to draw at `(x, y)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PngMessage {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    /// Raw PNG file bytes.
    pub img: Vec<u8>,
}

/// Mouse button bitmask values used in [`MouseEventMessage::buttons`].
///
/// Matches the DOM `MouseEvent.buttons` encoding the browser client forwards.
pub mod buttons {
    pub const PRIMARY: u16 = 1 << 0;
    pub const SECONDARY: u16 = 1 << 1;
    pub const AUXILIARY: u16 = 1 << 2;
    pub const BACK: u16 = 1 << 3;
    pub const FORWARD: u16 = 1 << 4;
}

/// MOUSE_EVENT (1004): pointer position and the set of pressed buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseEventMessage {
    /// Bitmask of pressed buttons; see [`buttons`].
    pub buttons: u16,
    /// X position relative to the top-left corner of the remote screen.
    pub x: u16,
    /// Y position relative to the top-left corner of the remote screen.
    pub y: u16,
}

/// COPY (1005): copy a rectangle of the framebuffer from `(sx, sy)` to `(dx, dy)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyMessage {
    pub dx: u16,
    pub dy: u16,
    pub width: u16,
    pub height: u16,
    pub sx: u16,
    pub sy: u16,
}

/// CURSOR (1007): a new cursor image with its hotspot at `(x, y)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorMessage {
    pub x: u16,
    pub y: u16,
    /// PNG-encoded cursor image.
    pub img: Vec<u8>,
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// All valid RAS messages, discriminated by type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Binary(Vec<u8>),
    Text(String),
    Protocol(ProtocolMessage),
    Resize(ResizeMessage),
    KeyboardEvent(KeyboardEventMessage),
    Png(PngMessage),
    MouseEvent(MouseEventMessage),
    Copy(CopyMessage),
    Cursor(CursorMessage),
}

impl Message {
    /// Returns the [`MessageType`] discriminant for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Binary(_) => MessageType::Binary,
            Message::Text(_) => MessageType::Text,
            Message::Protocol(_) => MessageType::Protocol,
            Message::Resize(_) => MessageType::Resize,
            Message::KeyboardEvent(_) => MessageType::KeyboardEvent,
            Message::Png(_) => MessageType::Png,
            Message::MouseEvent(_) => MessageType::MouseEvent,
            Message::Copy(_) => MessageType::Copy,
            Message::Cursor(_) => MessageType::Cursor,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

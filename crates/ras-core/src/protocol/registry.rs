//! Static message registry: which body decoder handles which type identifier.
//!
//! There is one table per [`Role`], listing exactly the message types that
//! role may receive.  The tables are `static` and never change at runtime;
//! extending the protocol means adding a row here and a decoder in the codec.

use crate::protocol::codec::{
    decode_binary, decode_copy, decode_cursor, decode_keyboard_event, decode_mouse_event,
    decode_png, decode_protocol, decode_resize, decode_text, BodyReader, ProtocolError,
};
use crate::protocol::messages::{Message, MessageType, Role};

type BodyDecoder = fn(&mut BodyReader<'_>) -> Result<Message, ProtocolError>;

/// One row of the registry: a message type and the decoder for its body.
pub struct Registration {
    message_type: MessageType,
    decode: BodyDecoder,
}

impl Registration {
    const fn new(message_type: MessageType, decode: BodyDecoder) -> Self {
        Self {
            message_type,
            decode,
        }
    }

    /// The message type this row decodes.
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub(crate) fn decode(&self, body: &mut BodyReader<'_>) -> Result<Message, ProtocolError> {
        (self.decode)(body)
    }
}

/// Messages a server accepts from a browser client.
static SERVER_INBOUND: [Registration; 5] = [
    Registration::new(MessageType::Binary, decode_binary),
    Registration::new(MessageType::Text, decode_text),
    Registration::new(MessageType::Protocol, decode_protocol),
    Registration::new(MessageType::KeyboardEvent, decode_keyboard_event),
    Registration::new(MessageType::MouseEvent, decode_mouse_event),
];

/// Messages a client accepts from the server.
static CLIENT_INBOUND: [Registration; 6] = [
    Registration::new(MessageType::Binary, decode_binary),
    Registration::new(MessageType::Text, decode_text),
    Registration::new(MessageType::Resize, decode_resize),
    Registration::new(MessageType::Png, decode_png),
    Registration::new(MessageType::Copy, decode_copy),
    Registration::new(MessageType::Cursor, decode_cursor),
];

fn table(role: Role) -> &'static [Registration] {
    match role {
        Role::Server => &SERVER_INBOUND,
        Role::Client => &CLIENT_INBOUND,
    }
}

/// Looks up the registry row for `id` as received by `role`.
///
/// Returns `None` for identifiers that are unknown or that `role` never
/// receives.
pub fn variant_for(role: Role, id: u16) -> Option<&'static Registration> {
    table(role).iter().find(|r| r.message_type.id() == id)
}

/// Iterates over every message type `role` can decode.
pub fn registered_types(role: Role) -> impl Iterator<Item = MessageType> {
    table(role).iter().map(Registration::message_type)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_registry_lists_client_originated_types() {
        let types: Vec<_> = registered_types(Role::Server).collect();
        assert_eq!(
            types,
            vec![
                MessageType::Binary,
                MessageType::Text,
                MessageType::Protocol,
                MessageType::KeyboardEvent,
                MessageType::MouseEvent,
            ]
        );
    }

    #[test]
    fn test_registry_agrees_with_role_direction_rules() {
        for role in [Role::Server, Role::Client] {
            for message_type in MessageType::ALL {
                assert_eq!(
                    variant_for(role, message_type.id()).is_some(),
                    role.can_receive(message_type),
                    "{role:?} / {message_type:?}"
                );
            }
        }
    }

    #[test]
    fn test_variant_for_unknown_id_is_none() {
        assert!(variant_for(Role::Server, 9999).is_none());
        assert!(variant_for(Role::Client, 1006).is_none());
    }

    #[test]
    fn test_variant_for_returns_matching_row() {
        let row = variant_for(Role::Client, 1007).expect("cursor is registered for clients");
        assert_eq!(row.message_type(), MessageType::Cursor);
    }
}

//! Protocol module containing message types, the registry and the binary codec.

pub mod codec;
pub mod messages;
pub mod registry;

pub use codec::{decode_message, encode_message, ProtocolError};
pub use messages::*;
pub use registry::{registered_types, variant_for, Registration};

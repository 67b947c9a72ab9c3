//! Protocol module containing OBS WebSocket message types and the JSON codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_message, encode_message, ProtocolError};
pub use messages::*;

//! Codec trait and implementations for event serialization.
//!
//! The server never touches `serde_json` directly; it goes through a
//! [`Codec`], so the frame format can change without touching the
//! connection handler.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Turns wire types into bytes and back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the life of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that speaks JSON, the format browser clients send.
///
/// ## Example
///
/// ```rust
/// use tictac_protocol::{ClientEvent, Codec, JsonCodec, RoomId};
///
/// let codec = JsonCodec;
/// let frame = br#"{"event":"reset-game","data":{"roomId":"r1"}}"#;
///
/// let event: ClientEvent = codec.decode(frame).unwrap();
/// assert_eq!(event, ClientEvent::ResetGame { room_id: RoomId::from("r1") });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

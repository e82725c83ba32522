//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// An outbound event could not be serialized.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An inbound frame was not a well-formed event: malformed JSON,
    /// an unknown event name, a missing field, or a value of the wrong
    /// type (for example a negative row).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}

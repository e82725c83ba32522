//! Unified error type for the server.

use tictac_protocol::ProtocolError;
use tictac_room::RoomError;
use tictac_transport::TransportError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` impls let `?` lift layer errors into this one.
#[derive(Debug, thiserror::Error)]
pub enum TictacError {
    /// Binding, accepting, or talking to a socket failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room refused or dropped a request.
    #[error(transparent)]
    Room(#[from] RoomError),
}

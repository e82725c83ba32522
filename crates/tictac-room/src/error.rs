//! Error types for the room layer.

use tictac_protocol::RoomId;

use crate::{ChatError, IllegalMove};

/// Errors that can occur during room operations.
///
/// None of these are fatal; the registry reports them so the caller can
/// log them. Anything the client needs to see has already been sent.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Nobody has joined a room by this name yet.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room's actor stopped answering.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// A join arrived with an empty identity.
    #[error("identity must not be empty")]
    BlankIdentity,

    /// A move was dropped.
    #[error(transparent)]
    IllegalMove(#[from] IllegalMove),

    /// A chat line was refused.
    #[error(transparent)]
    Chat(#[from] ChatError),
}

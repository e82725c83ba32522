//! Wire protocol for the tic-tac-toe room server.
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`Board`], etc.): the
//!   named events and payloads that travel between browser and server.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those events become
//!   bytes and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing so.
//!
//! The protocol layer knows nothing about sockets or rooms; it only
//! describes what a frame looks like.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientEvent) → Room (state machine)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Audience, Board, Cell, ChatEntry, ClientEvent, GameResult, Identity,
    Mark, RoomId, ServerEvent, BOARD_SIZE,
};

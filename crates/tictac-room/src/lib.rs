//! Authoritative tic-tac-toe rooms.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns the
//! room's game and the set of connections watching it.
//!
//! # Key types
//!
//! - [`rules::winner`]: win detection over the eight lines
//! - [`Game`]: per-room state machine
//! - [`RoomRegistry`]: creates rooms on first join and routes every request
//! - [`Dispatcher`]: delivers events to the sender or the whole room
//! - [`RoomConfig`]: chat limit and queue depth

mod chat;
mod config;
mod dispatch;
mod error;
mod game;
mod registry;
mod room;
pub mod rules;

pub use chat::ChatError;
pub use config::RoomConfig;
pub use dispatch::{send_to, Dispatcher, EventSender, Origin, Outbound};
pub use error::RoomError;
pub use game::{Game, IllegalMove, JoinOutcome, Phase, ROOM_FULL_MESSAGE};
pub use registry::RoomRegistry;
pub use room::RoomHandle;

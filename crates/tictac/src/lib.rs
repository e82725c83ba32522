//! # Tictac
//!
//! Authoritative multiplayer tic-tac-toe over WebSockets.
//!
//! Browsers join named rooms, take turns placing marks, and chat. The
//! server owns every board: clients only send requests, and each room
//! broadcasts the outcome to everyone watching it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tictac::prelude::*;
//!
//! # async fn start() -> Result<(), TictacError> {
//! let server = TictacServer::builder()
//!     .bind("0.0.0.0:4000")
//!     .room_config(RoomConfig::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::TictacError;
pub use server::{
    TictacServer, TictacServerBuilder, DEFAULT_BIND_ADDR, DEFAULT_HANDSHAKE_TIMEOUT,
};

pub use tictac_protocol as protocol;
pub use tictac_room as room;
pub use tictac_transport as transport;

/// Everything needed to start a server.
pub mod prelude {
    pub use crate::{TictacError, TictacServer, TictacServerBuilder};
    pub use tictac_protocol::{
        ClientEvent, GameResult, Identity, Mark, RoomId, ServerEvent,
    };
    pub use tictac_room::RoomConfig;
}

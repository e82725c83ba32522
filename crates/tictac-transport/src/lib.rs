//! Connection layer for the tic-tac-toe room server.
//!
//! The rest of the workspace treats a client as an abstract bidirectional
//! channel: something that yields inbound frames and accepts outbound ones.
//! [`Transport`] hands out new peers, [`Incoming`] turns a peer into a
//! channel, and [`Connection`] is one channel.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketIncoming, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

/// Server-assigned identifier for one client connection.
///
/// Identities in this server are self-asserted strings, so two sockets may
/// claim the same name. The connection id is what actually tells them apart
/// when a room decides who should receive an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
///
/// Accepting is split in two. [`accept`](Self::accept) only takes the raw
/// socket off the listener and must return promptly; the protocol
/// handshake happens later in [`Incoming::handshake`], on the peer's own
/// task, so a peer that stalls mid-handshake never holds up the next
/// accept.
pub trait Transport: Send + Sync + 'static {
    /// A peer that has connected but not finished its handshake.
    type Incoming: Incoming<Connection = Self::Connection, Error = Self::Error>;
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next peer to connect.
    async fn accept(&mut self) -> Result<Self::Incoming, Self::Error>;

    /// Returns the address the transport is listening on.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// An accepted peer whose handshake is still pending.
pub trait Incoming: Send + 'static {
    /// The connection this peer becomes once the handshake completes.
    type Connection: Connection;
    /// The error type for the handshake.
    type Error: std::error::Error + Send + Sync;

    /// Completes the handshake. Callers should bound this with a timeout.
    async fn handshake(self) -> Result<Self::Connection, Self::Error>;

    /// Returns the remote address of the peer.
    fn peer_addr(&self) -> SocketAddr;
}

/// A single client channel that can send and receive frames.
///
/// Sending and receiving must be usable concurrently from different tasks:
/// the server reads inbound events on one task while a writer task pushes
/// room broadcasts on another.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

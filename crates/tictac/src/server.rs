//! `TictacServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room.

use std::sync::Arc;
use std::time::Duration;

use tictac_protocol::{Codec, JsonCodec};
use tictac_room::{RoomConfig, RoomRegistry};
use tictac_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::TictacError;

/// Address used when [`TictacServerBuilder::bind`] is never called.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:4000";

/// How long a new socket gets to complete its WebSocket upgrade.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared server state passed to each connection handler task.
///
/// There is exactly one registry per server; every handler sees it
/// through this `Arc`.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: RoomRegistry,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a server.
///
/// # Example
///
/// ```rust,no_run
/// use tictac::prelude::*;
///
/// # async fn start() -> Result<(), TictacError> {
/// let server = TictacServer::builder()
///     .bind("0.0.0.0:4000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct TictacServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    handshake_timeout: Duration,
}

impl TictacServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            room_config: RoomConfig::default(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration every room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets how long a new socket may take to finish its upgrade before
    /// it is dropped.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Binds the listener and creates the room registry.
    ///
    /// Frames are JSON over WebSocket.
    pub async fn build(self) -> Result<TictacServer<JsonCodec>, TictacError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: RoomRegistry::new(self.room_config),
            codec: JsonCodec,
        });

        Ok(TictacServer {
            transport,
            state,
            handshake_timeout: self.handshake_timeout,
        })
    }
}

impl Default for TictacServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound tic-tac-toe server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TictacServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
    handshake_timeout: Duration,
}

impl TictacServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> TictacServerBuilder {
        TictacServerBuilder::new()
    }
}

impl<C: Codec> TictacServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Number of rooms created since the server started.
    pub fn room_count(&self) -> usize {
        self.state.registry.room_count()
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task per accepted socket before any handshake
    /// traffic, so a slow peer only ever stalls its own task. A failed
    /// accept is logged and the loop carries on; it only ends with the
    /// process.
    pub async fn run(mut self) -> Result<(), TictacError> {
        tracing::info!(
            addr = ?self.transport.local_addr().ok(),
            "tic-tac-toe server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(incoming) => {
                    let state = Arc::clone(&self.state);
                    let handshake_timeout = self.handshake_timeout;
                    tokio::spawn(async move {
                        let result =
                            handle_connection(incoming, state, handshake_timeout)
                                .await;
                        if let Err(e) = result {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

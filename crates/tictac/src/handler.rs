//! Per-connection handler: decode inbound events and route them to rooms.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task that drains the connection's outbound queue onto
//! the socket. Rooms push events onto that queue and never wait on the
//! socket themselves.

use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tictac_protocol::{ClientEvent, Codec, RoomId, ServerEvent};
use tictac_room::{JoinOutcome, Origin};
use tictac_transport::{
    Connection, ConnectionId, Incoming, TransportError, WebSocketConnection,
    WebSocketIncoming,
};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::TictacError;

/// Drop guard that takes a connection out of every room it joined.
///
/// Runs even if the handler panics. `Drop` is synchronous, so the leaves
/// go out on a fire-and-forget task. Seats are left as they are.
struct MembershipGuard<C: Codec> {
    conn_id: ConnectionId,
    rooms: HashSet<RoomId>,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for MembershipGuard<C> {
    fn drop(&mut self) {
        if self.rooms.is_empty() {
            return;
        }
        let conn_id = self.conn_id;
        let rooms = std::mem::take(&mut self.rooms);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            for room_id in rooms {
                if let Err(e) = state.registry.leave(&room_id, conn_id).await {
                    tracing::debug!(%conn_id, %room_id, error = %e, "leave failed");
                }
            }
        });
    }
}

/// Handles a single connection from accept to close.
///
/// The upgrade runs here rather than in the accept loop and is bounded by
/// `handshake_timeout`.
pub(crate) async fn handle_connection<C: Codec>(
    incoming: WebSocketIncoming,
    state: Arc<ServerState<C>>,
    handshake_timeout: Duration,
) -> Result<(), TictacError> {
    let peer = incoming.peer_addr();
    let conn = match tokio::time::timeout(
        handshake_timeout,
        incoming.handshake(),
    )
    .await
    {
        Ok(Ok(conn)) => conn,
        Ok(Err(e)) => {
            tracing::debug!(%peer, error = %e, "handshake failed");
            return Err(e.into());
        }
        Err(_) => {
            tracing::debug!(%peer, "handshake timed out");
            return Err(TransportError::HandshakeFailed(io::Error::new(
                io::ErrorKind::TimedOut,
                "handshake timed out",
            ))
            .into());
        }
    };

    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::info!(%conn_id, "connection opened");

    let (tx, rx) = mpsc::unbounded_channel();
    let origin = Origin::new(conn_id, tx);
    let writer = tokio::spawn(write_events(
        Arc::clone(&conn),
        Arc::clone(&state),
        rx,
    ));

    let mut guard = MembershipGuard {
        conn_id,
        rooms: HashSet::new(),
        state: Arc::clone(&state),
    };

    let outcome = loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed");
                break Ok(());
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break Err(TictacError::Transport(e));
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode event");
                continue;
            }
        };

        route(&state, &origin, &mut guard.rooms, event).await;
    };

    // Rooms hold clones of the queue until the leaves land, so the
    // writer would otherwise outlive the socket.
    writer.abort();
    drop(guard);
    outcome
}

/// Sends one request to the registry and logs anything it refused.
///
/// Refusals the client should see have already been queued by the room;
/// everything else is a silent no-op on the wire.
async fn route<C: Codec>(
    state: &ServerState<C>,
    origin: &Origin,
    rooms: &mut HashSet<RoomId>,
    event: ClientEvent,
) {
    let conn_id = origin.conn_id;
    let registry = &state.registry;

    match event {
        ClientEvent::JoinRoom { identity, room_id } => {
            match registry.join(&room_id, identity, origin.clone()).await {
                Ok(JoinOutcome::Full) => {
                    rooms.remove(&room_id);
                }
                Ok(_) => {
                    rooms.insert(room_id);
                }
                Err(e) => {
                    tracing::debug!(%conn_id, %room_id, error = %e, "join refused");
                }
            }
        }
        ClientEvent::MakeMove {
            room_id,
            row,
            col,
            identity,
        } => {
            let result = registry
                .make_move(&room_id, identity, row, col, origin.clone())
                .await;
            if let Err(e) = result {
                tracing::debug!(%conn_id, %room_id, row, col, error = %e, "move dropped");
            }
        }
        ClientEvent::ResetGame { room_id } => {
            if let Err(e) = registry.reset(&room_id, origin.clone()).await {
                tracing::debug!(%conn_id, %room_id, error = %e, "reset dropped");
            }
        }
        ClientEvent::SendMessage {
            room_id,
            identity,
            text,
        } => {
            let result = registry
                .chat(&room_id, identity, text, origin.clone())
                .await;
            if let Err(e) = result {
                tracing::debug!(%conn_id, %room_id, error = %e, "chat refused");
            }
        }
    }
}

/// Drains the outbound queue onto the socket until either side closes.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    let conn_id = conn.id();
    while let Some(event) = rx.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

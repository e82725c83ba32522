//! Broadcast dispatcher: turns a transition's outbound event into
//! deliveries on the right connections.
//!
//! Delivery is fire-and-forget. Each connection owns an unbounded queue
//! drained by its own writer task, so pushing onto a queue never waits on
//! the network. A queue whose receiver is gone (client disconnected) is
//! skipped and the rest of the audience still gets the event.

use std::collections::HashMap;

use tictac_protocol::{Audience, ServerEvent};
use tictac_transport::ConnectionId;
use tokio::sync::mpsc;

/// Queue feeding one connection's writer task.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// An event together with who should receive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub audience: Audience,
    pub event: ServerEvent,
}

impl Outbound {
    /// Addressed to the requesting connection only.
    pub fn to_sender(event: ServerEvent) -> Self {
        Self {
            audience: Audience::Sender,
            event,
        }
    }

    /// Addressed to everyone joined to the room.
    pub fn to_room(event: ServerEvent) -> Self {
        Self {
            audience: Audience::Room,
            event,
        }
    }
}

/// The connection a request arrived on.
#[derive(Debug, Clone)]
pub struct Origin {
    pub conn_id: ConnectionId,
    pub sender: EventSender,
}

impl Origin {
    pub fn new(conn_id: ConnectionId, sender: EventSender) -> Self {
        Self { conn_id, sender }
    }
}

/// The set of connections joined to one room.
#[derive(Debug, Default)]
pub struct Dispatcher {
    channels: HashMap<ConnectionId, EventSender>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the room's audience. Re-subscribing replaces
    /// the stored queue.
    pub fn subscribe(&mut self, origin: &Origin) {
        self.channels.insert(origin.conn_id, origin.sender.clone());
    }

    /// Removes a connection. Returns `false` if it wasn't subscribed.
    pub fn unsubscribe(&mut self, conn_id: ConnectionId) -> bool {
        self.channels.remove(&conn_id).is_some()
    }

    pub fn contains(&self, conn_id: ConnectionId) -> bool {
        self.channels.contains_key(&conn_id)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Delivers `outbound` to its audience. `origin` is the connection the
    /// triggering request came from.
    pub fn dispatch(&self, origin: &Origin, outbound: Outbound) {
        match outbound.audience {
            Audience::Sender => send_to(origin.conn_id, &origin.sender, outbound.event),
            Audience::Room => {
                for (conn_id, sender) in &self.channels {
                    send_to(*conn_id, sender, outbound.event.clone());
                }
            }
        }
    }
}

/// Pushes one event onto one connection's queue, ignoring a closed queue.
pub fn send_to(conn_id: ConnectionId, sender: &EventSender, event: ServerEvent) {
    if sender.send(event).is_err() {
        tracing::trace!(%conn_id, "dropping event for closed connection");
    }
}

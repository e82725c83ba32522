//! The room registry: sole owner of every room in the process.
//!
//! Rooms are keyed by their client-chosen [`RoomId`] and live until the
//! process exits; nothing is ever removed. The map is a sharded
//! [`DashMap`], so looking up one room never waits on traffic for
//! another. The map only hands out [`RoomHandle`]s; every read or write of
//! a room's state goes through that room's actor.

use dashmap::DashMap;
use tictac_protocol::{Identity, RoomId};
use tictac_transport::ConnectionId;

use crate::chat::ChatError;
use crate::dispatch::{self, Origin};
use crate::room::{spawn_room, RoomHandle};
use crate::{Game, JoinOutcome, RoomConfig, RoomError};

/// Maps room names to their actors.
///
/// Construct one per server and share it behind an `Arc`.
pub struct RoomRegistry {
    rooms: DashMap<RoomId, RoomHandle>,
    config: RoomConfig,
}

impl RoomRegistry {
    /// Creates an empty registry whose rooms use `config`.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: DashMap::new(),
            config,
        }
    }

    /// Joins `identity` to a room, creating it if nobody has joined it yet.
    ///
    /// Racing first joins for the same name resolve to a single actor;
    /// whichever join that actor processes first creates the room.
    pub async fn join(
        &self,
        room_id: &RoomId,
        identity: Identity,
        origin: Origin,
    ) -> Result<JoinOutcome, RoomError> {
        if identity.is_empty() {
            return Err(RoomError::BlankIdentity);
        }
        self.get_or_spawn(room_id).join(origin, identity).await
    }

    /// Applies a move. Anything invalid comes back as an error and
    /// nothing is sent to any client.
    pub async fn make_move(
        &self,
        room_id: &RoomId,
        identity: Identity,
        row: usize,
        col: usize,
        origin: Origin,
    ) -> Result<(), RoomError> {
        self.existing(room_id)?
            .make_move(origin, identity, row, col)
            .await
    }

    /// Resets a room's board. An unknown room is a silent no-op.
    pub async fn reset(
        &self,
        room_id: &RoomId,
        origin: Origin,
    ) -> Result<(), RoomError> {
        self.existing(room_id)?.reset(origin).await
    }

    /// Broadcasts a chat line, or reports a chat-error to the sender.
    pub async fn chat(
        &self,
        room_id: &RoomId,
        identity: Identity,
        text: String,
        origin: Origin,
    ) -> Result<(), RoomError> {
        match self.handle(room_id) {
            Some(handle) => handle.chat(origin, identity, text).await,
            None => {
                let refusal = ChatError::RoomNotFound;
                let outbound = refusal.to_outbound();
                dispatch::send_to(origin.conn_id, &origin.sender, outbound.event);
                Err(refusal.into())
            }
        }
    }

    /// Stops delivering `room_id`'s events to `conn_id`.
    pub async fn leave(
        &self,
        room_id: &RoomId,
        conn_id: ConnectionId,
    ) -> Result<(), RoomError> {
        self.existing(room_id)?.leave(conn_id).await
    }

    /// Inspection hook: runs `f` on a room's current state inside its
    /// actor, after every command queued before it.
    ///
    /// Read-only, and never creates a room; returns `None` if the room does
    /// not exist. State changes go through [`join`](Self::join),
    /// [`make_move`](Self::make_move), [`reset`](Self::reset) and
    /// [`chat`](Self::chat), which each apply their mutation and dispatch
    /// the resulting events in one step.
    pub async fn with_room<R, F>(&self, room_id: &RoomId, f: F) -> Option<R>
    where
        F: FnOnce(&Game) -> R + Send + 'static,
        R: Send + 'static,
    {
        let handle = self.handle(room_id)?;
        handle.with_game(f).await.ok().flatten()
    }

    /// A copy of a room's current state.
    pub async fn snapshot(&self, room_id: &RoomId) -> Option<Game> {
        self.with_room(room_id, Game::clone).await
    }

    /// Number of rooms ever created.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Clones the handle out so no shard lock is held across an await.
    fn handle(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }

    fn existing(&self, room_id: &RoomId) -> Result<RoomHandle, RoomError> {
        self.handle(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    fn get_or_spawn(&self, room_id: &RoomId) -> RoomHandle {
        if let Some(handle) = self.handle(room_id) {
            return handle;
        }
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| spawn_room(room_id.clone(), self.config.clone()))
            .value()
            .clone()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}

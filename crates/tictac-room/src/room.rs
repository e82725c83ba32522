//! Room actor: an isolated Tokio task that owns one room.
//!
//! The actor is the only code that ever touches its [`Game`] and its
//! audience. Commands arrive on an mpsc queue and run one at a time, each
//! to completion (validate, mutate, dispatch, reply) before the next is
//! read. Concurrent requests for the same room are therefore applied in
//! queue order, and nobody can see a half-applied move.

use chrono::Utc;
use tictac_protocol::{Identity, RoomId};
use tictac_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::chat::{self, ChatError};
use crate::dispatch::{Dispatcher, Origin};
use crate::{Game, JoinOutcome, RoomConfig, RoomError};

/// A read-only look at the game, run inside the actor.
type Inspect = Box<dyn FnOnce(Option<&Game>) + Send>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        origin: Origin,
        identity: Identity,
        reply: oneshot::Sender<JoinOutcome>,
    },
    Move {
        origin: Origin,
        identity: Identity,
        row: usize,
        col: usize,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Reset {
        origin: Origin,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Chat {
        origin: Origin,
        identity: Identity,
        text: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    /// A connection went away; stop delivering to it.
    Leave { conn_id: ConnectionId },
    Inspect(Inspect),
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub async fn join(
        &self,
        origin: Origin,
        identity: Identity,
    ) -> Result<JoinOutcome, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            origin,
            identity,
            reply,
        })
        .await?;
        rx.await.map_err(|_| self.unavailable())
    }

    pub async fn make_move(
        &self,
        origin: Origin,
        identity: Identity,
        row: usize,
        col: usize,
    ) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Move {
            origin,
            identity,
            row,
            col,
            reply,
        })
        .await?;
        rx.await.map_err(|_| self.unavailable())?
    }

    pub async fn reset(&self, origin: Origin) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Reset { origin, reply }).await?;
        rx.await.map_err(|_| self.unavailable())?
    }

    pub async fn chat(
        &self,
        origin: Origin,
        identity: Identity,
        text: String,
    ) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Chat {
            origin,
            identity,
            text,
            reply,
        })
        .await?;
        rx.await.map_err(|_| self.unavailable())?
    }

    /// Removes a connection from the audience (fire-and-forget).
    pub async fn leave(&self, conn_id: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomCommand::Leave { conn_id }).await
    }

    /// Runs `f` against the current game inside the actor, so it sees
    /// exactly the state left by the last completed command.
    /// `Ok(None)` if no join has been applied yet.
    pub async fn with_game<R, F>(&self, f: F) -> Result<Option<R>, RoomError>
    where
        F: FnOnce(&Game) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let inspect: Inspect = Box::new(move |game: Option<&Game>| {
            let _ = reply.send(game.map(f));
        });
        self.send(RoomCommand::Inspect(inspect)).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    config: RoomConfig,
    /// `None` until the first join lands.
    game: Option<Game>,
    dispatcher: Dispatcher,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Processes commands until every handle is dropped.
    async fn run(mut self) {
        tracing::debug!(room_id = %self.room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    origin,
                    identity,
                    reply,
                } => {
                    let outcome = self.handle_join(&origin, identity);
                    let _ = reply.send(outcome);
                }
                RoomCommand::Move {
                    origin,
                    identity,
                    row,
                    col,
                    reply,
                } => {
                    let result =
                        self.handle_move(&origin, &identity, row, col);
                    let _ = reply.send(result);
                }
                RoomCommand::Reset { origin, reply } => {
                    let _ = reply.send(self.handle_reset(&origin));
                }
                RoomCommand::Chat {
                    origin,
                    identity,
                    text,
                    reply,
                } => {
                    let result = self.handle_chat(&origin, identity, &text);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { conn_id } => {
                    if self.dispatcher.unsubscribe(conn_id) {
                        tracing::debug!(
                            room_id = %self.room_id,
                            %conn_id,
                            audience = self.dispatcher.len(),
                            "connection left room"
                        );
                        if self.dispatcher.is_empty() {
                            tracing::debug!(
                                room_id = %self.room_id,
                                "room has no audience left"
                            );
                        }
                    }
                }
                RoomCommand::Inspect(inspect) => inspect(self.game.as_ref()),
            }
        }

        tracing::debug!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        origin: &Origin,
        identity: Identity,
    ) -> JoinOutcome {
        let Some(game) = &mut self.game else {
            tracing::info!(
                room_id = %self.room_id,
                %identity,
                "room created"
            );
            let (game, outbound) = Game::create(&self.room_id, identity);
            self.game = Some(game);
            self.dispatcher.subscribe(origin);
            self.dispatcher.dispatch(origin, outbound);
            return JoinOutcome::Created;
        };

        let (outcome, outbound) = game.join(identity.clone());
        match outcome {
            JoinOutcome::Seated => {
                // Subscribe first so the new player sees game-start too.
                self.dispatcher.subscribe(origin);
                tracing::info!(
                    room_id = %self.room_id,
                    %identity,
                    "game started"
                );
            }
            JoinOutcome::Full => {
                self.dispatcher.unsubscribe(origin.conn_id);
                tracing::debug!(
                    room_id = %self.room_id,
                    %identity,
                    "join rejected, room full"
                );
            }
            JoinOutcome::Created => {}
        }
        self.dispatcher.dispatch(origin, outbound);
        outcome
    }

    fn handle_move(
        &mut self,
        origin: &Origin,
        identity: &Identity,
        row: usize,
        col: usize,
    ) -> Result<(), RoomError> {
        let game = self
            .game
            .as_mut()
            .ok_or_else(|| RoomError::NotFound(self.room_id.clone()))?;
        let outbound = game.apply_move(identity, row, col)?;
        if game.result().is_terminal() {
            tracing::info!(
                room_id = %self.room_id,
                result = ?game.result(),
                "game finished"
            );
        }
        self.dispatcher.dispatch(origin, outbound);
        Ok(())
    }

    fn handle_reset(&mut self, origin: &Origin) -> Result<(), RoomError> {
        let game = self
            .game
            .as_mut()
            .ok_or_else(|| RoomError::NotFound(self.room_id.clone()))?;
        let outbound = game.reset();
        tracing::debug!(room_id = %self.room_id, "game reset");
        self.dispatcher.dispatch(origin, outbound);
        Ok(())
    }

    fn handle_chat(
        &mut self,
        origin: &Origin,
        identity: Identity,
        text: &str,
    ) -> Result<(), RoomError> {
        let result = if self.game.is_some() {
            chat::compose(
                &self.room_id,
                identity,
                text,
                self.config.max_chat_chars,
                Utc::now(),
            )
        } else {
            Err(ChatError::RoomNotFound)
        };

        match result {
            Ok(outbound) => {
                self.dispatcher.dispatch(origin, outbound);
                Ok(())
            }
            Err(e) => {
                self.dispatcher.dispatch(origin, e.to_outbound());
                Err(e.into())
            }
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
///
/// The actor starts without a game; the first join creates it.
pub(crate) fn spawn_room(room_id: RoomId, config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.command_buffer.max(1));

    let actor = RoomActor {
        room_id: room_id.clone(),
        config,
        game: None,
        dispatcher: Dispatcher::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}

//! The per-room game state machine.
//!
//! ```text
//! Waiting ──(second join)──→ Playable ──(win / draw)──→ Terminal
//!    ↑                          ↑                          │
//!    └──────────(reset)─────────┴──────────(reset)─────────┘
//! ```
//!
//! A [`Game`] only exists once someone has joined, so there is no
//! "empty room" state. Every transition returns the [`Outbound`] event it
//! produces; rejected moves return an [`IllegalMove`] and leave the game
//! untouched.

use std::fmt;

use tictac_protocol::{
    Board, Cell, GameResult, Identity, Mark, RoomId, ServerEvent, BOARD_SIZE,
};

use crate::dispatch::Outbound;
use crate::rules;

/// Text sent with a room-full rejection.
pub const ROOM_FULL_MESSAGE: &str = "Room is full. Please join another room.";

/// Derived lifecycle phase of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Seat 1 is still open.
    Waiting,
    /// Both seats filled, no result yet.
    Playable,
    /// Won or drawn. Only a reset moves on from here.
    Terminal,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Playable => write!(f, "Playable"),
            Self::Terminal => write!(f, "Terminal"),
        }
    }
}

/// What a join did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The room did not exist; the caller now holds seat 0.
    Created,
    /// The caller took seat 1 and the game started.
    Seated,
    /// Both seats were already taken.
    Full,
}

/// Why a move was dropped. Never reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMove {
    #[error("game is not in a playable state")]
    NotPlayable,
    #[error("not your turn")]
    NotYourTurn,
    #[error("row and col must be 0-2")]
    OutOfBounds,
    #[error("cell is occupied")]
    Occupied,
}

/// Authoritative state of one room's match.
///
/// Seats are permanent: `host` filled seat 0 when the room was created,
/// `guest` fills seat 1 once and is never vacated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    host: Identity,
    guest: Option<Identity>,
    current_player: Identity,
    result: GameResult,
    move_count: u8,
}

impl Game {
    /// Creates the game for a room nobody has joined yet. The creator
    /// holds seat 0 and is told, alone, that the room exists.
    pub fn create(room_id: &RoomId, creator: Identity) -> (Self, Outbound) {
        let game = Self {
            board: Board::default(),
            current_player: creator.clone(),
            host: creator,
            guest: None,
            result: GameResult::InProgress,
            move_count: 0,
        };
        let outbound = Outbound::to_sender(ServerEvent::RoomCreated {
            room_id: room_id.clone(),
        });
        (game, outbound)
    }

    /// A further join: seat the caller if seat 1 is open, otherwise
    /// reject with room-full.
    ///
    /// No uniqueness check: the host may take seat 1 as well.
    pub fn join(&mut self, identity: Identity) -> (JoinOutcome, Outbound) {
        if self.guest.is_some() {
            let outbound = Outbound::to_sender(ServerEvent::RoomFull {
                message: ROOM_FULL_MESSAGE.to_owned(),
            });
            return (JoinOutcome::Full, outbound);
        }

        self.guest = Some(identity);
        let outbound = Outbound::to_room(ServerEvent::GameStart {
            board: self.board,
            players: self.players(),
            current_player: self.current_player.clone(),
        });
        (JoinOutcome::Seated, outbound)
    }

    /// Places `identity`'s mark at `(row, col)`.
    ///
    /// On a win the turn does not pass; `current_player` stays with the
    /// winner until a reset.
    pub fn apply_move(
        &mut self,
        identity: &Identity,
        row: usize,
        col: usize,
    ) -> Result<Outbound, IllegalMove> {
        if self.phase() != Phase::Playable {
            return Err(IllegalMove::NotPlayable);
        }
        if *identity != self.current_player {
            return Err(IllegalMove::NotYourTurn);
        }
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(IllegalMove::OutOfBounds);
        }
        if !self.board[row][col].is_empty() {
            return Err(IllegalMove::Occupied);
        }
        let seat = self.seat_of(identity).ok_or(IllegalMove::NotYourTurn)?;
        let mark = Mark::for_seat(seat);

        self.board[row][col] = Cell::from(mark);
        self.move_count += 1;

        // Only the mark just placed can have completed a line.
        if let Some(winning) = rules::winner(&self.board) {
            self.result = GameResult::Won {
                winner: identity.clone(),
                mark: winning,
            };
        } else if usize::from(self.move_count) == BOARD_SIZE * BOARD_SIZE {
            self.result = GameResult::Draw;
        } else if let Some(next) = self.seat_identity(1 - seat) {
            self.current_player = next.clone();
        }

        Ok(Outbound::to_room(ServerEvent::MoveApplied {
            board: self.board,
            current_player: self.current_player.clone(),
            result: self.result.clone(),
            is_draw: self.result == GameResult::Draw,
        }))
    }

    /// Clears the board and gives seat 0 the first move. Seats are kept.
    ///
    /// Accepted in every phase, mid-game included.
    pub fn reset(&mut self) -> Outbound {
        self.board = Board::default();
        self.move_count = 0;
        self.result = GameResult::InProgress;
        self.current_player = self.host.clone();

        Outbound::to_room(ServerEvent::GameReset {
            board: self.board,
            current_player: self.current_player.clone(),
            result: self.result.clone(),
        })
    }

    pub fn phase(&self) -> Phase {
        if self.result.is_terminal() {
            Phase::Terminal
        } else if self.guest.is_some() {
            Phase::Playable
        } else {
            Phase::Waiting
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Seat 0 then seat 1; an open seat is `None`.
    pub fn players(&self) -> [Option<Identity>; 2] {
        [Some(self.host.clone()), self.guest.clone()]
    }

    pub fn current_player(&self) -> &Identity {
        &self.current_player
    }

    pub fn result(&self) -> &GameResult {
        &self.result
    }

    pub fn move_count(&self) -> u8 {
        self.move_count
    }

    /// First seat held by `identity`. Seat 0 wins if it holds both.
    pub fn seat_of(&self, identity: &Identity) -> Option<usize> {
        if *identity == self.host {
            Some(0)
        } else if self.guest.as_ref() == Some(identity) {
            Some(1)
        } else {
            None
        }
    }

    fn seat_identity(&self, seat: usize) -> Option<&Identity> {
        match seat {
            0 => Some(&self.host),
            _ => self.guest.as_ref(),
        }
    }
}

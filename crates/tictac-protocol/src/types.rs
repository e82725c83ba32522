//! Types that travel on the wire.
//!
//! Every frame is one named event with a payload, encoded as adjacently
//! tagged JSON:
//!
//! ```text
//! {"event": "make-move", "data": {"roomId": "r1", "row": 0, "col": 2, "identity": "alice"}}
//! ```
//!
//! Event names are kebab-case and payload fields camelCase, which is what
//! browser clients expect.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Client-chosen name of a room. Opaque to the server; any string works.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player's self-asserted name.
///
/// Nothing is authenticated: two connections may present the same identity
/// and the server will believe both.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Identity(pub String);

impl Identity {
    /// `true` for the empty string, which is never a valid identity.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Side length of the board.
pub const BOARD_SIZE: usize = 3;

/// The symbol a seat places. Seat 0 always plays `X`, seat 1 always `O`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The mark bound to a seat index. Anything but seat 0 plays `O`.
    pub fn for_seat(seat: usize) -> Self {
        if seat == 0 { Self::X } else { Self::O }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::O => f.write_str("O"),
        }
    }
}

/// One square of the board. Empty squares go over the wire as `""`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum Cell {
    #[default]
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Cell {
    /// Returns the mark in this cell, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Self::Empty => None,
            Self::X => Some(Mark::X),
            Self::O => Some(Mark::O),
        }
    }

    /// `true` if nothing has been placed here.
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

impl From<Mark> for Cell {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Self::X,
            Mark::O => Self::O,
        }
    }
}

/// Row-major 3×3 grid: `board[row][col]`.
pub type Board = [[Cell; BOARD_SIZE]; BOARD_SIZE];

/// How a game stands.
///
/// Serialized as an object tagged by `status`:
/// `{"status":"won","winner":"alice","mark":"X"}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum GameResult {
    #[default]
    InProgress,
    /// Three of `mark` in a line, placed by `winner`.
    Won { winner: Identity, mark: Mark },
    /// All nine cells filled with no line.
    Draw,
}

impl GameResult {
    /// `true` once the game has been won or drawn.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// The winning identity, if the game was won.
    pub fn winner(&self) -> Option<&Identity> {
        match self {
            Self::Won { winner, .. } => Some(winner),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A chat line as broadcast to a room. Never stored by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub identity: Identity,
    /// Already trimmed of surrounding whitespace.
    pub text: String,
    /// Assigned by the server when the line is accepted.
    pub timestamp: DateTime<Utc>,
    pub room_id: RoomId,
}

// ---------------------------------------------------------------------------
// Audience
// ---------------------------------------------------------------------------

/// Who an outbound event is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Only the connection whose request produced the event.
    Sender,
    /// Every connection currently joined to the room, sender included.
    Room,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Create the room, take its second seat, or be told it is full.
    #[serde(rename_all = "camelCase")]
    JoinRoom { identity: Identity, room_id: RoomId },

    /// Place the caller's mark at `(row, col)`.
    #[serde(rename_all = "camelCase")]
    MakeMove {
        room_id: RoomId,
        row: usize,
        col: usize,
        identity: Identity,
    },

    /// Clear the board and hand the first move back to seat 0.
    #[serde(rename_all = "camelCase")]
    ResetGame { room_id: RoomId },

    /// Say something to everyone in the room.
    ///
    /// A missing or `null` text decodes as empty so it is refused as an
    /// empty message instead of as a malformed frame.
    #[serde(rename_all = "camelCase")]
    SendMessage {
        room_id: RoomId,
        identity: Identity,
        #[serde(default, deserialize_with = "null_as_empty")]
        text: String,
    },
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// To the creator only: the room now exists and waits for an opponent.
    #[serde(rename_all = "camelCase")]
    RoomCreated { room_id: RoomId },

    /// To the room: both seats are filled.
    #[serde(rename_all = "camelCase")]
    GameStart {
        board: Board,
        players: [Option<Identity>; 2],
        current_player: Identity,
    },

    /// To the room: a move was accepted.
    #[serde(rename_all = "camelCase")]
    MoveApplied {
        board: Board,
        current_player: Identity,
        result: GameResult,
        is_draw: bool,
    },

    /// To the room: the board was cleared.
    #[serde(rename_all = "camelCase")]
    GameReset {
        board: Board,
        current_player: Identity,
        result: GameResult,
    },

    /// To the rejected joiner only.
    RoomFull { message: String },

    /// To the room: a chat line.
    NewMessage(ChatEntry),

    /// To the sender only: the chat line was refused.
    ChatError { message: String },
}

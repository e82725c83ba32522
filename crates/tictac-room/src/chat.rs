//! Chat validation.
//!
//! Chat lines are not part of a room's state: an accepted line is
//! stamped, broadcast once, and forgotten.

use chrono::{DateTime, Utc};
use tictac_protocol::{ChatEntry, Identity, RoomId, ServerEvent};

use crate::dispatch::Outbound;

/// Why a chat line was refused. The `Display` text is what the sender sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Room not found!")]
    RoomNotFound,
    #[error("Message cannot be empty!")]
    Empty,
    #[error("Message too long! (max {max} characters)")]
    TooLong { max: usize },
}

impl ChatError {
    /// The chat-error event reporting this refusal to its sender.
    pub fn to_outbound(&self) -> Outbound {
        Outbound::to_sender(ServerEvent::ChatError {
            message: self.to_string(),
        })
    }
}

/// Trims and checks a chat line, producing the broadcast for the room.
///
/// Length is counted in characters after trimming.
pub fn compose(
    room_id: &RoomId,
    identity: Identity,
    text: &str,
    max_chars: usize,
    now: DateTime<Utc>,
) -> Result<Outbound, ChatError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ChatError::Empty);
    }
    if text.chars().count() > max_chars {
        return Err(ChatError::TooLong { max: max_chars });
    }

    Ok(Outbound::to_room(ServerEvent::NewMessage(ChatEntry {
        identity,
        text: text.to_owned(),
        timestamp: now,
        room_id: room_id.clone(),
    })))
}

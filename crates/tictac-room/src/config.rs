//! Room configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by every room in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Longest accepted chat line, in characters after trimming.
    pub max_chat_chars: usize,

    /// Depth of each room actor's command queue. When a room falls this
    /// far behind, callers wait for space instead of piling up work.
    pub command_buffer: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_chat_chars: 200,
            command_buffer: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.max_chat_chars, 200);
        assert_eq!(config.command_buffer, 64);
    }
}

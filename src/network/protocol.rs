//! Protocol Messages
//!
//! Wire format for the town socket. All messages are serialized as JSON
//! text frames, with optional binary (bincode) helpers for tooling.
//! The transport itself is out of scope; these shapes are the contract.

use serde::{Deserialize, Serialize};

use crate::game::audio::NoteIntent;
use crate::game::movement::PlayerLocation;
use crate::game::roster::{PlayerId, PlayerInfo};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from the town client to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// The local player's location changed.
    Movement(PlayerLocation),

    /// The local player pressed a piano key.
    PlayNote(NoteIntent),

    /// The local player released a piano key.
    StopNote(NoteIntent),
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from the backend to the town client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// The roster changed; payload is the full current snapshot.
    PlayersChanged {
        /// Every currently-connected player.
        players: Vec<PlayerInfo>,
    },

    /// A remote player moved.
    Movement {
        /// The moving player.
        player_id: PlayerId,
        /// Their new location.
        location: PlayerLocation,
    },

    /// A remote player pressed a piano key.
    PlayNote(NoteIntent),

    /// A remote player released a piano key.
    StopNote(NoteIntent),
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl NoteIntent {
    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::input::Direction;

    fn location() -> PlayerLocation {
        PlayerLocation {
            x: 120.5,
            y: 64.0,
            rotation: Direction::Left,
            moving: true,
        }
    }

    #[test]
    fn test_movement_json_shape() {
        let msg = ClientMessage::Movement(location());
        let json = msg.to_json().unwrap();

        assert!(json.contains("\"type\":\"movement\""));
        assert!(json.contains("\"rotation\":\"left\""));
        assert!(json.contains("\"moving\":true"));

        let parsed = ClientMessage::from_json(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_play_note_json_shape() {
        let msg = ClientMessage::PlayNote(NoteIntent::new("C4", PlayerId::new([7; 16])));
        let json = msg.to_json().unwrap();

        assert!(json.contains("\"type\":\"playNote\""));
        assert!(json.contains("\"note\":\"C4\""));
        assert!(json.contains("\"playerId\""));

        let parsed = ClientMessage::from_json(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_stop_note_roundtrip() {
        let msg = ServerMessage::StopNote(NoteIntent::new("A#5", PlayerId::new([2; 16])));
        let parsed = ServerMessage::from_json(&msg.to_json().unwrap()).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_players_changed_roundtrip() {
        let msg = ServerMessage::PlayersChanged {
            players: vec![PlayerInfo {
                player_id: PlayerId::new([3; 16]),
                user_name: "ada".to_string(),
                location: PlayerLocation::at(Vec2::new(10.0, 20.0)),
            }],
        };

        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"playersChanged\""));
        assert!(json.contains("\"userName\":\"ada\""));

        let parsed = ServerMessage::from_json(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_remote_movement_roundtrip() {
        let msg = ServerMessage::Movement {
            player_id: PlayerId::new([4; 16]),
            location: location(),
        };
        let parsed = ServerMessage::from_json(&msg.to_json().unwrap()).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_binary_note_intent_roundtrip() {
        // Tagged message enums stay JSON-only; flat intents round-trip
        // through bincode for tooling.
        let intent = NoteIntent::new("C4", PlayerId::new([9; 16]));
        let bytes = intent.to_bytes().unwrap();
        let parsed = NoteIntent::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, intent);
    }
}

//! Player Roster
//!
//! The set of known remote players. Each inbound roster snapshot replaces
//! the set wholesale; the scene layer reacts to the resulting join/leave
//! diff by creating presence and purging dependent overlap/audio state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::movement::PlayerLocation;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random id.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

// =============================================================================
// ROSTER
// =============================================================================

/// Roster entry for a remote player.
#[derive(Clone, Debug)]
pub struct RemotePlayer {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub user_name: String,
    /// Last known location, owned by roster sync and read-only to the
    /// simulation core.
    pub location: PlayerLocation,
    /// When this player first appeared in a snapshot.
    pub joined_at: DateTime<Utc>,
}

/// One player's entry in a roster snapshot, as carried on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    /// Player identifier.
    pub player_id: PlayerId,
    /// Display name.
    pub user_name: String,
    /// Current location.
    pub location: PlayerLocation,
}

/// Join/leave difference produced by applying a snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RosterDiff {
    /// Players the snapshot introduced.
    pub joined: Vec<PlayerId>,
    /// Players the snapshot dropped.
    pub left: Vec<PlayerId>,
}

/// The known remote players, keyed by id.
#[derive(Debug, Default)]
pub struct Roster {
    players: BTreeMap<PlayerId, RemotePlayer>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of known players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Whether a player is known.
    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    /// Look up a player.
    pub fn get(&self, id: &PlayerId) -> Option<&RemotePlayer> {
        self.players.get(id)
    }

    /// Iterate players in id order.
    pub fn iter(&self) -> impl Iterator<Item = &RemotePlayer> {
        self.players.values()
    }

    /// Replace the roster with a snapshot, returning the join/leave diff.
    ///
    /// Existing players keep their `joined_at` stamp and take the
    /// snapshot's name and location.
    pub fn apply(&mut self, snapshot: &[PlayerInfo]) -> RosterDiff {
        let mut diff = RosterDiff::default();

        let left: Vec<PlayerId> = self
            .players
            .keys()
            .filter(|id| !snapshot.iter().any(|info| info.player_id == **id))
            .copied()
            .collect();
        for id in &left {
            self.players.remove(id);
        }
        diff.left = left;

        for info in snapshot {
            match self.players.get_mut(&info.player_id) {
                Some(existing) => {
                    existing.user_name = info.user_name.clone();
                    existing.location = info.location;
                }
                None => {
                    self.players.insert(
                        info.player_id,
                        RemotePlayer {
                            id: info.player_id,
                            user_name: info.user_name.clone(),
                            location: info.location,
                            joined_at: Utc::now(),
                        },
                    );
                    diff.joined.push(info.player_id);
                }
            }
        }

        diff
    }

    /// Apply a movement update for one player.
    ///
    /// Returns false when the player is unknown (late-arriving update for
    /// an already-removed player; ignored by policy).
    pub fn update_location(&mut self, id: &PlayerId, location: PlayerLocation) -> bool {
        match self.players.get_mut(id) {
            Some(player) => {
                player.location = location;
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;

    fn info(byte: u8, name: &str) -> PlayerInfo {
        PlayerInfo {
            player_id: PlayerId::new([byte; 16]),
            user_name: name.to_string(),
            location: PlayerLocation::at(Vec2::new(byte as f32, 0.0)),
        }
    }

    #[test]
    fn test_apply_initial_snapshot_joins_everyone() {
        let mut roster = Roster::new();
        let diff = roster.apply(&[info(1, "ada"), info(2, "grace")]);

        assert_eq!(diff.joined.len(), 2);
        assert!(diff.left.is_empty());
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_apply_diff_joins_and_leaves() {
        let mut roster = Roster::new();
        roster.apply(&[info(1, "ada"), info(2, "grace")]);

        let diff = roster.apply(&[info(2, "grace"), info(3, "edsger")]);
        assert_eq!(diff.joined, vec![PlayerId::new([3; 16])]);
        assert_eq!(diff.left, vec![PlayerId::new([1; 16])]);
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_apply_updates_existing_location() {
        let mut roster = Roster::new();
        roster.apply(&[info(1, "ada")]);
        let joined_at = roster.get(&PlayerId::new([1; 16])).unwrap().joined_at;

        let mut updated = info(1, "ada");
        updated.location.x = 500.0;
        let diff = roster.apply(&[updated]);

        assert!(diff.joined.is_empty() && diff.left.is_empty());
        let player = roster.get(&PlayerId::new([1; 16])).unwrap();
        assert_eq!(player.location.x, 500.0);
        assert_eq!(player.joined_at, joined_at);
    }

    #[test]
    fn test_update_location_unknown_player_ignored() {
        let mut roster = Roster::new();
        let applied = roster.update_location(
            &PlayerId::new([9; 16]),
            PlayerLocation::at(Vec2::ZERO),
        );
        assert!(!applied);
    }

    #[test]
    fn test_player_id_uuid_roundtrip() {
        let id = PlayerId::random();
        let s = id.to_uuid_string();
        assert_eq!(PlayerId::from_uuid_str(&s), Some(id));
        assert_eq!(PlayerId::from_uuid_str("not-a-uuid"), None);
    }
}

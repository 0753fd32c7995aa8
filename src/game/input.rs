//! Input Capture and Resolution
//!
//! Reduces the pressed-key state of several simultaneously-active binding
//! sets into a single movement direction, and tracks which key codes the
//! simulation currently traps away from the surrounding UI.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// =============================================================================
// KEY CODES
// =============================================================================

/// Numeric key code as delivered by the embedding shell.
///
/// Values follow the browser keyCode convention so authored capture lists
/// survive the trip through the shell unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    /// Space bar (interact key).
    pub const SPACE: KeyCode = KeyCode(32);
    /// Left arrow.
    pub const ARROW_LEFT: KeyCode = KeyCode(37);
    /// Up arrow.
    pub const ARROW_UP: KeyCode = KeyCode(38);
    /// Right arrow.
    pub const ARROW_RIGHT: KeyCode = KeyCode(39);
    /// Down arrow.
    pub const ARROW_DOWN: KeyCode = KeyCode(40);
    /// Letter A.
    pub const A: KeyCode = KeyCode(65);
    /// Letter D.
    pub const D: KeyCode = KeyCode(68);
    /// Letter H.
    pub const H: KeyCode = KeyCode(72);
    /// Letter J.
    pub const J: KeyCode = KeyCode(74);
    /// Letter K.
    pub const K: KeyCode = KeyCode(75);
    /// Letter L.
    pub const L: KeyCode = KeyCode(76);
    /// Letter M (mute toggle).
    pub const M: KeyCode = KeyCode(77);
    /// Letter S.
    pub const S: KeyCode = KeyCode(83);
    /// Letter W.
    pub const W: KeyCode = KeyCode(87);
}

/// Facing and movement direction.
///
/// `Front` faces the camera (moves down the map), `Back` faces away
/// (moves up). Doubles as the rotation field of a player location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Facing/moving left (-X).
    Left,
    /// Facing/moving right (+X).
    Right,
    /// Facing the camera, moving down (+Y).
    Front,
    /// Facing away, moving up (-Y).
    Back,
}

impl Direction {
    /// Resolution priority, checked first-to-last with first match winning.
    ///
    /// Must stay exactly `left, right, front, back`: simultaneous
    /// opposite-direction holds resolve to `left`/`front` over
    /// `right`/`back`.
    pub const PRIORITY: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Front,
        Direction::Back,
    ];
}

// =============================================================================
// PRESSED-KEY STATE
// =============================================================================

/// The set of keys currently held down, fed by the embedding shell.
#[derive(Clone, Debug, Default)]
pub struct KeyStates {
    down: BTreeSet<KeyCode>,
}

impl KeyStates {
    /// Create an empty pressed-key state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press.
    pub fn press(&mut self, key: KeyCode) {
        self.down.insert(key);
    }

    /// Record a key release.
    pub fn release(&mut self, key: KeyCode) {
        self.down.remove(&key);
    }

    /// Check whether a key is currently held.
    #[inline]
    pub fn is_down(&self, key: KeyCode) -> bool {
        self.down.contains(&key)
    }

    /// Release every held key.
    pub fn clear(&mut self) {
        self.down.clear();
    }
}

// =============================================================================
// BINDING SETS
// =============================================================================

/// One directional key-binding set.
///
/// Several sets are active at once; any set holding a direction counts as
/// that direction being held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorBinding {
    /// Key moving the player left.
    pub left: KeyCode,
    /// Key moving the player right.
    pub right: KeyCode,
    /// Key moving the player up the map.
    pub up: KeyCode,
    /// Key moving the player down the map.
    pub down: KeyCode,
}

impl CursorBinding {
    /// The cursor-arrow binding set.
    pub const fn arrows() -> Self {
        Self {
            left: KeyCode::ARROW_LEFT,
            right: KeyCode::ARROW_RIGHT,
            up: KeyCode::ARROW_UP,
            down: KeyCode::ARROW_DOWN,
        }
    }

    /// The WASD binding set.
    pub const fn wasd() -> Self {
        Self {
            left: KeyCode::A,
            right: KeyCode::D,
            up: KeyCode::W,
            down: KeyCode::S,
        }
    }

    /// The HJKL binding set.
    pub const fn hjkl() -> Self {
        Self {
            left: KeyCode::K,
            right: KeyCode::L,
            up: KeyCode::H,
            down: KeyCode::J,
        }
    }

    /// The binding sets active by default: arrows, WASD, HJKL.
    pub fn default_sets() -> Vec<CursorBinding> {
        vec![Self::arrows(), Self::wasd(), Self::hjkl()]
    }

    /// The key this set assigns to a movement direction.
    #[inline]
    pub fn key_for(&self, direction: Direction) -> KeyCode {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
            Direction::Front => self.down,
            Direction::Back => self.up,
        }
    }
}

/// Resolve the held keys of every active binding set into one direction.
///
/// Checked in the fixed priority `left, right, front, back`; first match
/// wins regardless of which binding set supplied it. Returns `None` when
/// no direction is held in any set. Pure function of the current key state.
pub fn resolve_direction(bindings: &[CursorBinding], keys: &KeyStates) -> Option<Direction> {
    for direction in Direction::PRIORITY {
        if bindings
            .iter()
            .any(|set| keys.is_down(set.key_for(direction)))
        {
            return Some(direction);
        }
    }
    None
}

// =============================================================================
// INPUT CAPTURES
// =============================================================================

/// Key codes currently trapped by the simulation.
///
/// A captured key does not reach the surrounding UI. Pausing for a modal
/// interaction snapshots and clears this set so keystrokes fall through to
/// the modal; resuming restores the exact snapshot.
#[derive(Clone, Debug, Default)]
pub struct InputCaptures {
    captured: BTreeSet<KeyCode>,
}

impl InputCaptures {
    /// Create an empty capture set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The capture set the town scene installs at startup: the movement
    /// arrows plus the interact key.
    pub fn town_defaults() -> Self {
        let mut captures = Self::new();
        for key in [
            KeyCode::SPACE,
            KeyCode::ARROW_UP,
            KeyCode::ARROW_DOWN,
            KeyCode::ARROW_LEFT,
            KeyCode::ARROW_RIGHT,
        ] {
            captures.capture(key);
        }
        captures
    }

    /// Trap a key code.
    pub fn capture(&mut self, key: KeyCode) {
        self.captured.insert(key);
    }

    /// Check whether a key is currently trapped.
    pub fn is_captured(&self, key: KeyCode) -> bool {
        self.captured.contains(&key)
    }

    /// Snapshot the currently trapped key codes.
    pub fn snapshot(&self) -> Vec<KeyCode> {
        self.captured.iter().copied().collect()
    }

    /// Release every trapped key.
    pub fn clear(&mut self) {
        self.captured.clear();
    }

    /// Replace the trapped set with a previously taken snapshot.
    pub fn restore(&mut self, snapshot: &[KeyCode]) {
        self.captured = snapshot.iter().copied().collect();
    }

    /// Number of trapped keys.
    pub fn len(&self) -> usize {
        self.captured.len()
    }

    /// Whether no key is trapped.
    pub fn is_empty(&self) -> bool {
        self.captured.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Interaction Lock
//!
//! Two-state machine (RUNNING / PAUSED) gating the simulation tick across
//! modal interactions. Pausing snapshots the captured input bindings and
//! clears them so keystrokes fall through to the modal; resuming restores
//! exactly the snapshot. Both transitions are idempotent.

use crate::game::input::{InputCaptures, KeyCode};

/// The paused/running gate for the per-frame simulation.
#[derive(Debug, Default)]
pub struct InteractionLock {
    paused: bool,
    saved_captures: Vec<KeyCode>,
}

impl InteractionLock {
    /// Create a running lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the simulation is currently suspended.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The capture snapshot taken at pause time. Empty while running.
    pub fn saved_captures(&self) -> &[KeyCode] {
        &self.saved_captures
    }

    /// Transition RUNNING -> PAUSED.
    ///
    /// Snapshots the captured bindings and clears the capture set. A no-op
    /// returning false when already paused.
    pub fn pause(&mut self, captures: &mut InputCaptures) -> bool {
        if self.paused {
            return false;
        }
        self.paused = true;
        self.saved_captures = captures.snapshot();
        captures.clear();
        true
    }

    /// Transition PAUSED -> RUNNING.
    ///
    /// Restores exactly the captures snapshotted at pause time (which may
    /// legitimately be empty) and clears the snapshot. A no-op returning
    /// false when already running.
    pub fn resume(&mut self, captures: &mut InputCaptures) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        captures.restore(&self.saved_captures);
        self.saved_captures = Vec::new();
        true
    }
}

// =============================================================================
// TESTS
// =============================================================================

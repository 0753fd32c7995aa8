//! Overlap Exit Tracking
//!
//! A registry of one-shot callbacks that fire when the player's bounds
//! stop overlapping a registered interactable zone. This is how "leaving a
//! conversation or viewing area" is detected without polling from outside
//! the simulation loop.

use std::collections::BTreeMap;

use crate::core::rect::Rect;
use crate::game::roster::PlayerId;
use crate::game::zone::{InteractableZone, ZoneId};

/// Callback invoked exactly once when the zone is exited.
pub type ExitCallback = Box<dyn FnOnce()>;

struct Registration {
    /// The player this registration concerns (purged without firing if
    /// that player leaves the roster).
    player: PlayerId,
    on_exit: ExitCallback,
}

/// Arena of zone ids mapped to pending exit-callback slots.
///
/// Keyed by id rather than by zone reference so recreated zones carry no
/// lifetime ambiguity.
#[derive(Default)]
pub struct OverlapTracker {
    pending: BTreeMap<ZoneId, Registration>,
}

impl OverlapTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the exit callback for a zone.
    ///
    /// Replacing drops the prior callback without firing it.
    pub fn register(
        &mut self,
        zone: ZoneId,
        player: PlayerId,
        on_exit: impl FnOnce() + 'static,
    ) {
        self.pending.insert(
            zone,
            Registration {
                player,
                on_exit: Box::new(on_exit),
            },
        );
    }

    /// Whether a zone currently has a pending registration.
    pub fn is_registered(&self, zone: ZoneId) -> bool {
        self.pending.contains_key(&zone)
    }

    /// Number of pending registrations.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no registration is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Re-check every registered zone against the player's bounds.
    ///
    /// Registrations whose zone no longer intersects the bounds (or whose
    /// zone has disappeared from the catalog) are removed and their
    /// callback fired exactly once. Returns the zone ids that fired.
    pub fn sweep(&mut self, bounds: &Rect, zones: &[InteractableZone]) -> Vec<ZoneId> {
        let exited: Vec<ZoneId> = self
            .pending
            .keys()
            .filter(|zone_id| {
                !zones
                    .iter()
                    .find(|zone| zone.id == **zone_id)
                    .is_some_and(|zone| zone.bounds.intersects(bounds))
            })
            .copied()
            .collect();

        for zone_id in &exited {
            if let Some(registration) = self.pending.remove(zone_id) {
                (registration.on_exit)();
            }
        }

        exited
    }

    /// Drop every registration concerning a player, without firing.
    ///
    /// Returns the number of registrations removed.
    pub fn purge_player(&mut self, player: &PlayerId) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|_, registration| registration.player != *player);
        before - self.pending.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

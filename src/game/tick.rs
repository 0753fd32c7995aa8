//! Simulation Tick
//!
//! One execution of the per-frame loop: the interaction lock gates the
//! whole tick, input resolves to a single direction, movement produces the
//! canonical location (emitting only on change), and the overlap tracker
//! re-checks zone membership against the updated bounds.

use crate::game::input::resolve_direction;
use crate::game::movement::{CollisionResolver, PlayerLocation};
use crate::game::scene::{SceneError, TownScene};
use crate::game::zone::ZoneId;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Location snapshot to emit, when the canonical record changed.
    pub movement: Option<PlayerLocation>,
    /// Zones whose exit callbacks fired this tick.
    pub zone_exits: Vec<ZoneId>,
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `scene` - The town scene (will be mutated)
/// * `resolver` - External collision resolution for the movement step
/// * `dt` - Frame duration in seconds
///
/// While the scene is paused this returns immediately without touching any
/// simulation state: overlap membership is frozen, not merely movement.
pub fn tick(
    scene: &mut TownScene,
    resolver: &dyn CollisionResolver,
    dt: f32,
) -> Result<TickResult, SceneError> {
    let mut result = TickResult::default();

    // The interaction lock is the sole suspension point.
    if scene.lock.is_paused() {
        return Ok(result);
    }

    // 1. Resolve held keys into a single intended direction.
    let direction = resolve_direction(&scene.bindings, &scene.keys);

    // 2. Advance movement; emits only when the canonical record changed.
    result.movement = scene.movement.step(direction, resolver, dt)?;

    // 3. Re-check overlap exits against the updated bounds.
    if let Some(bounds) = scene.player_bounds() {
        result.zone_exits = scene.overlap.sweep(&bounds, &scene.zones);
    }

    Ok(result)
}

// =============================================================================
// TESTS
// =============================================================================

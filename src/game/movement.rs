//! Local Player Movement
//!
//! Turns the resolved input direction into velocity, hands integration to
//! the collision collaborator, and maintains the canonical network-visible
//! location record, emitting it only when a field actually changed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::vec2::Vec2;
use crate::game::input::Direction;

/// Canonical, network-visible placement of a player.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerLocation {
    /// X position in map pixels.
    pub x: f32,
    /// Y position in map pixels.
    pub y: f32,
    /// Facing direction.
    pub rotation: Direction,
    /// Whether the player is currently moving.
    pub moving: bool,
}

impl PlayerLocation {
    /// A stationary, camera-facing location at the given point.
    pub fn at(position: Vec2) -> Self {
        Self {
            x: position.x,
            y: position.y,
            rotation: Direction::Front,
            moving: false,
        }
    }

    /// Position as a vector.
    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Movement precondition failures. Programmer errors, not retried.
#[derive(Debug, Error)]
pub enum MovementError {
    /// The simulator ran before the local player's presence was created.
    #[error("cannot move the local player before their presence exists")]
    PresenceMissing,
}

/// External collision resolution.
///
/// This core decides *intended* velocity only; the collaborator integrates
/// one tick of movement and returns the collision-corrected position.
pub trait CollisionResolver {
    /// Integrate `velocity` over `dt` seconds from `from`, applying
    /// whatever collision response the map demands.
    fn resolve(&self, from: Vec2, velocity: Vec2, dt: f32) -> Vec2;
}

/// Unobstructed resolver: plain integration, no collision response.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenField;

impl CollisionResolver for OpenField {
    fn resolve(&self, from: Vec2, velocity: Vec2, dt: f32) -> Vec2 {
        from.add(velocity.scale(dt))
    }
}

/// Per-tick movement simulation for the local player.
pub struct MovementSimulator {
    speed: f32,
    position: Option<Vec2>,
    velocity: Vec2,
    idle_facing: Direction,
    last_location: Option<PlayerLocation>,
}

impl MovementSimulator {
    /// Create a simulator moving at `speed` map pixels per second.
    ///
    /// The player has no presence until [`spawn`](Self::spawn) runs.
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            position: None,
            velocity: Vec2::ZERO,
            idle_facing: Direction::Front,
            last_location: None,
        }
    }

    /// Whether the player's presence exists yet.
    pub fn has_presence(&self) -> bool {
        self.position.is_some()
    }

    /// Current position, if presence exists.
    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    /// Current velocity.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// The pose to show while idle, derived from the last nonzero velocity.
    pub fn idle_pose(&self) -> Direction {
        self.idle_facing
    }

    /// The last emitted location, if any tick or placement produced one.
    pub fn last_location(&self) -> Option<&PlayerLocation> {
        self.last_location.as_ref()
    }

    /// Establish the player's presence at a spawn point.
    pub fn spawn(&mut self, at: Vec2) {
        self.position = Some(at);
    }

    /// Place the player at an explicit location (spawn or teleport) and
    /// return the location record to emit.
    ///
    /// Fails when presence has not been established yet.
    pub fn place(&mut self, destination: PlayerLocation) -> Result<PlayerLocation, MovementError> {
        if self.position.is_none() {
            return Err(MovementError::PresenceMissing);
        }
        self.position = Some(destination.position());
        self.last_location = Some(destination);
        Ok(destination)
    }

    /// Zero the velocity (used when the interaction lock pauses movement).
    pub fn halt(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    /// Run one movement tick.
    ///
    /// Applies the resolved direction to velocity, caps diagonal speed,
    /// lets the collision collaborator produce the corrected position, and
    /// returns `Some(location)` only when the canonical record changed
    /// (the first tick ever synthesizes an initial snapshot).
    pub fn step(
        &mut self,
        direction: Option<Direction>,
        resolver: &dyn CollisionResolver,
        dt: f32,
    ) -> Result<Option<PlayerLocation>, MovementError> {
        let position = self.position.ok_or(MovementError::PresenceMissing)?;

        // Remember the outgoing velocity for the idle pose, then stop any
        // movement left over from the previous tick.
        let prev_velocity = self.velocity;
        self.velocity = Vec2::ZERO;

        match direction {
            Some(Direction::Left) => self.velocity.x = -self.speed,
            Some(Direction::Right) => self.velocity.x = self.speed,
            Some(Direction::Front) => self.velocity.y = self.speed,
            Some(Direction::Back) => self.velocity.y = -self.speed,
            None => {
                // Idle: pick the facing pose from where we were heading.
                if prev_velocity.x < 0.0 {
                    self.idle_facing = Direction::Left;
                } else if prev_velocity.x > 0.0 {
                    self.idle_facing = Direction::Right;
                } else if prev_velocity.y < 0.0 {
                    self.idle_facing = Direction::Back;
                } else if prev_velocity.y > 0.0 {
                    self.idle_facing = Direction::Front;
                }
            }
        }

        // Normalize and rescale so a diagonal combination (impossible under
        // the priority resolver, tolerated here anyway) never exceeds the
        // configured speed.
        if self.velocity != Vec2::ZERO {
            self.velocity = self.velocity.normalize_to(self.speed);
        }

        let resolved = resolver.resolve(position, self.velocity, dt);
        self.position = Some(resolved);

        let moving = direction.is_some();
        let rotation = direction
            .or(self.last_location.map(|loc| loc.rotation))
            .unwrap_or(Direction::Front);
        let current = PlayerLocation {
            x: resolved.x,
            y: resolved.y,
            rotation,
            moving,
        };

        let changed = match self.last_location {
            None => true,
            Some(last) => last != current,
        };

        if changed {
            self.last_location = Some(current);
            Ok(Some(current))
        } else {
            Ok(None)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

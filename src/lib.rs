//! # Plaza Simulation Core
//!
//! Per-frame local simulation for a shared virtual town: players move
//! around a tile map, enter proximity-triggered interactable zones, and
//! hear distance-attenuated piano notes from other players.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       PLAZA SIM CORE                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Geometry primitives                      │
//! │  ├── vec2.rs     - Float 2D vector                          │
//! │  └── rect.rs     - Axis-aligned bounds                      │
//! │                                                              │
//! │  game/           - Simulation (single-threaded, per-frame)  │
//! │  ├── input.rs    - Binding sets, priority resolution        │
//! │  ├── movement.rs - Canonical location, change-detected emit │
//! │  ├── zone.rs     - Typed interactable catalog               │
//! │  ├── overlap.rs  - One-shot zone exit callbacks             │
//! │  ├── lock.rs     - Paused/running interaction lock          │
//! │  ├── audio.rs    - Proximity gain, mute gating              │
//! │  ├── roster.rs   - Remote players                           │
//! │  ├── events.rs   - Local visual-effect signals              │
//! │  ├── scene.rs    - Scene aggregate + ready latch            │
//! │  └── tick.rs     - The per-frame tick                       │
//! │                                                              │
//! │  network/        - Message shapes + socket pump             │
//! │  ├── protocol.rs - Tagged JSON wire messages                │
//! │  └── client.rs   - Async WebSocket pump                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling Model
//!
//! The simulation is single-threaded and frame-driven: one tick per
//! rendered frame, gated solely by the interaction lock. Inbound network
//! events are drained at the top of each frame and applied to completion
//! before the tick runs, so the tick always observes the most recently
//! applied remote state without locking.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::core::rect::Rect;
pub use crate::core::vec2::Vec2;
pub use game::audio::{DistanceBand, NoteIntent, PlayDecision, ProximityAudioMixer};
pub use game::input::{resolve_direction, CursorBinding, Direction, KeyCode, KeyStates};
pub use game::movement::{CollisionResolver, MovementSimulator, OpenField, PlayerLocation};
pub use game::roster::{PlayerId, PlayerInfo, Roster};
pub use game::scene::{SceneConfig, SceneError, TownScene};
pub use game::tick::{tick, TickResult};
pub use network::protocol::{ClientMessage, ServerMessage};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Player movement speed (map pixels per second)
pub const PLAYER_SPEED: f32 = 300.0;

/// Player bounds width (map pixels)
pub const PLAYER_BOUNDS_WIDTH: f32 = 30.0;

/// Player bounds height (map pixels)
pub const PLAYER_BOUNDS_HEIGHT: f32 = 40.0;

/// Distance at or below which piano notes play at full volume
pub const MIN_FULL_VOLUME_DISTANCE: f32 = 50.0;

/// Distance at or beyond which piano notes are inaudible
pub const MAX_AUDIBLE_DISTANCE: f32 = 400.0;

/// Fixed position of the shared piano on the town map
pub const PIANO_POSITION: Vec2 = Vec2::new(2187.0, 1033.0);

/// Distance within which the piano overlay can be opened
pub const PIANO_INTERACT_RADIUS: f32 = 100.0;

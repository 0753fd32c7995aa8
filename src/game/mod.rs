//! Simulation Core
//!
//! The per-frame local simulation and interaction-coordination loop.
//!
//! ## Module Structure
//!
//! - `input`: key codes, binding sets, fixed-priority direction resolution
//! - `movement`: local player movement and the canonical location record
//! - `zone`: typed interactable-zone catalog parsed from the map
//! - `overlap`: one-shot zone exit callbacks
//! - `lock`: the paused/running interaction lock
//! - `audio`: proximity gain, mute gating, live channel ledger
//! - `roster`: known remote players
//! - `events`: local signal bus for visual effects
//! - `scene`: the long-lived scene aggregate
//! - `tick`: the per-frame tick function

pub mod audio;
pub mod events;
pub mod input;
pub mod lock;
pub mod movement;
pub mod overlap;
pub mod roster;
pub mod scene;
pub mod tick;
pub mod zone;

// Re-export key types
pub use audio::{AudioOutput, DistanceBand, NoteIntent, PlayDecision, ProximityAudioMixer};
pub use events::{ListenerHandle, SceneEvent, SignalBus};
pub use input::{resolve_direction, CursorBinding, Direction, InputCaptures, KeyCode, KeyStates};
pub use lock::InteractionLock;
pub use movement::{CollisionResolver, MovementSimulator, OpenField, PlayerLocation};
pub use overlap::OverlapTracker;
pub use roster::{PlayerId, PlayerInfo, RemotePlayer, Roster};
pub use scene::{ReadyLatch, SceneConfig, SceneError, TownScene};
pub use tick::{tick, TickResult};
pub use zone::{InteractableZone, MapObject, ZoneId, ZoneKind};

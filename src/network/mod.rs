//! Network Layer
//!
//! Message shapes for the town socket and a thin async pump around the
//! transport. Everything stateful lives in `game/`; this layer only
//! carries messages.

pub mod client;
pub mod protocol;

pub use client::{InboundQueue, SocketPump};
pub use protocol::{ClientMessage, ServerMessage};

use tracing::warn;

use crate::game::scene::TownScene;

/// Route one inbound server message into the scene.
///
/// Runtime audio errors are reported and absorbed here; the frame loop
/// never aborts over a late stop.
pub fn dispatch(scene: &mut TownScene, message: ServerMessage) {
    match message {
        ServerMessage::PlayersChanged { players } => {
            scene.handle_players_changed(&players);
        }
        ServerMessage::Movement {
            player_id,
            location,
        } => {
            scene.handle_remote_movement(&player_id, location);
        }
        ServerMessage::PlayNote(intent) => {
            scene.handle_play_note(&intent);
        }
        ServerMessage::StopNote(intent) => {
            if scene.handle_stop_note(&intent).is_err() {
                // Already reported by the scene; keep the loop alive.
                warn!("dropped stop intent for note '{}'", intent.note);
            }
        }
    }
}

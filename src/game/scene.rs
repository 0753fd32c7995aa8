//! Town Scene State
//!
//! The long-lived aggregate owning everything the per-frame loop touches:
//! key bindings and captures, the interaction lock, the local movement
//! simulator, the overlap tracker, the zone catalog, the roster, the
//! proximity mixer, and the local signal bus. Created once per scene and
//! torn down with `shutdown`, which must leave no listener behind.

use thiserror::Error;
use tracing::{debug, error, info};

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::audio::{
    AudioError, AudioOutput, DistanceBand, NoteIntent, PlayDecision, ProximityAudioMixer,
    StopDecision,
};
use crate::game::events::{ListenerHandle, SceneEvent, SignalBus};
use crate::game::input::{CursorBinding, InputCaptures, KeyCode, KeyStates};
use crate::game::lock::InteractionLock;
use crate::game::movement::{MovementError, MovementSimulator, PlayerLocation};
use crate::game::overlap::OverlapTracker;
use crate::game::roster::{PlayerId, PlayerInfo, Roster};
use crate::game::zone::{
    find_spawn_point, parse_interactables, InteractableZone, MapObject, ZoneError, ZoneId,
};

/// Scene-level failures.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Movement precondition failure.
    #[error(transparent)]
    Movement(#[from] MovementError),

    /// Object-layer configuration failure.
    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// Scene-dependent state accessed before initialization finished.
    #[error("scene accessed before initialization finished")]
    NotReady,
}

/// Policy constants for one scene.
#[derive(Clone, Copy, Debug)]
pub struct SceneConfig {
    /// Movement speed in map pixels per second.
    pub speed: f32,
    /// Player bounds width.
    pub player_width: f32,
    /// Player bounds height.
    pub player_height: f32,
    /// Audio falloff window.
    pub band: DistanceBand,
    /// Fixed position of the shared piano.
    pub piano_position: Vec2,
    /// Distance within which the piano can be opened.
    pub piano_interact_radius: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            speed: crate::PLAYER_SPEED,
            player_width: crate::PLAYER_BOUNDS_WIDTH,
            player_height: crate::PLAYER_BOUNDS_HEIGHT,
            band: DistanceBand::default(),
            piano_position: crate::PIANO_POSITION,
            piano_interact_radius: crate::PIANO_INTERACT_RADIUS,
        }
    }
}

// =============================================================================
// READY LATCH
// =============================================================================

/// Initialization barrier.
///
/// Continuations queued before the scene is ready are released exactly
/// once when it becomes ready; later subscribers run immediately.
#[derive(Default)]
pub struct ReadyLatch {
    ready: bool,
    waiters: Vec<Box<dyn FnOnce()>>,
}

impl ReadyLatch {
    /// Create an unreleased latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the latch has been released.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Run `continuation` once the latch releases (immediately if it
    /// already has).
    pub fn on_ready(&mut self, continuation: impl FnOnce() + 'static) {
        if self.ready {
            continuation();
        } else {
            self.waiters.push(Box::new(continuation));
        }
    }

    /// Release the latch, draining queued continuations exactly once.
    pub fn mark_ready(&mut self) {
        if self.ready {
            return;
        }
        self.ready = true;
        for waiter in self.waiters.drain(..) {
            waiter();
        }
    }
}

// =============================================================================
// SCENE
// =============================================================================

/// The shared-town scene for one local player.
pub struct TownScene {
    pub(crate) config: SceneConfig,
    pub(crate) local_player: PlayerId,
    pub(crate) bindings: Vec<CursorBinding>,
    pub(crate) keys: KeyStates,
    pub(crate) captures: InputCaptures,
    pub(crate) lock: InteractionLock,
    pub(crate) movement: MovementSimulator,
    pub(crate) overlap: OverlapTracker,
    pub(crate) zones: Vec<InteractableZone>,
    pub(crate) roster: Roster,
    pub(crate) mixer: ProximityAudioMixer,
    pub(crate) signals: SignalBus,
    pub(crate) ready: ReadyLatch,
    pub(crate) piano_overlay_active: bool,
}

impl TownScene {
    /// Create an uninitialized scene for the local player.
    pub fn new(local_player: PlayerId, config: SceneConfig) -> Self {
        let mixer =
            ProximityAudioMixer::new(local_player, config.piano_position, config.band);
        Self {
            config,
            local_player,
            bindings: Vec::new(),
            keys: KeyStates::new(),
            captures: InputCaptures::new(),
            lock: InteractionLock::new(),
            movement: MovementSimulator::new(config.speed),
            overlap: OverlapTracker::new(),
            zones: Vec::new(),
            roster: Roster::new(),
            mixer,
            signals: SignalBus::new(),
            ready: ReadyLatch::new(),
            piano_overlay_active: false,
        }
    }

    /// Finish setup from the map's object layer.
    ///
    /// Parses the zone catalog (unknown object types abort), installs the
    /// default binding sets and captures, spawns the local player at the
    /// spawn point, and releases the ready latch. Returns the initial
    /// location snapshot to emit.
    pub fn initialize(&mut self, objects: &[MapObject]) -> Result<PlayerLocation, SceneError> {
        self.zones = parse_interactables(objects)?;
        let spawn = find_spawn_point(objects)?;

        self.bindings = CursorBinding::default_sets();
        self.captures = InputCaptures::town_defaults();

        self.movement.spawn(spawn);
        let initial = self.movement.place(PlayerLocation::at(spawn))?;

        self.ready.mark_ready();
        info!(
            player = %hex_prefix(&self.local_player),
            zones = self.zones.len(),
            spawn = %spawn,
            "scene initialized"
        );
        Ok(initial)
    }

    /// The local player's id.
    pub fn local_player(&self) -> PlayerId {
        self.local_player
    }

    /// Whether initialization has finished.
    pub fn is_ready(&self) -> bool {
        self.ready.is_ready()
    }

    /// Queue a continuation for scene readiness.
    pub fn on_ready(&mut self, continuation: impl FnOnce() + 'static) {
        self.ready.on_ready(continuation);
    }

    /// The active binding sets.
    ///
    /// Fails before initialization: there are no bindings to hand out yet.
    pub fn bindings(&self) -> Result<&[CursorBinding], SceneError> {
        if !self.ready.is_ready() {
            return Err(SceneError::NotReady);
        }
        Ok(&self.bindings)
    }

    /// The parsed interactable-zone catalog.
    pub fn zones(&self) -> &[InteractableZone] {
        &self.zones
    }

    /// The remote-player roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The local player's canonical location, once placed.
    pub fn local_location(&self) -> Option<&PlayerLocation> {
        self.movement.last_location()
    }

    /// Record a key press from the embedding shell.
    pub fn key_down(&mut self, key: KeyCode) {
        self.keys.press(key);
    }

    /// Record a key release from the embedding shell.
    pub fn key_up(&mut self, key: KeyCode) {
        self.keys.release(key);
    }

    /// The local player's current bounds rectangle, once spawned.
    pub(crate) fn player_bounds(&self) -> Option<Rect> {
        self.movement.position().map(|center| {
            Rect::centered_on(center, self.config.player_width, self.config.player_height)
        })
    }

    /// Register (or replace) a one-shot exit callback for a zone.
    pub fn register_zone_exit(
        &mut self,
        zone: ZoneId,
        player: PlayerId,
        on_exit: impl FnOnce() + 'static,
    ) {
        self.overlap.register(zone, player, on_exit);
    }

    /// Whether the simulation is currently suspended.
    pub fn is_paused(&self) -> bool {
        self.lock.is_paused()
    }

    /// Suspend the simulation for a modal interaction.
    ///
    /// Idempotent: a redundant pause changes nothing.
    pub fn pause(&mut self) {
        if self.lock.pause(&mut self.captures) {
            self.movement.halt();
            debug!("scene paused");
        }
    }

    /// Resume the simulation after a modal interaction.
    ///
    /// Idempotent: a redundant resume changes nothing.
    pub fn resume(&mut self) {
        if self.lock.resume(&mut self.captures) {
            debug!("scene resumed");
        }
    }

    /// Move the local player to an explicit destination (spawn, transporter).
    ///
    /// Returns the location record to emit.
    pub fn move_local_to(
        &mut self,
        destination: PlayerLocation,
    ) -> Result<PlayerLocation, SceneError> {
        Ok(self.movement.place(destination)?)
    }

    // =========================================================================
    // Piano interaction
    // =========================================================================

    /// Try to open the piano overlay.
    ///
    /// Opens only when the local player stands within the interaction
    /// radius of the piano: pauses the scene and raises `ShowPiano`.
    /// Returns whether the overlay opened.
    pub fn try_open_piano(&mut self) -> bool {
        let Some(position) = self.movement.position() else {
            return false;
        };
        if self.piano_overlay_active {
            return false;
        }
        let distance = position.distance(self.config.piano_position);
        if distance >= self.config.piano_interact_radius {
            return false;
        }

        self.piano_overlay_active = true;
        self.pause();
        self.signals.emit(&SceneEvent::ShowPiano);
        true
    }

    /// Dismiss the piano overlay and resume the scene.
    pub fn close_piano(&mut self) {
        if !self.piano_overlay_active {
            return;
        }
        self.piano_overlay_active = false;
        self.resume();
        self.signals.emit(&SceneEvent::ClosePiano);
    }

    /// Whether the piano overlay is currently open.
    pub fn piano_overlay_active(&self) -> bool {
        self.piano_overlay_active
    }

    /// Toggle the local mute flag.
    ///
    /// Ignored while the piano overlay owns the keyboard. Returns the new
    /// status label when the toggle applied. Mute only changes local
    /// presentation and gates future play intents.
    pub fn toggle_mute(&mut self) -> Option<String> {
        if self.piano_overlay_active {
            return None;
        }
        let muted = !self.mixer.is_muted();
        self.mixer.set_muted(muted);
        Some(self.mute_label())
    }

    /// The local player's status label.
    pub fn mute_label(&self) -> String {
        if self.mixer.is_muted() {
            "(You) muted".to_string()
        } else {
            "(You) listening".to_string()
        }
    }

    // =========================================================================
    // Audio
    // =========================================================================

    /// Attach the receiver output that renders inbound notes.
    pub fn attach_audio_output(&mut self, output: Box<dyn AudioOutput>) {
        self.mixer.attach_output(output);
    }

    /// Set the receiver master volume (0.0 - 1.0).
    pub fn set_master_volume(&mut self, volume: f32) {
        self.mixer.set_master_volume(volume);
    }

    /// Whether inbound playback is locally muted.
    pub fn is_muted(&self) -> bool {
        self.mixer.is_muted()
    }

    /// Handle an inbound play intent.
    ///
    /// Visual signals fire for every in-range intent regardless of mute;
    /// playback starts only when audible.
    pub fn handle_play_note(&mut self, intent: &NoteIntent) -> PlayDecision {
        let Some(listener) = self.movement.last_location().copied() else {
            // No local placement yet: nothing to attenuate against.
            return PlayDecision::OutOfRange;
        };

        let decision = self.mixer.handle_play(intent, listener.position());
        if decision.triggers_visual() {
            self.signals.emit(&SceneEvent::PianoPlayed);
            self.signals.emit(&SceneEvent::PlayerListening {
                player_id: self.local_player,
            });
        }
        decision
    }

    /// Handle an inbound stop intent.
    ///
    /// Forwarded regardless of distance and mute. A stop without a live
    /// receiver is reported, never swallowed.
    pub fn handle_stop_note(&mut self, intent: &NoteIntent) -> Result<StopDecision, AudioError> {
        let result = self.mixer.handle_stop(intent);
        if let Err(err) = &result {
            error!(
                player = %hex_prefix(&intent.player_id),
                "stop note failed: {err}"
            );
        }
        result
    }

    // =========================================================================
    // Roster
    // =========================================================================

    /// Apply a roster snapshot, purging state for departed players.
    pub fn handle_players_changed(&mut self, snapshot: &[PlayerInfo]) {
        let diff = self.roster.apply(snapshot);

        for id in &diff.left {
            let exits = self.overlap.purge_player(id);
            let channels = self.mixer.purge_player(id);
            info!(
                player = %hex_prefix(id),
                exits,
                channels,
                "player left, purged dependent state"
            );
        }
        for id in &diff.joined {
            debug!(player = %hex_prefix(id), "player joined");
        }
    }

    /// Apply a movement update for a remote player.
    ///
    /// Updates for unknown players are ignored (late arrival for an
    /// already-removed player).
    pub fn handle_remote_movement(&mut self, id: &PlayerId, location: PlayerLocation) {
        if !self.roster.update_location(id, location) {
            debug!(player = %hex_prefix(id), "movement for unknown player ignored");
        }
    }

    // =========================================================================
    // Signals & teardown
    // =========================================================================

    /// Subscribe to local scene signals.
    pub fn subscribe(&mut self, listener: impl FnMut(&SceneEvent) + 'static) -> ListenerHandle {
        self.signals.subscribe(listener)
    }

    /// Remove a previously subscribed signal listener.
    pub fn unsubscribe(&mut self, handle: ListenerHandle) -> bool {
        self.signals.unsubscribe(handle)
    }

    /// Emit a local scene signal.
    pub fn emit(&mut self, event: &SceneEvent) {
        self.signals.emit(event);
    }

    /// Tear the scene down.
    ///
    /// Drops every signal listener and input capture registered during
    /// setup; leaking either across scene instances is a bug.
    pub fn shutdown(&mut self) {
        self.signals.clear();
        self.captures.clear();
        self.keys.clear();
        self.movement.halt();
        info!(player = %hex_prefix(&self.local_player), "scene shut down");
    }
}

/// Short hex prefix of a player id for log lines.
pub(crate) fn hex_prefix(id: &PlayerId) -> String {
    hex::encode(&id.0[..4])
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn demo_objects() -> Vec<MapObject> {
        use std::collections::BTreeMap;
        let object = |id, name: &str, object_type: &str, x, y| MapObject {
            id,
            name: name.to_string(),
            object_type: object_type.to_string(),
            x,
            y,
            width: 200.0,
            height: 150.0,
            properties: BTreeMap::new(),
        };
        vec![
            MapObject {
                width: 0.0,
                height: 0.0,
                ..object(1, crate::game::zone::SPAWN_POINT_NAME, "", 100.0, 100.0)
            },
            object(2, "Lobby Chat", "ConversationArea", 0.0, 0.0),
            object(3, "Cinema", "ViewingArea", 600.0, 0.0),
        ]
    }

    fn scene() -> TownScene {
        let mut scene = TownScene::new(PlayerId::new([1; 16]), SceneConfig::default());
        scene.initialize(&demo_objects()).unwrap();
        scene
    }

    #[test]
    fn test_initialize_emits_spawn_snapshot() {
        let mut scene = TownScene::new(PlayerId::new([1; 16]), SceneConfig::default());
        assert!(!scene.is_ready());

        let initial = scene.initialize(&demo_objects()).unwrap();
        assert!(scene.is_ready());
        assert_eq!(initial.x, 100.0);
        assert_eq!(initial.y, 100.0);
        assert!(!initial.moving);
        assert_eq!(scene.zones().len(), 2);
    }

    #[test]
    fn test_bindings_before_init_fail() {
        let scene = TownScene::new(PlayerId::new([1; 16]), SceneConfig::default());
        assert!(matches!(scene.bindings(), Err(SceneError::NotReady)));
    }

    #[test]
    fn test_ready_latch_releases_once() {
        let mut latch = ReadyLatch::new();
        let runs = Rc::new(Cell::new(0));

        let counter = runs.clone();
        latch.on_ready(move || counter.set(counter.get() + 1));
        assert_eq!(runs.get(), 0);

        latch.mark_ready();
        assert_eq!(runs.get(), 1);

        // Marking again must not re-run drained continuations.
        latch.mark_ready();
        assert_eq!(runs.get(), 1);

        // Late subscribers run immediately.
        let counter = runs.clone();
        latch.on_ready(move || counter.set(counter.get() + 1));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_piano_opens_only_in_radius() {
        let mut scene = scene();

        // Spawn is far from the piano.
        assert!(!scene.try_open_piano());
        assert!(!scene.is_paused());

        // Teleport next to the piano and try again.
        let near = PlayerLocation::at(crate::PIANO_POSITION.add(Vec2::new(50.0, 0.0)));
        scene.move_local_to(near).unwrap();
        let shown = Rc::new(Cell::new(false));
        let flag = shown.clone();
        scene.subscribe(move |event| {
            if *event == SceneEvent::ShowPiano {
                flag.set(true);
            }
        });

        assert!(scene.try_open_piano());
        assert!(scene.is_paused());
        assert!(scene.piano_overlay_active());
        assert!(shown.get());

        // Opening again while active is a no-op.
        assert!(!scene.try_open_piano());

        scene.close_piano();
        assert!(!scene.is_paused());
        assert!(!scene.piano_overlay_active());
    }

    #[test]
    fn test_pause_restores_captures_through_piano_cycle() {
        let mut scene = scene();
        let before = scene.captures.snapshot();

        scene.move_local_to(PlayerLocation::at(crate::PIANO_POSITION)).unwrap();
        scene.try_open_piano();
        assert!(scene.captures.is_empty());

        scene.close_piano();
        assert_eq!(scene.captures.snapshot(), before);
    }

    #[test]
    fn test_mute_toggle_ignored_while_overlay_active() {
        let mut scene = scene();
        assert_eq!(scene.toggle_mute().as_deref(), Some("(You) muted"));
        assert!(scene.is_muted());

        scene.move_local_to(PlayerLocation::at(crate::PIANO_POSITION)).unwrap();
        scene.try_open_piano();
        assert_eq!(scene.toggle_mute(), None);
        assert!(scene.is_muted());

        scene.close_piano();
        assert_eq!(scene.toggle_mute().as_deref(), Some("(You) listening"));
    }

    #[test]
    fn test_play_note_triggers_signals_for_visual_decisions() {
        let mut scene = scene();
        let visuals = Rc::new(Cell::new(0));
        let counter = visuals.clone();
        scene.subscribe(move |event| {
            if *event == SceneEvent::PianoPlayed {
                counter.set(counter.get() + 1);
            }
        });

        // Spawn (100,100) is far from the piano at (2187,1033): suppressed.
        let intent = NoteIntent::new("C4", PlayerId::new([2; 16]));
        assert_eq!(scene.handle_play_note(&intent), PlayDecision::OutOfRange);
        assert_eq!(visuals.get(), 0);

        // Standing at the piano: audible, visual fires.
        scene.move_local_to(PlayerLocation::at(crate::PIANO_POSITION)).unwrap();
        assert!(matches!(
            scene.handle_play_note(&intent),
            PlayDecision::Play { .. }
        ));
        assert_eq!(visuals.get(), 1);

        // Muted: visual still fires.
        scene.toggle_mute();
        assert_eq!(scene.handle_play_note(&intent), PlayDecision::VisualOnly);
        assert_eq!(visuals.get(), 2);
    }

    #[test]
    fn test_roster_departure_purges_overlap_and_audio() {
        let mut scene = scene();
        scene.move_local_to(PlayerLocation::at(crate::PIANO_POSITION)).unwrap();

        let remote = PlayerId::new([2; 16]);
        let snapshot = vec![PlayerInfo {
            player_id: remote,
            user_name: "ada".to_string(),
            location: PlayerLocation::at(Vec2::ZERO),
        }];
        scene.handle_players_changed(&snapshot);
        assert_eq!(scene.roster().len(), 1);

        // Remote player is mid-overlap and mid-note when the roster drops
        // them.
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        scene.register_zone_exit(2, remote, move || flag.set(true));
        scene.handle_play_note(&NoteIntent::new("C4", remote));

        scene.handle_players_changed(&[]);
        assert_eq!(scene.roster().len(), 0);
        assert!(!fired.get());
        assert_eq!(scene.mixer.live_note_count(&remote), 0);
        assert!(scene.overlap.is_empty());
    }

    #[test]
    fn test_remote_movement_for_unknown_player_ignored() {
        let mut scene = scene();
        // Must not panic or create a roster entry.
        scene.handle_remote_movement(&PlayerId::new([9; 16]), PlayerLocation::at(Vec2::ZERO));
        assert!(scene.roster().is_empty());
    }

    #[test]
    fn test_shutdown_drops_listeners_and_captures() {
        let mut scene = scene();
        scene.subscribe(|_| {});
        assert_eq!(scene.signals.listener_count(), 1);
        assert!(!scene.captures.is_empty());

        scene.shutdown();
        assert_eq!(scene.signals.listener_count(), 0);
        assert!(scene.captures.is_empty());
    }
}

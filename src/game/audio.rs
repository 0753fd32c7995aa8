//! Proximity Audio
//!
//! Converts emitter/listener distance into playback gain for the shared
//! piano channel. Visual-effect triggering stays decoupled from audible
//! playback: mute gates sound, never visuals, and stops are never
//! distance-gated so notes cannot stick.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::vec2::Vec2;
use crate::game::roster::PlayerId;

// =============================================================================
// INTENTS & FALLOFF
// =============================================================================

/// A play or stop action attributable to a specific emitting player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteIntent {
    /// Note name, e.g. "C4".
    pub note: String,
    /// The emitting player.
    pub player_id: PlayerId,
}

impl NoteIntent {
    /// Create an intent.
    pub fn new(note: impl Into<String>, player_id: PlayerId) -> Self {
        Self {
            note: note.into(),
            player_id,
        }
    }
}

/// The linear falloff window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceBand {
    /// Distance at or below which gain is 1.0.
    pub min_full_volume: f32,
    /// Distance at or beyond which gain is 0.0.
    pub max_audible: f32,
}

impl Default for DistanceBand {
    fn default() -> Self {
        Self {
            min_full_volume: crate::MIN_FULL_VOLUME_DISTANCE,
            max_audible: crate::MAX_AUDIBLE_DISTANCE,
        }
    }
}

impl DistanceBand {
    /// Gain for a listener at `distance` from the source.
    ///
    /// 1.0 at or below `min_full_volume`, linearly decreasing to 0.0 at
    /// `max_audible`, exactly 0.0 beyond. Non-increasing and clamped.
    pub fn gain(&self, distance: f32) -> f32 {
        if distance <= self.min_full_volume {
            return 1.0;
        }
        if distance >= self.max_audible {
            return 0.0;
        }
        1.0 - (distance - self.min_full_volume) / (self.max_audible - self.min_full_volume)
    }

    /// Whether the listener can hear the source at all.
    #[inline]
    pub fn in_range(&self, distance: f32) -> bool {
        distance <= self.max_audible
    }
}

// =============================================================================
// OUTPUT SINK
// =============================================================================

/// Sink that actually renders audio. The mixer owns policy, the output
/// owns sound.
pub trait AudioOutput {
    /// Begin sounding a note at the given gain (0.0 - 1.0).
    fn start(&mut self, note: &str, gain: f32);
    /// Release a sounding note.
    fn stop(&mut self, note: &str);
}

// =============================================================================
// MIXER
// =============================================================================

/// What an inbound play intent resolved to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayDecision {
    /// The local player's own note; bypassed entirely.
    SelfEcho,
    /// Beyond the audible band: no visual, no audio.
    OutOfRange,
    /// In range but locally muted: visual effect only.
    VisualOnly,
    /// In range and audible at the computed gain.
    Play {
        /// Playback gain, falloff times master volume.
        gain: f32,
    },
}

impl PlayDecision {
    /// Whether this decision triggers the visual effect.
    pub fn triggers_visual(&self) -> bool {
        matches!(self, PlayDecision::VisualOnly | PlayDecision::Play { .. })
    }
}

/// What an inbound stop intent resolved to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StopDecision {
    /// The local player's own note; bypassed entirely.
    SelfEcho,
    /// Released on the receiver.
    Forwarded,
}

/// Audio runtime errors. Reported, never silently swallowed.
#[derive(Debug, Error)]
pub enum AudioError {
    /// A stop arrived while no receiver output is attached.
    #[error("cannot stop note '{note}': no receiver channel is available")]
    ReceiverUnavailable {
        /// The note that could not be released.
        note: String,
    },
}

/// Distance-based gain and mute gating for the shared audio channel.
pub struct ProximityAudioMixer {
    local_player: PlayerId,
    source: Vec2,
    band: DistanceBand,
    muted: bool,
    master_volume: f32,
    output: Option<Box<dyn AudioOutput>>,
    /// Notes currently sounding, per emitting player.
    live_notes: BTreeMap<PlayerId, BTreeSet<String>>,
}

impl ProximityAudioMixer {
    /// Create a mixer for a fixed audio source position.
    pub fn new(local_player: PlayerId, source: Vec2, band: DistanceBand) -> Self {
        Self {
            local_player,
            source,
            band,
            muted: false,
            master_volume: 1.0,
            output: None,
            live_notes: BTreeMap::new(),
        }
    }

    /// Attach the receiver output that renders playback.
    pub fn attach_output(&mut self, output: Box<dyn AudioOutput>) {
        self.output = Some(output);
    }

    /// Whether a receiver output is attached.
    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    /// Whether playback is locally muted.
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Set the local mute flag. Gates future play intents only.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Set the master volume (clamped to 0.0 - 1.0), multiplied into the
    /// falloff gain of future play intents.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    /// The falloff band in effect.
    pub fn band(&self) -> DistanceBand {
        self.band
    }

    /// Count of live notes attributed to a player.
    pub fn live_note_count(&self, player: &PlayerId) -> usize {
        self.live_notes.get(player).map_or(0, |notes| notes.len())
    }

    /// Handle an inbound play intent, given the listener's stored location.
    ///
    /// Starts playback on the attached output when audible. The returned
    /// decision tells the caller whether to trigger the visual effect.
    pub fn handle_play(&mut self, intent: &NoteIntent, listener: Vec2) -> PlayDecision {
        if intent.player_id == self.local_player {
            return PlayDecision::SelfEcho;
        }

        let distance = self.source.distance(listener);
        if !self.band.in_range(distance) {
            return PlayDecision::OutOfRange;
        }

        if self.muted {
            return PlayDecision::VisualOnly;
        }

        let gain = self.band.gain(distance) * self.master_volume;
        self.live_notes
            .entry(intent.player_id)
            .or_default()
            .insert(intent.note.clone());
        if let Some(output) = self.output.as_mut() {
            output.start(&intent.note, gain);
        }
        PlayDecision::Play { gain }
    }

    /// Handle an inbound stop intent.
    ///
    /// Stops are forwarded to the receiver regardless of distance or mute.
    /// A stop with no receiver attached is a reported error: a stop is
    /// expected to always have a live channel to act on.
    pub fn handle_stop(&mut self, intent: &NoteIntent) -> Result<StopDecision, AudioError> {
        if intent.player_id == self.local_player {
            return Ok(StopDecision::SelfEcho);
        }

        if let Some(notes) = self.live_notes.get_mut(&intent.player_id) {
            notes.remove(&intent.note);
            if notes.is_empty() {
                self.live_notes.remove(&intent.player_id);
            }
        }

        match self.output.as_mut() {
            Some(output) => {
                output.stop(&intent.note);
                Ok(StopDecision::Forwarded)
            }
            None => Err(AudioError::ReceiverUnavailable {
                note: intent.note.clone(),
            }),
        }
    }

    /// Release every live channel attributed to a removed player.
    ///
    /// Returns the number of notes released.
    pub fn purge_player(&mut self, player: &PlayerId) -> usize {
        let Some(notes) = self.live_notes.remove(player) else {
            return 0;
        };
        let count = notes.len();
        if let Some(output) = self.output.as_mut() {
            for note in &notes {
                output.stop(note);
            }
        }
        count
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Recording output shared with the test body.
    #[derive(Clone, Default)]
    struct Recorder {
        started: Rc<RefCell<Vec<(String, f32)>>>,
        stopped: Rc<RefCell<Vec<String>>>,
    }

    impl AudioOutput for Recorder {
        fn start(&mut self, note: &str, gain: f32) {
            self.started.borrow_mut().push((note.to_string(), gain));
        }
        fn stop(&mut self, note: &str) {
            self.stopped.borrow_mut().push(note.to_string());
        }
    }

    fn local() -> PlayerId {
        PlayerId::new([1; 16])
    }

    fn remote() -> PlayerId {
        PlayerId::new([2; 16])
    }

    fn mixer_at_origin() -> (ProximityAudioMixer, Recorder) {
        let mut mixer =
            ProximityAudioMixer::new(local(), Vec2::ZERO, DistanceBand::default());
        let recorder = Recorder::default();
        mixer.attach_output(Box::new(recorder.clone()));
        (mixer, recorder)
    }

    fn listener_at(distance: f32) -> Vec2 {
        Vec2::new(distance, 0.0)
    }

    #[test]
    fn test_gain_clamps_at_band_edges() {
        let band = DistanceBand::default();
        assert_eq!(band.gain(0.0), 1.0);
        assert_eq!(band.gain(50.0), 1.0);
        assert_eq!(band.gain(400.0), 0.0);
        assert_eq!(band.gain(1000.0), 0.0);
    }

    #[test]
    fn test_gain_linear_midpoint() {
        // 1 - (225 - 50) / (400 - 50) = 0.5
        let band = DistanceBand::default();
        assert!((band.gain(225.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_self_echo_bypassed() {
        let (mut mixer, recorder) = mixer_at_origin();
        let intent = NoteIntent::new("C4", local());

        assert_eq!(
            mixer.handle_play(&intent, listener_at(0.0)),
            PlayDecision::SelfEcho
        );
        assert_eq!(mixer.handle_stop(&intent).unwrap(), StopDecision::SelfEcho);
        assert!(recorder.started.borrow().is_empty());
        assert!(recorder.stopped.borrow().is_empty());
    }

    #[test]
    fn test_out_of_range_suppresses_everything() {
        let (mut mixer, recorder) = mixer_at_origin();
        let decision = mixer.handle_play(&NoteIntent::new("C4", remote()), listener_at(500.0));

        assert_eq!(decision, PlayDecision::OutOfRange);
        assert!(!decision.triggers_visual());
        assert!(recorder.started.borrow().is_empty());
    }

    #[test]
    fn test_close_listener_full_gain() {
        let (mut mixer, recorder) = mixer_at_origin();
        let decision = mixer.handle_play(&NoteIntent::new("C4", remote()), listener_at(40.0));

        assert_eq!(decision, PlayDecision::Play { gain: 1.0 });
        assert!(decision.triggers_visual());
        assert_eq!(recorder.started.borrow().as_slice(), &[("C4".to_string(), 1.0)]);
    }

    #[test]
    fn test_mute_gates_audio_not_visual() {
        let (mut mixer, recorder) = mixer_at_origin();
        mixer.set_muted(true);
        let decision = mixer.handle_play(&NoteIntent::new("C4", remote()), listener_at(40.0));

        assert_eq!(decision, PlayDecision::VisualOnly);
        assert!(decision.triggers_visual());
        assert!(recorder.started.borrow().is_empty());

        // Stop still forwards while muted.
        assert_eq!(
            mixer.handle_stop(&NoteIntent::new("C4", remote())).unwrap(),
            StopDecision::Forwarded
        );
        assert_eq!(recorder.stopped.borrow().as_slice(), &["C4".to_string()]);
    }

    #[test]
    fn test_stop_forwarded_beyond_range() {
        let (mut mixer, recorder) = mixer_at_origin();
        // No preceding play; stopping is never distance-gated.
        let decision = mixer.handle_stop(&NoteIntent::new("G5", remote())).unwrap();
        assert_eq!(decision, StopDecision::Forwarded);
        assert_eq!(recorder.stopped.borrow().as_slice(), &["G5".to_string()]);
    }

    #[test]
    fn test_stop_without_receiver_is_error() {
        let mut mixer =
            ProximityAudioMixer::new(local(), Vec2::ZERO, DistanceBand::default());
        let err = mixer
            .handle_stop(&NoteIntent::new("C4", remote()))
            .unwrap_err();
        assert!(matches!(err, AudioError::ReceiverUnavailable { ref note } if note == "C4"));
    }

    #[test]
    fn test_master_volume_scales_gain() {
        let (mut mixer, _recorder) = mixer_at_origin();
        mixer.set_master_volume(0.5);
        let decision = mixer.handle_play(&NoteIntent::new("C4", remote()), listener_at(40.0));
        assert_eq!(decision, PlayDecision::Play { gain: 0.5 });

        mixer.set_master_volume(7.0);
        let decision = mixer.handle_play(&NoteIntent::new("C4", remote()), listener_at(40.0));
        assert_eq!(decision, PlayDecision::Play { gain: 1.0 });
    }

    #[test]
    fn test_purge_player_releases_live_channels() {
        let (mut mixer, recorder) = mixer_at_origin();
        mixer.handle_play(&NoteIntent::new("C4", remote()), listener_at(40.0));
        mixer.handle_play(&NoteIntent::new("E4", remote()), listener_at(40.0));
        assert_eq!(mixer.live_note_count(&remote()), 2);

        assert_eq!(mixer.purge_player(&remote()), 2);
        assert_eq!(mixer.live_note_count(&remote()), 0);
        let stopped = recorder.stopped.borrow();
        assert!(stopped.contains(&"C4".to_string()));
        assert!(stopped.contains(&"E4".to_string()));

        // Purging an unknown player is a quiet no-op.
        assert_eq!(mixer.purge_player(&PlayerId::new([9; 16])), 0);
    }

    proptest! {
        /// Gain is non-increasing in distance and always within [0, 1].
        #[test]
        fn prop_gain_monotonic_and_clamped(a in 0.0f32..1000.0, b in 0.0f32..1000.0) {
            let band = DistanceBand::default();
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            let gain_near = band.gain(near);
            let gain_far = band.gain(far);
            prop_assert!((0.0..=1.0).contains(&gain_near));
            prop_assert!((0.0..=1.0).contains(&gain_far));
            prop_assert!(gain_near >= gain_far);
        }
    }
}

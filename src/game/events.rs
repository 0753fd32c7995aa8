//! Scene Signals
//!
//! Process-local pub/sub decoupling visual effects from audio playback.
//! Subscribing returns a handle; passing the handle back removes exactly
//! that listener, so scene teardown cannot leak handlers.

use crate::game::roster::PlayerId;

/// A local, in-process signal. Not a network message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneEvent {
    /// The shared piano was played; shake its sprite.
    PianoPlayed,
    /// A listener heard a note; float note glyphs above their sprite.
    PlayerListening {
        /// The listening player.
        player_id: PlayerId,
    },
    /// Open the piano overlay.
    ShowPiano,
    /// The piano overlay was dismissed.
    ClosePiano,
}

/// Proof of a subscription; redeem it to unsubscribe.
#[derive(Debug, PartialEq, Eq)]
pub struct ListenerHandle(u64);

/// Listener registry for scene events.
#[derive(Default)]
pub struct SignalBus {
    next_handle: u64,
    listeners: Vec<(u64, Box<dyn FnMut(&SceneEvent)>)>,
}

impl SignalBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; the returned handle removes it again.
    pub fn subscribe(&mut self, listener: impl FnMut(&SceneEvent) + 'static) -> ListenerHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.listeners.push((handle, Box::new(listener)));
        ListenerHandle(handle)
    }

    /// Remove the listener the handle was issued for.
    ///
    /// Returns false when the listener was already removed (e.g. by
    /// [`clear`](Self::clear) at teardown).
    pub fn unsubscribe(&mut self, handle: ListenerHandle) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != handle.0);
        before != self.listeners.len()
    }

    /// Deliver an event to every listener in subscription order.
    pub fn emit(&mut self, event: &SceneEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drop every listener. Called at scene teardown.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================

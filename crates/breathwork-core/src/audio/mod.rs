//! Audio cues and binaural drones.
//!
//! The platform side sits behind [`AudioBackend`]. [`AudioController`] owns
//! the single drone graph and reacts to engine/countdown events. Audio never
//! interrupts breathing: the first failure is logged, audio degrades to
//! visual-only, and nothing is retried until the user toggles audio again.

mod backend;

pub use backend::SilentBackend;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::breathing::Phase;
use crate::clock::timestamp;
use crate::error::AudioError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    Inhale,
    Exhale,
    /// Countdown finished.
    Chime,
}

/// A stereo oscillator pair; the frequency difference is the beat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DroneSpec {
    pub left_hz: f32,
    pub right_hz: f32,
    pub gain: f32,
}

impl DroneSpec {
    pub fn beat_hz(&self) -> f32 {
        (self.right_hz - self.left_hz).abs()
    }
}

/// Low-gain drones played while breathing: a 40 Hz beat on a 200 Hz carrier
/// and an 8 Hz beat on 432 Hz.
pub const DRONES: [DroneSpec; 2] = [
    DroneSpec {
        left_hz: 200.0,
        right_hz: 240.0,
        gain: 0.02,
    },
    DroneSpec {
        left_hz: 432.0,
        right_hz: 440.0,
        gain: 0.02,
    },
];

/// Platform audio. Implementations own the actual oscillators and samples.
pub trait AudioBackend {
    /// Identifier used in diagnostics.
    fn name(&self) -> &str;

    /// Build the oscillator graph for `drones` and start it.
    fn open_graph(&mut self, drones: &[DroneSpec]) -> Result<(), AudioError>;

    /// Stop every oscillator and release the graph. Must tolerate being
    /// called with no graph open.
    fn close_graph(&mut self);

    /// Play a one-shot cue from the beginning.
    fn play_cue(&mut self, cue: Cue) -> Result<(), AudioError>;
}

#[derive(Debug)]
pub struct AudioController<B> {
    backend: B,
    enabled: bool,
    degraded: bool,
    graph_open: bool,
    /// Mirrors the engine so a toggle knows whether to rebuild drones.
    engine_running: bool,
}

impl<B: AudioBackend> AudioController<B> {
    pub fn new(backend: B, enabled: bool) -> Self {
        Self {
            backend,
            enabled,
            degraded: false,
            graph_open: false,
            engine_running: false,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn degraded(&self) -> bool {
        self.degraded
    }

    pub fn graph_open(&self) -> bool {
        self.graph_open
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn active(&self) -> bool {
        self.enabled && !self.degraded
    }

    /// React to a core event. Returns an audio state change when the
    /// platform fails for the first time.
    pub fn observe(&mut self, event: &Event, now_ms: u64) -> Option<Event> {
        match event {
            Event::BreathingStarted { .. } => {
                self.engine_running = true;
                self.rebuild_drones(now_ms)
            }
            Event::BreathingStopped { .. } => {
                self.engine_running = false;
                self.teardown();
                None
            }
            Event::PhaseChanged { phase, .. } => match phase {
                Phase::Inhale => self.cue(Cue::Inhale, now_ms),
                Phase::Exhale => self.cue(Cue::Exhale, now_ms),
                Phase::HoldIn | Phase::HoldOut => None,
            },
            Event::CountdownCompleted { .. } => self.cue(Cue::Chime, now_ms),
            _ => None,
        }
    }

    /// Flip the enabled flag. Enabling always rebuilds the graph from
    /// scratch and clears a previous failure; disabling tears it down.
    pub fn toggle(&mut self, now_ms: u64) -> Vec<Event> {
        self.enabled = !self.enabled;
        info!(enabled = self.enabled, backend = self.backend.name(), "audio toggled");
        self.teardown();
        if self.enabled {
            self.degraded = false;
        }
        let mut events = vec![self.state_event(now_ms)];
        if self.enabled && self.engine_running {
            events.extend(self.rebuild_drones(now_ms));
        }
        events
    }

    /// Release the graph regardless of flags.
    pub fn shutdown(&mut self) {
        self.teardown();
    }

    fn rebuild_drones(&mut self, now_ms: u64) -> Option<Event> {
        if !self.active() {
            return None;
        }
        self.teardown();
        match self.backend.open_graph(&DRONES) {
            Ok(()) => {
                self.graph_open = true;
                debug!(backend = self.backend.name(), "drone graph opened");
                None
            }
            Err(err) => self.degrade(err, now_ms),
        }
    }

    fn teardown(&mut self) {
        if self.graph_open {
            self.backend.close_graph();
            self.graph_open = false;
            debug!(backend = self.backend.name(), "drone graph closed");
        }
    }

    fn cue(&mut self, cue: Cue, now_ms: u64) -> Option<Event> {
        if !self.active() {
            return None;
        }
        match self.backend.play_cue(cue) {
            Ok(()) => None,
            Err(err) => self.degrade(err, now_ms),
        }
    }

    fn degrade(&mut self, err: AudioError, now_ms: u64) -> Option<Event> {
        warn!(backend = self.backend.name(), error = %err, "audio failed; continuing visual-only");
        self.degraded = true;
        self.teardown();
        Some(self.state_event(now_ms))
    }

    fn state_event(&self, now_ms: u64) -> Event {
        Event::AudioStateChanged {
            enabled: self.enabled,
            degraded: self.degraded,
            at: timestamp(now_ms),
        }
    }
}

//! Shared fixtures for breathwork-core integration tests.

#![allow(dead_code)]

use breathwork_core::{AudioBackend, AudioError, Config, Cue, DroneSpec, Event, Phase, Session};

pub const T0: u64 = 1_700_000_000_000;

/// Past the default arrival + engagement window.
pub const ACTIVE_AT: u64 = T0 + 20_001;

/// Backend that records calls and counts live graphs.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub live_graphs: usize,
    pub max_live_graphs: usize,
    pub graphs_built: usize,
    pub cues: Vec<Cue>,
    pub fail: bool,
}

impl AudioBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn open_graph(&mut self, drones: &[DroneSpec]) -> Result<(), AudioError> {
        if self.fail {
            return Err(AudioError::Unavailable("no output device".into()));
        }
        assert_eq!(drones.len(), 2);
        self.live_graphs += 1;
        self.graphs_built += 1;
        self.max_live_graphs = self.max_live_graphs.max(self.live_graphs);
        Ok(())
    }

    fn close_graph(&mut self) {
        self.live_graphs = self.live_graphs.saturating_sub(1);
    }

    fn play_cue(&mut self, cue: Cue) -> Result<(), AudioError> {
        if self.fail {
            return Err(AudioError::Unavailable("playback blocked".into()));
        }
        self.cues.push(cue);
        Ok(())
    }
}

pub fn session() -> Session<RecordingBackend> {
    Session::with_seed(&Config::default(), RecordingBackend::default(), T0, 7).unwrap()
}

/// Tick every `step_ms` over `(from, to]`, collecting events.
pub fn run(session: &mut Session<RecordingBackend>, from: u64, to: u64, step_ms: u64) -> Vec<Event> {
    let mut events = Vec::new();
    let mut t = from;
    while t < to {
        t = (t + step_ms).min(to);
        events.extend(session.tick(t));
    }
    events
}

pub fn phase_changes(events: &[Event]) -> Vec<(Phase, i64, String)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::PhaseChanged {
                phase,
                pattern_id,
                at,
                ..
            } => Some((*phase, at.timestamp_millis(), pattern_id.clone())),
            _ => None,
        })
        .collect()
}

pub fn count<F: Fn(&Event) -> bool>(events: &[Event], pred: F) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

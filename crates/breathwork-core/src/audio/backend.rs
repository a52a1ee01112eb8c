use tracing::debug;

use super::{AudioBackend, Cue, DroneSpec};
use crate::error::AudioError;

/// Backend with no output. Cues and drones are only traced, which keeps
/// headless front ends and CI runs on the same code path.
#[derive(Debug, Default, Clone)]
pub struct SilentBackend {
    graph_open: bool,
}

impl SilentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph_open(&self) -> bool {
        self.graph_open
    }
}

impl AudioBackend for SilentBackend {
    fn name(&self) -> &str {
        "silent"
    }

    fn open_graph(&mut self, drones: &[DroneSpec]) -> Result<(), AudioError> {
        for d in drones {
            debug!(left_hz = d.left_hz, right_hz = d.right_hz, gain = d.gain, "drone (silent)");
        }
        self.graph_open = true;
        Ok(())
    }

    fn close_graph(&mut self) {
        self.graph_open = false;
    }

    fn play_cue(&mut self, cue: Cue) -> Result<(), AudioError> {
        debug!(?cue, "cue (silent)");
        Ok(())
    }
}

//! Terminal audio: cues ring the bell, drones are only logged.

use std::io::Write;

use breathwork_core::{AudioBackend, AudioError, Cue, DroneSpec};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct TerminalBell {
    graph_open: bool,
}

impl AudioBackend for TerminalBell {
    fn name(&self) -> &str {
        "terminal-bell"
    }

    fn open_graph(&mut self, drones: &[DroneSpec]) -> Result<(), AudioError> {
        let beats: Vec<f32> = drones.iter().map(DroneSpec::beat_hz).collect();
        info!(?beats, "binaural drones on (not audible in a terminal)");
        self.graph_open = true;
        Ok(())
    }

    fn close_graph(&mut self) {
        if self.graph_open {
            debug!("binaural drones off");
        }
        self.graph_open = false;
    }

    fn play_cue(&mut self, cue: Cue) -> Result<(), AudioError> {
        let mut stderr = std::io::stderr();
        // Chime rings twice so completion stands out.
        let bells: &[u8] = match cue {
            Cue::Chime => b"\x07\x07",
            Cue::Inhale | Cue::Exhale => b"\x07",
        };
        stderr
            .write_all(bells)
            .and_then(|()| stderr.flush())
            .map_err(|e| AudioError::Unavailable(e.to_string()))
    }
}

mod engine;
mod phase;

pub use engine::{BreathingEngine, EngineState};
pub use phase::{Phase, PAUSED_INSTRUCTION};

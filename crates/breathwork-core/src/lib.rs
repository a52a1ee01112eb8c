//! # Breathwork Core Library
//!
//! This library provides the core logic of a guided-breathing widget. Front
//! ends (the bundled CLI, or any GUI) drive it through commands and render
//! the events it returns; the core has no presentation dependencies.
//!
//! ## Architecture
//!
//! - **Breathing Engine**: A wall-clock-based state machine that paces the
//!   inhale/hold/exhale/hold cycle. The caller periodically invokes `tick()`
//! - **Stages**: Progressive reveal of controls (arrival, engagement, active)
//! - **Countdown**: Bounded session that starts and stops the engine
//! - **Audio**: Phase cues and binaural drones behind a backend trait
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Session`]: Owns every component and routes commands/events
//! - [`BreathingEngine`]: Core cycle state machine
//! - [`PatternTable`]: Breathing pattern lookup
//! - [`Config`]: Application configuration management
//! - [`AudioBackend`]: Trait for platform audio

pub mod audio;
pub mod breathing;
pub mod clock;
pub mod countdown;
pub mod error;
pub mod events;
pub mod messages;
pub mod pattern;
pub mod session;
pub mod stage;
pub mod storage;

pub use audio::{AudioBackend, AudioController, Cue, DroneSpec, SilentBackend};
pub use breathing::{BreathingEngine, EngineState, Phase};
pub use countdown::{CountdownTimer, TimerSession};
pub use error::{AudioError, ConfigError, CoreError};
pub use events::Event;
pub use pattern::{BreathingPattern, PatternTable};
pub use session::{Command, Session};
pub use stage::{Reveal, SessionStage, StageThresholds, StageTracker};
pub use storage::Config;

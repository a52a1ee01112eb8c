//! Core error types for breathwork-core.
//!
//! Library errors are `thiserror` enums. Audio failures have their own type
//! because they never escape the session: the audio controller logs them once
//! and degrades to visual-only operation.

use std::path::PathBuf;
use thiserror::Error;

use crate::stage::SessionStage;

/// Core error type for breathwork-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Pattern id is not in the pattern table
    #[error("Unknown breathing pattern: '{0}'")]
    UnknownPattern(String),

    /// Pattern durations violate the table invariants
    #[error("Invalid breathing pattern '{id}': {message}")]
    InvalidPattern { id: String, message: String },

    /// Countdown length outside the accepted range
    #[error("Invalid countdown duration: {minutes} minutes (expected 1..={max})")]
    InvalidDuration { minutes: i64, max: u32 },

    /// Control is not revealed yet
    #[error("Controls are locked during the {stage} stage")]
    ControlsLocked { stage: SessionStage },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Home/config directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Errors reported by an [`AudioBackend`](crate::audio::AudioBackend).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// Platform refused to create the graph or play a sound
    #[error("Audio unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

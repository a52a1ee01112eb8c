//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Theme (read by front ends only)
//! - Default and custom breathing patterns
//! - Audio on/off
//! - Stage thresholds and control locking
//! - Countdown limits and progress cadence
//!
//! Configuration is stored at `~/.config/breathwork/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::countdown::{CountdownSettings, DEFAULT_MAX_MINUTES, DEFAULT_POLL_INTERVAL_MS};
use crate::error::{ConfigError, CoreError, Result};
use crate::messages::DEFAULT_ROTATE_INTERVAL_MS;
use crate::pattern::{PatternTable, DEFAULT_PATTERN_ID};
use crate::stage::{StageThresholds, ARRIVAL_MS, ENGAGEMENT_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
    /// Follow the platform preference.
    #[default]
    System,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub theme: Theme,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathingConfig {
    #[serde(default = "default_pattern")]
    pub default_pattern: String,
    /// Extra patterns: id -> [inhale, hold, exhale, hold] seconds.
    #[serde(default)]
    pub custom_patterns: BTreeMap<String, [u32; 4]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(default = "default_arrival_ms")]
    pub arrival_ms: u64,
    #[serde(default = "default_engagement_ms")]
    pub engagement_ms: u64,
    /// Pattern selection and the audio toggle wait for the active stage.
    #[serde(default = "default_true")]
    pub lock_controls: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownConfig {
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,
    #[serde(default = "default_max_minutes")]
    pub max_minutes: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesConfig {
    #[serde(default = "default_rotate_interval_ms")]
    pub rotate_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breathwork/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub breathing: BreathingConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub stage: StageConfig,
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

// Default functions
fn default_pattern() -> String {
    DEFAULT_PATTERN_ID.into()
}
fn default_true() -> bool {
    true
}
fn default_arrival_ms() -> u64 {
    ARRIVAL_MS
}
fn default_engagement_ms() -> u64 {
    ENGAGEMENT_MS
}
fn default_minutes() -> u32 {
    1
}
fn default_max_minutes() -> u32 {
    DEFAULT_MAX_MINUTES
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_rotate_interval_ms() -> u64 {
    DEFAULT_ROTATE_INTERVAL_MS
}
fn default_tick_interval_ms() -> u64 {
    50
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            default_pattern: default_pattern(),
            custom_patterns: BTreeMap::new(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            arrival_ms: ARRIVAL_MS,
            engagement_ms: ENGAGEMENT_MS,
            lock_controls: true,
        }
    }
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            default_minutes: 1,
            max_minutes: DEFAULT_MAX_MINUTES,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            rotate_interval_ms: DEFAULT_ROTATE_INTERVAL_MS,
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("'{value}' is not a boolean")))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("'{value}' is not a whole number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key. The result must
    /// still validate; on error `self` is unchanged.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// Cross-field checks that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let table = self.pattern_table()?;
        table.lookup(&self.breathing.default_pattern)?;
        let invalid = |key: &str, message: &str| {
            CoreError::from(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };
        if self.countdown.max_minutes == 0 {
            return Err(invalid("countdown.max_minutes", "must be at least 1"));
        }
        if self.countdown.default_minutes == 0
            || self.countdown.default_minutes > self.countdown.max_minutes
        {
            return Err(invalid(
                "countdown.default_minutes",
                "must be between 1 and countdown.max_minutes",
            ));
        }
        if self.countdown.poll_interval_ms == 0 {
            return Err(invalid("countdown.poll_interval_ms", "must be positive"));
        }
        if self.driver.tick_interval_ms == 0 {
            return Err(invalid("driver.tick_interval_ms", "must be positive"));
        }
        Ok(())
    }

    pub fn pattern_table(&self) -> Result<PatternTable> {
        PatternTable::with_custom(&self.breathing.custom_patterns)
    }

    pub fn stage_thresholds(&self) -> StageThresholds {
        StageThresholds {
            arrival_ms: self.stage.arrival_ms,
            engagement_ms: self.stage.engagement_ms,
        }
    }

    pub fn countdown_settings(&self) -> CountdownSettings {
        CountdownSettings {
            poll_interval_ms: self.countdown.poll_interval_ms,
            max_minutes: self.countdown.max_minutes,
        }
    }
}

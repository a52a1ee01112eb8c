mod config;

pub use config::{
    AudioConfig, BreathingConfig, Config, CountdownConfig, DriverConfig, MessagesConfig,
    StageConfig, Theme, UiConfig,
};

use std::path::PathBuf;

use crate::error::ConfigError;

const DIR_NAME: &str = "breathwork";
const DEV_DIR_NAME: &str = "breathwork-dev";

/// Directory holding `config.toml`, created on first use.
///
/// Normally `$HOME/.config/breathwork`; `BREATHWORK_ENV=dev` selects
/// `breathwork-dev` instead. Without a home directory, `./.config` is used.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let name = match std::env::var("BREATHWORK_ENV").as_deref() {
        Ok("dev") => DEV_DIR_NAME,
        _ => DIR_NAME,
    };
    let dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(name);
    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

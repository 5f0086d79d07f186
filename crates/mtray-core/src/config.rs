//! Configuration management for mtray.
//!
//! Loads configuration from ${MTRAY_HOME}/config.toml with sensible defaults.
//! Every field has a default, so a missing file or a partial file both work.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrayConfig {
    /// Base duration of every list animation, in milliseconds.
    pub animation_time_ms: u64,
    /// Line cap for an expanded message body.
    pub expand_lines: u32,
    /// Maximum number of action buttons a notification materializes.
    pub max_notification_buttons: usize,
    /// Disable to apply every transition's end state immediately.
    pub animations: bool,
    /// Period of the relative time-label refresh, in seconds.
    pub relabel_period_secs: u64,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            animation_time_ms: 100,
            expand_lines: 6,
            max_notification_buttons: 3,
            animations: true,
            relabel_period_secs: 60,
        }
    }
}

impl TrayConfig {
    /// Loads the config from the default path, falling back to defaults when
    /// no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads the config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parse config '{}'", path.display()))
    }

    /// Writes a default config file if none exists yet. Returns whether a
    /// file was created.
    pub fn init_at(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config dir '{}'", parent.display()))?;
        }
        let rendered =
            toml::to_string_pretty(&Self::default()).context("serialize default config")?;
        fs::write(path, rendered).with_context(|| format!("write config '{}'", path.display()))?;
        Ok(true)
    }
}

/// Filesystem locations.
pub mod paths {
    use std::path::PathBuf;

    /// Home directory of the current user.
    pub fn home_dir() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
    }

    /// Directory holding mtray state; honors MTRAY_HOME.
    pub fn mtray_home() -> PathBuf {
        if let Some(home) = std::env::var_os("MTRAY_HOME") {
            return PathBuf::from(home);
        }
        home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("mtray")
    }

    /// Path of the config file.
    pub fn config_path() -> PathBuf {
        mtray_home().join("config.toml")
    }
}

//! Host configuration
//!
//! A JSON file under the platform config dir. A missing file is generated
//! from defaults so there is something to edit; a broken file is left alone
//! and defaults are used for this run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn, Level};

use crate::constants::autosave::{DEFAULT_INTERVAL_SECS, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};
use crate::store::FileStore;
use crate::sync::AutosavePolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where profile records live; platform data dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_interval")]
    pub autosave_interval_secs: u64,

    #[serde(default = "default_true")]
    pub save_on_setting_change: bool,

    #[serde(default = "default_true")]
    pub save_on_screen_change: bool,

    #[serde(default = "default_true")]
    pub save_on_shutdown: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_level: default_log_level(),
            autosave_interval_secs: default_interval(),
            save_on_setting_change: true,
            save_on_screen_change: true,
            save_on_shutdown: true,
        }
    }
}

/// Parse a level name as accepted in `LOG_LEVEL`, `--log-level` and the config file
pub fn parse_log_level(value: &str) -> Option<Level> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    /// Load from `path`, never failing
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                match config.save(path) {
                    Ok(()) => info!(path = %path.display(), "Generated config file"),
                    Err(e) => error!(error = ?e, "Failed to save default config"),
                }
                return config;
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<AppConfig>(&contents) {
            Ok(mut config) => {
                config.validate_and_clamp();
                config
            }
            Err(e) => {
                // Keep the broken file so it can be fixed by hand
                error!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file to {}", path.display()))?;
        Ok(())
    }

    /// Clamp values to supported ranges. Returns true if anything changed.
    pub fn validate_and_clamp(&mut self) -> bool {
        let mut changed = false;

        if self.autosave_interval_secs < MIN_INTERVAL_SECS {
            warn!(autosave_interval_secs = self.autosave_interval_secs, min = MIN_INTERVAL_SECS, "autosave_interval_secs below minimum, clamping");
            self.autosave_interval_secs = MIN_INTERVAL_SECS;
            changed = true;
        } else if self.autosave_interval_secs > MAX_INTERVAL_SECS {
            warn!(autosave_interval_secs = self.autosave_interval_secs, max = MAX_INTERVAL_SECS, "autosave_interval_secs exceeds maximum, clamping");
            self.autosave_interval_secs = MAX_INTERVAL_SECS;
            changed = true;
        }

        if parse_log_level(&self.log_level).is_none() {
            warn!(log_level = %self.log_level, "Unknown log_level, using info");
            self.log_level = default_log_level();
            changed = true;
        }

        changed
    }

    /// Profile store at the configured or default data dir
    pub fn store(&self) -> FileStore {
        match &self.data_dir {
            Some(dir) => FileStore::new(dir),
            None => FileStore::default_location(),
        }
    }

    pub fn autosave_policy(&self) -> AutosavePolicy {
        AutosavePolicy {
            interval: Duration::from_secs(self.autosave_interval_secs),
            on_setting_change: self.save_on_setting_change,
            on_screen_change: self.save_on_screen_change,
            on_shutdown: self.save_on_shutdown,
        }
    }
}

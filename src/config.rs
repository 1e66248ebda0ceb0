//! Configuration for the rotating log sink

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logging::Level;

/// Default retention period in days
pub const DEFAULT_RETENTION_DAYS: u64 = 7;

/// Sink configuration
///
/// Immutable once handed to the sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum level written: "debug", "info", "warn" or "error".
    /// Unrecognized values fall back to "debug".
    #[serde(default = "default_level")]
    pub level: Level,

    /// Directory holding the log files (`~` is expanded)
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Suffix appended to the date to form file names (e.g. ".log")
    #[serde(default = "default_format")]
    pub format: String,

    /// Files whose last modification is older than this many days are deleted
    #[serde(default = "default_saving_days")]
    pub saving_days: u64,

    /// Seconds between rotation checks (default: 43200 = 12 hours)
    #[serde(default = "default_rotation_interval")]
    pub rotation_interval_secs: u64,

    /// Seconds between retention sweeps (default: 30)
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_level() -> Level {
    Level::Info
}

fn default_dir() -> PathBuf {
    config_dir().join("logs")
}

fn default_format() -> String {
    ".log".to_string()
}

fn default_saving_days() -> u64 {
    DEFAULT_RETENTION_DAYS
}

fn default_rotation_interval() -> u64 {
    12 * 60 * 60
}

fn default_sweep_interval() -> u64 {
    30
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: default_dir(),
            format: default_format(),
            saving_days: default_saving_days(),
            rotation_interval_secs: default_rotation_interval(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl LogConfig {
    /// Default configuration writing into `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Log directory with `~` expanded
    pub fn log_dir(&self) -> PathBuf {
        let raw = self.dir.to_string_lossy();
        PathBuf::from(shellexpand::tilde(raw.as_ref()).into_owned())
    }

    /// Retention window as a duration
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.saving_days.saturating_mul(24 * 60 * 60))
    }

    /// Time between rotation checks
    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_secs)
    }

    /// Time between retention sweeps
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Check that the sink can be built from this configuration
    ///
    /// The directory must already exist; see [`crate::setup::ensure_log_dir`].
    pub fn validate(&self) -> Result<()> {
        if self.format.contains('/') || self.format.contains('\\') {
            return Err(Error::Config(format!(
                "File name format {:?} must not contain path separators",
                self.format
            )));
        }
        if self.rotation_interval_secs == 0 {
            return Err(Error::Config(
                "rotation_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(Error::Config(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }

        let dir = self.log_dir();
        let metadata = std::fs::metadata(&dir).map_err(|e| {
            Error::Config(format!("Log directory {} is not usable: {}", dir.display(), e))
        })?;
        if !metadata.is_dir() {
            return Err(Error::Config(format!(
                "Log path {} is not a directory",
                dir.display()
            )));
        }
        // Creating a real file is the only reliable writability check
        tempfile::tempfile_in(&dir).map_err(|e| {
            Error::Config(format!(
                "Log directory {} is not writable: {}",
                dir.display(),
                e
            ))
        })?;

        Ok(())
    }
}

/// Get the base configuration directory (~/.daylog)
/// Falls back to ./.daylog if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".daylog"))
        .unwrap_or_else(|| PathBuf::from(".daylog"))
}

/// Get the path to the default config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

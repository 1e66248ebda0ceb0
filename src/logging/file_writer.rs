//! Active log file management
//!
//! `HandlerState` owns the single file currently receiving log lines and swaps
//! it when the date-derived file name changes.

use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Local};
use tracing::{debug, info};

use super::clock::Clock;
use super::retention::{self, SweepReport};
use crate::config::LogConfig;
use crate::error::{Error, Result};

/// Date part of every log file name
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical file name for the period containing `now`
pub fn file_name_for(now: &DateTime<Local>, format: &str) -> String {
    format!("{}{}", now.format(DATE_FORMAT), format)
}

/// Result of a rotation check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The active file already matches the current period
    Unchanged,
    /// A new file was installed
    Rotated {
        /// Previously active file name, if any
        from: Option<String>,
        /// Newly active file name
        to: String,
    },
}

/// The file currently receiving log lines
struct ActiveFile {
    name: String,
    path: PathBuf,
    /// Serializes line writes between emitters holding the shared lock
    file: Mutex<File>,
}

struct Slot {
    active: Option<ActiveFile>,
    closed: bool,
}

/// Shared state behind every handler derived from one sink
pub struct HandlerState {
    config: LogConfig,
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    slot: RwLock<Slot>,
}

impl HandlerState {
    /// Validate the configuration and open the file for the current period
    pub fn open(config: LogConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let state = Self {
            dir: config.log_dir(),
            config,
            clock,
            slot: RwLock::new(Slot {
                active: None,
                closed: false,
            }),
        };
        state.rotate()?;
        Ok(state)
    }

    /// Configuration the sink was built with
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Resolved log directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current time according to the sink's clock
    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    /// Switch to the file for the current period if it differs from the active one
    ///
    /// The previous file stays active when the new one cannot be opened.
    pub fn rotate(&self) -> Result<RotationOutcome> {
        let name = file_name_for(&self.clock.now(), &self.config.format);

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.closed {
            return Err(Error::Closed);
        }
        if slot.active.as_ref().map(|f| f.name.as_str()) == Some(name.as_str()) {
            return Ok(RotationOutcome::Unchanged);
        }

        let path = self.dir.join(&name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| Error::Rotation {
                path: path.clone(),
                source,
            })?;

        let previous = slot.active.replace(ActiveFile {
            name: name.clone(),
            path,
            file: Mutex::new(file),
        });
        // Old handle closes here, after the new one is installed
        let from = previous.map(|f| f.name);
        drop(slot);

        info!(from = ?from, to = %name, "Switched to new log file");
        Ok(RotationOutcome::Rotated { from, to: name })
    }

    /// Append one already formatted line to the active file
    pub fn write_line(&self, line: &str) -> Result<()> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        let active = slot.active.as_ref().ok_or(Error::Closed)?;

        let mut file = active.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())
            .map_err(|source| Error::Write {
                path: active.path.clone(),
                source,
            })?;
        Ok(())
    }

    /// Name of the active file, `None` once closed
    pub fn active_name(&self) -> Option<String> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.active.as_ref().map(|f| f.name.clone())
    }

    /// Check whether `name` is the active file
    pub fn is_active(&self, name: &OsStr) -> bool {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.active
            .as_ref()
            .is_some_and(|f| OsStr::new(f.name.as_str()) == name)
    }

    /// Delete expired files from the log directory, sparing the active one
    pub fn sweep(&self) -> Result<SweepReport> {
        retention::sweep_expired(
            &self.dir,
            self.clock.now().into(),
            self.config.retention(),
            |name| self.is_active(name),
        )
    }

    /// Close the active file; later writes fail with `Error::Closed`
    ///
    /// Returns `false` if the state was already closed.
    pub fn close(&self) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.closed {
            return false;
        }
        slot.closed = true;
        let previous = slot.active.take();
        drop(slot);

        if let Some(file) = previous {
            debug!(file = %file.name, "Closed log file");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::clock::ManualClock;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn noon(year: i32, month: u32, day: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn open_state(temp_dir: &TempDir, clock: Arc<ManualClock>) -> HandlerState {
        HandlerState::open(LogConfig::new(temp_dir.path()), clock).unwrap()
    }

    #[test]
    fn test_file_name_for() {
        assert_eq!(file_name_for(&noon(2026, 1, 21), ".log"), "2026-01-21.log");
        assert_eq!(file_name_for(&noon(2026, 12, 3), "_app.txt"), "2026-12-03_app.txt");
    }

    #[test]
    fn test_open_creates_file_for_today() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(noon(2026, 1, 21)));
        let state = open_state(&temp_dir, clock);

        assert_eq!(state.active_name().as_deref(), Some("2026-01-21.log"));
        assert!(temp_dir.path().join("2026-01-21.log").exists());
    }

    #[test]
    fn test_open_fails_on_missing_dir() {
        let clock = Arc::new(ManualClock::new(noon(2026, 1, 21)));
        let result = HandlerState::open(LogConfig::new("/nonexistent/path/for/testing"), clock);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rotate_same_day_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(noon(2026, 1, 21)));
        let state = open_state(&temp_dir, clock.clone());

        state.write_line("before\n").unwrap();
        clock.advance(Duration::hours(6));
        assert_eq!(state.rotate().unwrap(), RotationOutcome::Unchanged);
        assert_eq!(state.rotate().unwrap(), RotationOutcome::Unchanged);
        state.write_line("after\n").unwrap();

        assert_eq!(state.active_name().as_deref(), Some("2026-01-21.log"));
        let content = std::fs::read_to_string(temp_dir.path().join("2026-01-21.log")).unwrap();
        assert_eq!(content, "before\nafter\n");
    }

    #[test]
    fn test_rotate_on_date_change() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(noon(2026, 1, 21)));
        let state = open_state(&temp_dir, clock.clone());

        state.write_line("day one\n").unwrap();
        clock.advance(Duration::days(1));
        assert_eq!(
            state.rotate().unwrap(),
            RotationOutcome::Rotated {
                from: Some("2026-01-21.log".to_string()),
                to: "2026-01-22.log".to_string(),
            }
        );
        state.write_line("day two\n").unwrap();

        let first = std::fs::read_to_string(temp_dir.path().join("2026-01-21.log")).unwrap();
        let second = std::fs::read_to_string(temp_dir.path().join("2026-01-22.log")).unwrap();
        assert_eq!(first, "day one\n");
        assert_eq!(second, "day two\n");
    }

    #[test]
    fn test_rotate_appends_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("2026-01-21.log"), "earlier run\n").unwrap();

        let clock = Arc::new(ManualClock::new(noon(2026, 1, 21)));
        let state = open_state(&temp_dir, clock);
        state.write_line("this run\n").unwrap();

        let content = std::fs::read_to_string(temp_dir.path().join("2026-01-21.log")).unwrap();
        assert_eq!(content, "earlier run\nthis run\n");
    }

    #[test]
    fn test_failed_rotation_keeps_previous_file() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(noon(2026, 1, 21)));
        let state = open_state(&temp_dir, clock.clone());

        // A directory squatting on tomorrow's name makes the open fail
        std::fs::create_dir(temp_dir.path().join("2026-01-22.log")).unwrap();
        clock.advance(Duration::days(1));

        assert!(matches!(state.rotate(), Err(Error::Rotation { .. })));
        assert_eq!(state.active_name().as_deref(), Some("2026-01-21.log"));
        state.write_line("still here\n").unwrap();
    }

    #[test]
    fn test_close_is_idempotent_and_blocks_writes() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(noon(2026, 1, 21)));
        let state = open_state(&temp_dir, clock);

        assert!(state.close());
        assert!(!state.close());
        assert!(state.active_name().is_none());
        assert!(matches!(state.write_line("late\n"), Err(Error::Closed)));
        assert!(matches!(state.rotate(), Err(Error::Closed)));
    }

    #[test]
    fn test_is_active() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(noon(2026, 1, 21)));
        let state = open_state(&temp_dir, clock);

        assert!(state.is_active(OsStr::new("2026-01-21.log")));
        assert!(!state.is_active(OsStr::new("2026-01-20.log")));
    }
}

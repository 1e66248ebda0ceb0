//! Log file retention management
//!
//! Handles cleanup of old log files based on age.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{info, warn};

use crate::error::{Error, Result};

/// Outcome of one retention sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Files that were deleted
    pub removed: Vec<PathBuf>,
    /// Entries that could not be inspected or deleted
    pub failed: usize,
}

/// Delete regular files in `logs_dir` last modified more than `retention` before `now`
///
/// Only the top level of the directory is scanned. Files for which `is_active`
/// returns true are never deleted. A failure to list the directory aborts the
/// sweep; failures on single entries are logged and counted.
pub fn sweep_expired<F>(
    logs_dir: &Path,
    now: SystemTime,
    retention: Duration,
    is_active: F,
) -> Result<SweepReport>
where
    F: Fn(&OsStr) -> bool,
{
    sweep_with(logs_dir, now, retention, is_active, |path| fs::remove_file(path))
}

fn sweep_with<F, R>(
    logs_dir: &Path,
    now: SystemTime,
    retention: Duration,
    is_active: F,
    remove: R,
) -> Result<SweepReport>
where
    F: Fn(&OsStr) -> bool,
    R: Fn(&Path) -> io::Result<()>,
{
    let entries = fs::read_dir(logs_dir).map_err(|source| Error::Sweep {
        path: logs_dir.to_path_buf(),
        source,
    })?;

    let mut report = SweepReport::default();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %logs_dir.display(), error = %e, "Failed to read log directory entry");
                report.failed += 1;
                continue;
            }
        };
        let path = entry.path();

        let modified = match entry.metadata().and_then(|m| {
            if m.is_file() {
                m.modified().map(Some)
            } else {
                Ok(None)
            }
        }) {
            Ok(Some(modified)) => modified,
            Ok(None) => continue,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to stat log file");
                report.failed += 1;
                continue;
            }
        };

        // Modification times in the future count as fresh
        let Ok(age) = now.duration_since(modified) else {
            continue;
        };
        if age <= retention || is_active(&entry.file_name()) {
            continue;
        }

        match remove(&path) {
            Ok(()) => {
                info!(path = %path.display(), "Deleted old log file");
                report.removed.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to delete old log file");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

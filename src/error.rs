//! Error types for the rotating log sink

use std::io;
use std::path::PathBuf;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the sink
///
/// Only `Config` and `Rotation` can surface from construction. After that,
/// `Write`, `Closed` and `Serialization` are returned to the emitting caller,
/// while `Sweep` and background `Rotation` failures are logged by the jobs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Could not open the next log file
    #[error("Failed to open log file {path}: {source}")]
    Rotation {
        /// File that failed to open
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Appending a record to the active file failed
    #[error("Failed to write log record to {path}: {source}")]
    Write {
        /// Active file at the time of the write
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Write failure with no file open to receive the record
    ///
    /// Returned for every emission after shutdown has closed the active file.
    #[error("Log sink is closed, no file is open")]
    Closed,

    /// Listing the log directory failed
    #[error("Failed to scan log directory {path}: {source}")]
    Sweep {
        /// Directory being scanned
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Attributes could not be encoded as JSON
    #[error("Failed to serialize attributes: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Background jobs need a tokio runtime
    #[error("No tokio runtime available to schedule background jobs")]
    NoRuntime,
}

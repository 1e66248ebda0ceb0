//! Daylog - structured log sink with daily rotation and retention cleanup
//!
//! This library provides a file sink for long-running processes: records are
//! appended to `<dir>/<YYYY-MM-DD><ext>`, the file is switched when the date
//! changes and files past the retention window are deleted in the background.

pub mod config;
pub mod error;
pub mod logging;
pub mod setup;

pub use config::LogConfig;
pub use error::{Error, Result};
pub use logging::{Attributes, BackgroundJobs, Level, LogRecord, RotatingHandler, RotatingLayer};

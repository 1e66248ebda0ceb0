//! Record handler writing to the rotating file
//!
//! A `RotatingHandler` is a cheap, cloneable view of one sink. Handlers derived
//! with [`RotatingHandler::with_attrs`] or [`RotatingHandler::with_group`] share
//! the same active file and configuration and differ only in the attributes
//! they add to each record.

use std::sync::Arc;

use chrono::{DateTime, Local};

use super::attrs::{qualify, Attributes};
use super::clock::{Clock, SystemClock};
use super::file_writer::{HandlerState, RotationOutcome};
use super::record::{Level, LogRecord};
use super::retention::SweepReport;
use super::scheduler::{self, BackgroundJobs};
use crate::config::LogConfig;
use crate::error::{Error, Result};

/// Timestamp prefix of every log line
pub const TIMESTAMP_FORMAT: &str = "[%Y-%m-%d %H:%M:%S]";

/// Format a record and its merged attributes as one log line
///
/// The JSON object is left out entirely when there are no attributes.
pub fn format_line(record: &LogRecord, attrs: &Attributes) -> Result<String> {
    let mut line = format!(
        "{} {}: {}",
        record.timestamp.format(TIMESTAMP_FORMAT),
        record.level,
        record.message
    );
    if !attrs.is_empty() {
        line.push(' ');
        line.push_str(&attrs.to_pretty_json()?);
    }
    line.push('\n');
    Ok(line)
}

/// Handler appending records to the active log file
#[derive(Clone)]
pub struct RotatingHandler {
    state: Arc<HandlerState>,
    /// Bound attributes, keys already qualified
    attrs: Attributes,
    /// Dotted group prefix applied to keys added from here on
    group: Option<String>,
}

impl RotatingHandler {
    /// Open the sink without background jobs
    ///
    /// Rotation and retention then only happen through [`Self::rotate_now`]
    /// and [`Self::sweep_now`].
    pub fn open(config: LogConfig) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`Self::open`] with a custom clock
    pub fn open_with_clock(config: LogConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let state = HandlerState::open(config, clock)?;
        Ok(Self {
            state: Arc::new(state),
            attrs: Attributes::new(),
            group: None,
        })
    }

    /// Open the sink and schedule rotation and retention on the current tokio runtime
    ///
    /// The first rotation happens before this returns; its failure aborts
    /// construction. Keep the returned [`BackgroundJobs`] for as long as the
    /// sink should keep rotating and sweeping.
    pub fn start(config: LogConfig) -> Result<(Self, BackgroundJobs)> {
        Self::start_with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`Self::start`] with a custom clock
    pub fn start_with_clock(
        config: LogConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, BackgroundJobs)> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let handler = Self::open_with_clock(config, clock)?;
        let jobs = scheduler::spawn(Arc::clone(&handler.state), &runtime);
        Ok((handler, jobs))
    }

    /// Check if records at `level` are written
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.state.config().level
    }

    /// Format `record` and append it to the active file
    ///
    /// Bound attributes form the base; the record's own fields and then
    /// `call_attrs` override them on key collisions. Records below the
    /// configured level are skipped. A failed write drops the record.
    pub fn emit(&self, record: &LogRecord, call_attrs: &Attributes) -> Result<()> {
        if !self.is_enabled(record.level) {
            return Ok(());
        }

        let group = self.group.as_deref();
        let mut merged = self.attrs.clone();
        merged.merge(&record.fields.qualified(group));
        merged.merge(&call_attrs.qualified(group));

        let line = format_line(record, &merged)?;
        self.state.write_line(&line)
    }

    /// Emit a record with no call-site attributes
    pub fn log(&self, record: &LogRecord) -> Result<()> {
        self.emit(record, &Attributes::new())
    }

    /// Derive a handler that adds `attrs` to every record
    ///
    /// New keys replace inherited ones with the same name.
    pub fn with_attrs(&self, attrs: Attributes) -> Self {
        let mut bound = self.attrs.clone();
        bound.merge(&attrs.qualified(self.group.as_deref()));
        Self {
            state: Arc::clone(&self.state),
            attrs: bound,
            group: self.group.clone(),
        }
    }

    /// Derive a handler whose added keys are namespaced under `name`
    ///
    /// Groups nest: `with_group("a").with_group("b")` yields `a.b.key`.
    /// Attributes bound before the group keep their keys.
    pub fn with_group(&self, name: &str) -> Self {
        if name.is_empty() {
            return self.clone();
        }
        let group = match &self.group {
            Some(outer) => qualify(outer, name),
            None => name.to_string(),
        };
        Self {
            state: Arc::clone(&self.state),
            attrs: self.attrs.clone(),
            group: Some(group),
        }
    }

    /// Run a rotation check now
    pub fn rotate_now(&self) -> Result<RotationOutcome> {
        self.state.rotate()
    }

    /// Run a retention sweep now
    pub fn sweep_now(&self) -> Result<SweepReport> {
        self.state.sweep()
    }

    /// Name of the active file, `None` once the sink is closed
    pub fn active_file_name(&self) -> Option<String> {
        self.state.active_name()
    }

    /// Current time according to the sink's clock
    pub fn now(&self) -> DateTime<Local> {
        self.state.now()
    }

    /// Configuration the sink was built with
    pub fn config(&self) -> &LogConfig {
        self.state.config()
    }
}

impl std::fmt::Debug for RotatingHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingHandler")
            .field("dir", &self.state.dir())
            .field("active", &self.state.active_name())
            .field("attrs", &self.attrs)
            .field("group", &self.group)
            .finish()
    }
}

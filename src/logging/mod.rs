//! Rotating file log sink
//!
//! Writes one file per day into a configured directory, switches files when
//! the date changes and deletes files older than the retention window.

mod attrs;
mod clock;
mod file_writer;
mod handler;
mod layer;
mod record;
mod retention;
mod scheduler;

pub use attrs::{qualify, Attributes, GROUP_SEPARATOR};
pub use clock::{Clock, ManualClock, SystemClock};
pub use file_writer::{file_name_for, HandlerState, RotationOutcome, DATE_FORMAT};
pub use handler::{format_line, RotatingHandler, TIMESTAMP_FORMAT};
pub use layer::RotatingLayer;
pub(crate) use layer::is_own_target;
pub use record::{Level, LogRecord};
pub use retention::{sweep_expired, SweepReport};
pub use scheduler::BackgroundJobs;

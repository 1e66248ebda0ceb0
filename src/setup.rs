//! Process-level setup
//!
//! The sink itself never creates its directory; these helpers do the setup a
//! host process needs before handing records to it.

use std::path::PathBuf;

use tracing::Subscriber;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LogConfig;
use crate::error::{Error, Result};
use crate::logging::{is_own_target, BackgroundJobs, RotatingHandler, RotatingLayer};

/// Create the configured log directory and its parents
pub fn ensure_log_dir(config: &LogConfig) -> Result<PathBuf> {
    let dir = config.log_dir();
    std::fs::create_dir_all(&dir).map_err(|e| {
        Error::Config(format!(
            "Failed to create log directory {}: {}",
            dir.display(),
            e
        ))
    })?;
    Ok(dir)
}

/// Plain text layer for this crate's own diagnostics
///
/// Only events from the sink itself pass, so failed rotations and sweeps are
/// reported somewhere other than the files they concern.
pub fn diagnostics_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter_fn(|metadata| is_own_target(metadata.target())))
}

/// Start the sink and install it as the global `tracing` subscriber
///
/// Application events go to the sink, the sink's own diagnostics to stderr.
/// `RUST_LOG` overrides the configured level when set. Must be called from
/// within a tokio runtime. Keep the returned [`BackgroundJobs`] alive for the
/// lifetime of the process and shut it down on exit.
pub fn init(config: LogConfig) -> Result<(RotatingHandler, BackgroundJobs)> {
    ensure_log_dir(&config)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(String::from(config.level)));

    let (handler, jobs) = RotatingHandler::start(config)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(RotatingLayer::new(handler.clone()))
        .with(diagnostics_layer(std::io::stderr))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install log subscriber: {}", e)))?;

    Ok((handler, jobs))
}

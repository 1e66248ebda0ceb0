//! Periodic rotation and retention jobs

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use super::file_writer::HandlerState;
use crate::error::Error;

/// Handle to the running rotation and retention jobs
///
/// Dropping it stops both jobs but leaves the active file open until the last
/// handler goes away. Call [`BackgroundJobs::shutdown`] to also close the file.
pub struct BackgroundJobs {
    shutdown_tx: watch::Sender<bool>,
    rotation: JoinHandle<()>,
    retention: JoinHandle<()>,
    state: Arc<HandlerState>,
}

impl BackgroundJobs {
    /// Stop both jobs, wait for them, then close the active file
    ///
    /// Emissions after this return `Error::Closed`.
    pub async fn shutdown(self) {
        // Receivers may already be gone if a job exited on its own
        let _ = self.shutdown_tx.send(true);

        for (name, job) in [("rotation", self.rotation), ("retention", self.retention)] {
            if let Err(e) = job.await {
                warn!(job = name, error = %e, "Background job ended abnormally");
            }
        }

        self.state.close();
        debug!("Log sink shut down");
    }
}

/// Spawn the rotation and retention jobs on `runtime`
///
/// Both jobs wait one full interval before their first tick; the initial
/// rotation has already happened during construction.
pub(crate) fn spawn(state: Arc<HandlerState>, runtime: &Handle) -> BackgroundJobs {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let config = state.config();

    let rotation = runtime.spawn(rotation_job(
        Arc::clone(&state),
        config.rotation_interval(),
        shutdown_rx.clone(),
    ));
    let retention = runtime.spawn(retention_job(
        Arc::clone(&state),
        config.sweep_interval(),
        shutdown_rx,
    ));

    BackgroundJobs {
        shutdown_tx,
        rotation,
        retention,
        state,
    }
}

async fn rotation_job(
    state: Arc<HandlerState>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match state.rotate() {
                    Ok(_) => {}
                    Err(Error::Closed) => break,
                    Err(e) => error!(error = %e, "Log rotation failed, keeping current file"),
                }
            }
            // Fires on shutdown and when the sender is dropped
            _ = shutdown.changed() => break,
        }
    }
}

async fn retention_job(
    state: Arc<HandlerState>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match state.sweep() {
                    Ok(report) if !report.removed.is_empty() || report.failed > 0 => {
                        debug!(
                            removed = report.removed.len(),
                            failed = report.failed,
                            "Retention sweep finished"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "Retention sweep failed, retrying next tick"),
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::LogConfig;
    use crate::error::Error;
    use crate::logging::clock::ManualClock;
    use crate::logging::{Level, LogRecord, RotatingHandler};
    use chrono::{Duration as ChronoDuration, Local, TimeZone};
    use filetime::FileTime;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn config(temp_dir: &TempDir) -> LogConfig {
        let mut config = LogConfig::new(temp_dir.path());
        config.rotation_interval_secs = 60;
        config.sweep_interval_secs = 30;
        config.saving_days = 1;
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation_job_switches_file_on_new_day() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2026, 1, 21, 23, 59, 30).unwrap(),
        ));
        let (handler, jobs) =
            RotatingHandler::start_with_clock(config(&temp_dir), clock.clone()).unwrap();
        assert_eq!(handler.active_file_name().as_deref(), Some("2026-01-21.log"));

        clock.advance(ChronoDuration::minutes(1));
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(handler.active_file_name().as_deref(), Some("2026-01-22.log"));
        jobs.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_retention_job_deletes_expired_files() {
        let temp_dir = TempDir::new().unwrap();
        let stale = temp_dir.path().join("2026-01-01.log");
        std::fs::write(&stale, "old").unwrap();
        let two_days_ago = SystemTime::now() - Duration::from_secs(2 * 24 * 60 * 60);
        filetime::set_file_mtime(&stale, FileTime::from_system_time(two_days_ago)).unwrap();

        let (handler, jobs) = RotatingHandler::start(config(&temp_dir)).unwrap();
        let active = temp_dir.path().join(handler.active_file_name().unwrap());

        tokio::time::sleep(Duration::from_secs(31)).await;

        assert!(!stale.exists());
        assert!(active.exists());
        jobs.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_closes_file_once() {
        let temp_dir = TempDir::new().unwrap();
        let (handler, jobs) = RotatingHandler::start(config(&temp_dir)).unwrap();
        handler.log(&LogRecord::new(Level::Error, "before")).unwrap();

        jobs.shutdown().await;

        assert!(handler.active_file_name().is_none());
        let result = handler.log(&LogRecord::new(Level::Error, "after"));
        assert!(matches!(result, Err(Error::Closed)));
        assert!(matches!(handler.rotate_now(), Err(Error::Closed)));
    }
}

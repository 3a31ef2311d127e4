//! Rate-limited progress reporting.

use std::time::Duration;

use epochscan_core::Progress;
use tokio::time::Instant;
use tracing::debug;

/// Tracks applied tasks and logs progress at most once per interval.
pub struct ProgressReporter {
    interval: Option<Duration>,
    last_report: Instant,
    reports: usize,
    progress: Progress,
}

impl ProgressReporter {
    /// Create a reporter for `total` tasks. `None` disables the log line.
    pub fn new(total: usize, interval: Option<Duration>) -> Self {
        Self {
            interval,
            last_report: Instant::now(),
            reports: 0,
            progress: Progress::new(total),
        }
    }

    /// Record one applied task.
    pub fn record(&mut self, failed: bool) {
        self.progress.completed += 1;
        if failed {
            self.progress.failed += 1;
        }

        let Some(interval) = self.interval else {
            return;
        };
        if self.last_report.elapsed() > interval {
            debug!(
                completed = self.progress.completed,
                total = self.progress.total,
                failed = self.progress.failed,
                percent = self.progress.fraction() * 100.0,
                "Progress update"
            );
            self.last_report = Instant::now();
            self.reports += 1;
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Progress {
        self.progress
    }

    /// Number of progress lines logged so far.
    pub fn reports(&self) -> usize {
        self.reports
    }
}

//! Run configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Configuration of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of tasks; indices are `0..task_count`.
    pub task_count: usize,

    /// Requested number of concurrent workers. Zero is treated as one.
    pub concurrency: usize,

    /// Optional timeout applied to each task independently.
    pub task_timeout: Option<Duration>,

    /// Minimum interval between progress logs. `None` disables them.
    pub report_interval: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            task_count: 0,
            concurrency: 1,
            task_timeout: None,
            report_interval: None,
        }
    }
}

impl RunConfig {
    /// Create a config for `task_count` tasks on `concurrency` workers.
    pub fn new(task_count: usize, concurrency: usize) -> Self {
        Self {
            task_count,
            concurrency,
            ..Self::default()
        }
    }

    /// Builder method to set the per-task timeout.
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    /// Builder method to set the progress report interval.
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = Some(interval);
        self
    }

    /// Reject configurations that cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.task_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroTaskTimeout);
        }
        if self.report_interval.is_some_and(|i| i.is_zero()) {
            return Err(ConfigError::ZeroReportInterval);
        }
        Ok(())
    }

    /// Number of workers actually spawned: `min(max(concurrency, 1), task_count)`.
    pub fn worker_count(&self) -> usize {
        self.concurrency.max(1).min(self.task_count)
    }
}

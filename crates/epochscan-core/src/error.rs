//! Run errors.
//!
//! Three layers, from least to most severe:
//! - [`TaskError`]: one task failed; handed to the collector as data.
//! - [`ConfigError`]: the run was rejected before any worker started.
//! - [`RunError`]: the run was aborted.

use std::time::Duration;

use thiserror::Error;

use crate::RunState;

/// Boxed error used for caller-supplied failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core state errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: RunState, to: RunState },
}

/// Invalid run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A per-task timeout of zero would fail every task.
    #[error("Task timeout must be greater than zero")]
    ZeroTaskTimeout,

    /// A zero report interval would log on every task.
    #[error("Report interval must be greater than zero")]
    ZeroReportInterval,
}

/// Failure of a single task. Never aborts a run by itself.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The task handler returned an error.
    #[error("{0}")]
    Failed(#[source] BoxError),

    /// The task did not finish within the configured timeout.
    #[error("Task timed out after {0:?}")]
    TimedOut(Duration),

    /// The task observed run cancellation and gave up.
    #[error("Task cancelled")]
    Cancelled,
}

impl TaskError {
    /// Wrap any handler error.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }

    /// Returns true if the task ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }
}

/// Fatal run errors. The accumulator still reflects tasks `0..applied`.
#[derive(Debug, Error)]
pub enum RunError {
    /// Rejected before start.
    #[error("Invalid run configuration: {0}")]
    Config(#[from] ConfigError),

    /// The run was cancelled from outside.
    #[error("Run cancelled after {applied} tasks")]
    Cancelled { applied: usize },

    /// The collector refused a result.
    #[error("Collector failed on task {index}: {source}")]
    Collect {
        index: usize,
        #[source]
        source: BoxError,
    },

    /// A worker exited without reporting the task it claimed.
    #[error("Worker lost before task {index} was reported: {reason}")]
    WorkerLost { index: usize, reason: String },
}

impl RunError {
    /// Index of the task that caused the abort, if any.
    pub fn task_index(&self) -> Option<usize> {
        match self {
            Self::Collect { index, .. } | Self::WorkerLost { index, .. } => Some(*index),
            Self::Config(_) | Self::Cancelled { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_wraps_source() {
        let err = TaskError::failed("connection refused");
        assert_eq!(err.to_string(), "connection refused");
        assert!(!err.is_timeout());
        assert!(TaskError::TimedOut(Duration::from_secs(3)).is_timeout());
    }

    #[test]
    fn test_run_error_task_index() {
        let err = RunError::Collect {
            index: 3,
            source: "bad epoch".into(),
        };
        assert_eq!(err.task_index(), Some(3));
        assert_eq!(err.to_string(), "Collector failed on task 3: bad epoch");

        let err = RunError::from(ConfigError::ZeroTaskTimeout);
        assert_eq!(err.task_index(), None);
    }
}

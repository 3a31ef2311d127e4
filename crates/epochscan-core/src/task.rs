//! Task results and run summaries.

use std::time::Duration;

use serde::Serialize;

use crate::{RunState, TaskError};

/// Outcome of one task, produced exactly once per index.
#[derive(Debug)]
pub struct TaskResult<V> {
    /// Task index in `0..task_count`.
    pub index: usize,

    /// Value returned by the handler, or the per-task error.
    pub outcome: Result<V, TaskError>,
}

impl<V> TaskResult<V> {
    /// Create a new TaskResult.
    pub fn new(index: usize, outcome: Result<V, TaskError>) -> Self {
        Self { index, outcome }
    }

    /// Successful result.
    pub fn ok(index: usize, value: V) -> Self {
        Self::new(index, Ok(value))
    }

    /// Failed result.
    pub fn err(index: usize, error: TaskError) -> Self {
        Self::new(index, Err(error))
    }

    /// Returns true if the task succeeded.
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Borrow the value, if any.
    pub fn value(&self) -> Option<&V> {
        self.outcome.as_ref().ok()
    }

    /// Borrow the error, if any.
    pub fn error(&self) -> Option<&TaskError> {
        self.outcome.as_ref().err()
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Terminal state.
    pub state: RunState,

    /// Tasks applied to the collector, always a prefix `0..applied`.
    pub applied: usize,

    /// Applied tasks whose outcome was a per-task error.
    pub failed: usize,

    /// Workers spawned.
    pub workers: usize,

    /// Wall time of the run.
    pub elapsed: Duration,
}

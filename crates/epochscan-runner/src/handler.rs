//! Caller-supplied seams of a run: the per-task handler and the collector.

use std::future::Future;

use async_trait::async_trait;
use epochscan_core::{BoxError, TaskError, TaskResult};
use tokio_util::sync::CancellationToken;

/// Context handed to a task handler.
#[derive(Debug, Clone)]
pub struct TaskContext {
    index: usize,
    worker: usize,
    cancel: CancellationToken,
}

impl TaskContext {
    pub(crate) fn new(index: usize, worker: usize, cancel: CancellationToken) -> Self {
        Self {
            index,
            worker,
            cancel,
        }
    }

    /// Index of the task being executed.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Id of the worker executing the task, in `0..workers`.
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Returns true once the run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the run is cancelled.
    ///
    /// Handlers doing slow I/O should race their work against this and
    /// return [`TaskError::Cancelled`] when it wins.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// The run's cancellation token.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Work executed once per task, concurrently across workers.
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    /// Value produced by a successful task.
    type Output: Send + 'static;

    /// Execute task `ctx.index()`.
    async fn run(&self, ctx: TaskContext) -> Result<Self::Output, TaskError>;
}

/// Folds task results into caller-owned state.
///
/// Only ever called from the run's own task, one result at a time, in
/// index order. Returning an error aborts the run.
pub trait Collector<V> {
    /// Fatal error type.
    type Error: Into<BoxError>;

    /// Apply one result.
    fn collect(&mut self, result: TaskResult<V>) -> Result<(), Self::Error>;
}

impl<V, E, F> Collector<V> for F
where
    F: FnMut(TaskResult<V>) -> Result<(), E>,
    E: Into<BoxError>,
{
    type Error = E;

    fn collect(&mut self, result: TaskResult<V>) -> Result<(), E> {
        self(result)
    }
}

/// A [`TaskHandler`] built from an async closure. See [`handler_fn`].
#[derive(Debug, Clone)]
pub struct HandlerFn<F>(F);

/// Build a [`TaskHandler`] from `Fn(TaskContext) -> impl Future<Output = Result<V, TaskError>>`.
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn(f)
}

#[async_trait]
impl<F, Fut, V> TaskHandler for HandlerFn<F>
where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, TaskError>> + Send + 'static,
    V: Send + 'static,
{
    type Output = V;

    async fn run(&self, ctx: TaskContext) -> Result<V, TaskError> {
        (self.0)(ctx).await
    }
}

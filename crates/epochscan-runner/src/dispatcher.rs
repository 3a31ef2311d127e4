//! Task dispatcher: a fixed pool of workers racing over a shared task counter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use epochscan_core::{RunConfig, TaskError, TaskResult};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::handler::{TaskContext, TaskHandler};

/// Running workers and the stream of their results.
pub struct Dispatch<V> {
    /// Completed tasks, in completion order.
    pub results: mpsc::Receiver<TaskResult<V>>,
    workers: JoinSet<usize>,
    worker_count: usize,
}

impl<V> Dispatch<V> {
    /// Number of workers spawned.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Wait for every worker to exit.
    ///
    /// Returns the number of tasks executed, or the first worker failure
    /// (a panicking handler) as a message.
    pub async fn join(&mut self) -> Result<usize, String> {
        let mut executed = 0;
        let mut failure = None;
        while let Some(joined) = self.workers.join_next().await {
            match joined {
                Ok(count) => executed += count,
                Err(e) => {
                    failure.get_or_insert_with(|| e.to_string());
                }
            }
        }
        match failure {
            Some(reason) => Err(reason),
            None => Ok(executed),
        }
    }
}

struct Shared<H> {
    handler: H,
    next_task: AtomicUsize,
    task_count: usize,
    task_timeout: Option<Duration>,
    cancel: CancellationToken,
}

/// Spawn `config.worker_count()` workers executing `handler` for every task.
///
/// Workers stop claiming tasks once `cancel` fires or the receiver is
/// closed. Handler errors are forwarded as per-task results. Must be called
/// from within a Tokio runtime.
pub fn dispatch<H: TaskHandler>(
    cancel: CancellationToken,
    config: &RunConfig,
    handler: H,
) -> Dispatch<H::Output> {
    let worker_count = config.worker_count();
    let (tx, rx) = mpsc::channel(worker_count.max(1));

    let shared = Arc::new(Shared {
        handler,
        next_task: AtomicUsize::new(0),
        task_count: config.task_count,
        task_timeout: config.task_timeout,
        cancel,
    });

    let mut workers = JoinSet::new();
    for worker in 0..worker_count {
        workers.spawn(run_worker(worker, shared.clone(), tx.clone()));
    }

    debug!(
        workers = worker_count,
        tasks = config.task_count,
        "Dispatcher started"
    );

    Dispatch {
        results: rx,
        workers,
        worker_count,
    }
}

async fn run_worker<H: TaskHandler>(
    worker: usize,
    shared: Arc<Shared<H>>,
    tx: mpsc::Sender<TaskResult<H::Output>>,
) -> usize {
    let mut executed = 0;

    loop {
        if shared.cancel.is_cancelled() {
            trace!(worker, "Run cancelled, worker stopping");
            break;
        }

        let index = shared.next_task.fetch_add(1, Ordering::Relaxed);
        if index >= shared.task_count {
            break;
        }

        let ctx = TaskContext::new(index, worker, shared.cancel.clone());
        let outcome = match shared.task_timeout {
            Some(limit) => tokio::time::timeout(limit, shared.handler.run(ctx))
                .await
                .unwrap_or(Err(TaskError::TimedOut(limit))),
            None => shared.handler.run(ctx).await,
        };
        executed += 1;

        if tx.send(TaskResult::new(index, outcome)).await.is_err() {
            trace!(worker, index, "Result receiver closed, worker stopping");
            break;
        }
    }

    trace!(worker, executed, "Worker finished");
    executed
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::handler::handler_fn;

    async fn drain<V>(running: &mut Dispatch<V>) -> Vec<TaskResult<V>> {
        let mut out = Vec::new();
        while let Some(result) = running.results.recv().await {
            out.push(result);
        }
        out
    }

    #[tokio::test]
    async fn test_every_index_claimed_once() {
        let handler = handler_fn(|ctx: TaskContext| async move {
            tokio::task::yield_now().await;
            Ok::<_, TaskError>(ctx.index())
        });

        let mut running = dispatch(CancellationToken::new(), &RunConfig::new(100, 7), handler);
        assert_eq!(running.worker_count(), 7);

        let results = drain(&mut running).await;
        let indices: BTreeSet<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(results.len(), 100);
        assert_eq!(indices, (0..100).collect());
        assert!(results.iter().all(|r| r.value() == Some(&r.index)));
        assert_eq!(running.join().await, Ok(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_task_error() {
        let handler = handler_fn(|ctx: TaskContext| async move {
            if ctx.index() == 1 {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok::<_, TaskError>(())
        });

        let config = RunConfig::new(3, 3).with_task_timeout(Duration::from_secs(1));
        let mut running = dispatch(CancellationToken::new(), &config, handler);

        let mut results = drain(&mut running).await;
        results.sort_by_key(|r| r.index);
        assert!(results[0].is_ok());
        assert!(matches!(results[1].error(), Some(TaskError::TimedOut(_))));
        assert!(results[2].is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let token = CancellationToken::new();
        token.cancel();

        let handler = handler_fn(|_ctx: TaskContext| async move { Ok::<_, TaskError>(()) });
        let mut running = dispatch(token, &RunConfig::new(10, 4), handler);

        assert!(drain(&mut running).await.is_empty());
        assert_eq!(running.join().await, Ok(0));
    }

    #[tokio::test]
    async fn test_zero_tasks_spawns_no_workers() {
        let handler = handler_fn(|_ctx: TaskContext| async move { Ok::<_, TaskError>(()) });
        let mut running = dispatch(CancellationToken::new(), &RunConfig::new(0, 4), handler);

        assert_eq!(running.worker_count(), 0);
        assert!(running.results.recv().await.is_none());
    }
}

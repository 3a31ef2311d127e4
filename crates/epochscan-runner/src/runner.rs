//! Run orchestration: dispatch, ordered collection and lifecycle.

use epochscan_core::{RunConfig, RunError, RunState, RunSummary};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::dispatcher::dispatch;
use crate::handler::{Collector, TaskHandler};
use crate::progress::ProgressReporter;
use crate::reducer::collect;

/// Executes one run. Consumed by [`Runner::run`], so it cannot be reused.
pub struct Runner {
    config: RunConfig,
    cancel: CancellationToken,
    progress: ProgressReporter,
    state: RunState,
}

impl Runner {
    /// Create a runner with its own cancellation token.
    pub fn new(config: RunConfig) -> Self {
        let progress = ProgressReporter::new(config.task_count, config.report_interval);
        Self {
            config,
            cancel: CancellationToken::new(),
            progress,
            state: RunState::Idle,
        }
    }

    /// Builder method to tie the run to an external cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this run when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute every task with `handler` and fold the results into `collector`.
    ///
    /// On error the collector holds exactly the tasks applied before the
    /// abort, a prefix `0..k` of the task indices.
    pub async fn run<H, C>(mut self, handler: H, collector: &mut C) -> Result<RunSummary, RunError>
    where
        H: TaskHandler,
        C: Collector<H::Output> + ?Sized,
    {
        let started = Instant::now();

        if let Err(e) = self.config.validate() {
            self.transition(RunState::Aborted);
            return Err(e.into());
        }

        self.transition(RunState::Running);
        let workers = self.config.worker_count();
        info!(
            tasks = self.config.task_count,
            workers,
            timeout = ?self.config.task_timeout,
            "Starting run"
        );

        // Aborting on a collector error must not cancel the caller's token.
        let run_token = self.cancel.child_token();
        let mut running = dispatch(run_token.clone(), &self.config, handler);

        let outcome = collect(&run_token, collector, &mut running.results, &mut self.progress).await;

        running.results.close();
        let joined = running.join().await;
        let outcome = match (outcome, joined) {
            (Err(RunError::WorkerLost { index, .. }), Err(reason)) => {
                Err(RunError::WorkerLost { index, reason })
            }
            (outcome, _) => outcome,
        };

        let progress = self.progress.snapshot();
        match outcome {
            Ok(()) => {
                self.transition(RunState::Completed);
                let summary = self.summary(started, workers);
                info!(
                    applied = progress.completed,
                    failed = progress.failed,
                    elapsed_ms = summary.elapsed.as_millis() as u64,
                    "Run completed"
                );
                Ok(summary)
            }
            Err(e) => {
                self.transition(RunState::Aborted);
                warn!(
                    error = %e,
                    task = ?e.task_index(),
                    applied = progress.completed,
                    total = progress.total,
                    "Run aborted"
                );
                Err(e)
            }
        }
    }

    fn summary(&self, started: Instant, workers: usize) -> RunSummary {
        let progress = self.progress.snapshot();
        RunSummary {
            state: self.state,
            applied: progress.completed,
            failed: progress.failed,
            workers,
            elapsed: started.elapsed(),
        }
    }

    fn transition(&mut self, to: RunState) {
        if let Err(e) = self.state.transition(to) {
            warn!(error = %e, "Ignoring run state transition");
        }
    }
}

//! Ordered reducer: releases out-of-order task results strictly by index.

use std::collections::BTreeMap;

use epochscan_core::{RunError, TaskError, TaskResult};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::handler::Collector;
use crate::progress::ProgressReporter;

/// Reorders task results by index.
///
/// A result is released only after every lower index has been released.
/// In the worst case (task 0 is the slowest) up to `N - 1` results wait in
/// the buffer; callers needing a tighter bound should lower concurrency.
#[derive(Debug)]
pub struct OrderedReducer<V> {
    next: usize,
    pending: BTreeMap<usize, TaskResult<V>>,
    peak_pending: usize,
}

impl<V> Default for OrderedReducer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> OrderedReducer<V> {
    /// Create a reducer expecting index 0 first.
    pub fn new() -> Self {
        Self {
            next: 0,
            pending: BTreeMap::new(),
            peak_pending: 0,
        }
    }

    /// Buffer a result.
    ///
    /// Returns false (and drops the result) if its index was already
    /// released or is already buffered.
    pub fn push(&mut self, result: TaskResult<V>) -> bool {
        if result.index < self.next || self.pending.contains_key(&result.index) {
            return false;
        }
        self.pending.insert(result.index, result);
        self.peak_pending = self.peak_pending.max(self.pending.len());
        true
    }

    /// Release the next result in index order, if it has arrived.
    pub fn pop_ready(&mut self) -> Option<TaskResult<V>> {
        let result = self.pending.remove(&self.next)?;
        self.next += 1;
        Some(result)
    }

    /// Index the reducer is waiting for.
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// Results buffered behind a missing index.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Largest buffer size observed.
    pub fn peak_pending(&self) -> usize {
        self.peak_pending
    }
}

/// Drain `results` into `collector` in index order until every task is applied.
///
/// A collector error cancels `cancel`, closes `results` and is returned as
/// [`RunError::Collect`]. Once `cancel` fires, only results already queued
/// are applied, up to the first one that gave up with
/// [`TaskError::Cancelled`], and the run ends as [`RunError::Cancelled`]
/// even if that completed the range. If the stream closes early without a
/// cancellation the run is reported as a lost worker.
pub async fn collect<V, C>(
    cancel: &CancellationToken,
    collector: &mut C,
    results: &mut mpsc::Receiver<TaskResult<V>>,
    progress: &mut ProgressReporter,
) -> Result<(), RunError>
where
    C: Collector<V> + ?Sized,
{
    let total = progress.snapshot().total;
    let mut reducer = OrderedReducer::new();
    let mut interrupted = false;

    while reducer.next_index() < total {
        let received = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            received = results.recv() => received,
        };
        let Some(result) = received else {
            interrupted = cancel.is_cancelled();
            break;
        };

        push(&mut reducer, result);
        if cancel.is_cancelled() {
            interrupted = true;
            break;
        }
        if let Err(e) = apply_ready(&mut reducer, collector, progress) {
            cancel.cancel();
            results.close();
            return Err(e);
        }
    }

    if interrupted {
        // results queued before the cancel was noticed still count
        results.close();
        while let Ok(result) = results.try_recv() {
            push(&mut reducer, result);
        }
        apply_ready_until_cancelled(&mut reducer, collector, progress)?;
    }

    let snapshot = progress.snapshot();
    let applied = snapshot.completed;
    debug!(
        applied,
        peak_pending = reducer.peak_pending(),
        progress_reports = progress.reports(),
        "Reorder buffer drained"
    );

    if interrupted {
        Err(RunError::Cancelled { applied })
    } else if snapshot.is_done() {
        Ok(())
    } else {
        Err(RunError::WorkerLost {
            index: applied,
            reason: "worker exited without reporting".to_string(),
        })
    }
}

fn push<V>(reducer: &mut OrderedReducer<V>, result: TaskResult<V>) {
    let index = result.index;
    if !reducer.push(result) {
        warn!(index, "Dropping duplicate task result");
    }
}

fn apply_ready<V, C>(
    reducer: &mut OrderedReducer<V>,
    collector: &mut C,
    progress: &mut ProgressReporter,
) -> Result<(), RunError>
where
    C: Collector<V> + ?Sized,
{
    while let Some(ready) = reducer.pop_ready() {
        apply(ready, collector, progress)?;
    }
    Ok(())
}

/// Like [`apply_ready`], stopping at the first task that gave up on cancellation.
fn apply_ready_until_cancelled<V, C>(
    reducer: &mut OrderedReducer<V>,
    collector: &mut C,
    progress: &mut ProgressReporter,
) -> Result<(), RunError>
where
    C: Collector<V> + ?Sized,
{
    while let Some(ready) = reducer.pop_ready() {
        if matches!(ready.outcome, Err(TaskError::Cancelled)) {
            break;
        }
        apply(ready, collector, progress)?;
    }
    Ok(())
}

fn apply<V, C>(
    ready: TaskResult<V>,
    collector: &mut C,
    progress: &mut ProgressReporter,
) -> Result<(), RunError>
where
    C: Collector<V> + ?Sized,
{
    let index = ready.index;
    let failed = !ready.is_ok();
    collector
        .collect(ready)
        .map_err(|e| RunError::Collect {
            index,
            source: e.into(),
        })?;
    progress.record(failed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_releases_in_index_order() {
        let mut reducer = OrderedReducer::new();
        for index in [2, 0, 3] {
            assert!(reducer.push(TaskResult::ok(index, index * 10)));
        }

        assert_eq!(reducer.pop_ready().map(|r| r.index), Some(0));
        assert!(reducer.pop_ready().is_none());
        assert_eq!(reducer.next_index(), 1);
        assert_eq!(reducer.pending(), 2);

        reducer.push(TaskResult::ok(1, 10));
        let released: Vec<usize> = std::iter::from_fn(|| reducer.pop_ready())
            .map(|r| r.index)
            .collect();
        assert_eq!(released, vec![1, 2, 3]);
        assert_eq!(reducer.peak_pending(), 3);
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut reducer = OrderedReducer::new();
        assert!(reducer.push(TaskResult::ok(0, ())));
        assert!(reducer.push(TaskResult::ok(1, ())));
        assert!(!reducer.push(TaskResult::ok(1, ())));

        reducer.pop_ready();
        assert!(!reducer.push(TaskResult::ok(0, ())));
    }

    #[tokio::test]
    async fn test_collect_applies_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        for index in [4, 1, 3, 0, 2] {
            tx.send(TaskResult::ok(index, index)).await.unwrap();
        }
        drop(tx);

        let mut seen = Vec::new();
        let mut collector = |result: TaskResult<usize>| -> Result<(), TaskError> {
            seen.push(result.outcome?);
            Ok(())
        };
        let mut progress = ProgressReporter::new(5, None);

        collect(&CancellationToken::new(), &mut collector, &mut rx, &mut progress)
            .await
            .unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert_eq!(progress.snapshot().completed, 5);
    }

    #[tokio::test]
    async fn test_collect_reports_gap_as_lost_worker() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(TaskResult::ok(0, ())).await.unwrap();
        tx.send(TaskResult::ok(2, ())).await.unwrap();
        drop(tx);

        let mut count = 0;
        let mut collector = |_: TaskResult<()>| -> Result<(), TaskError> {
            count += 1;
            Ok(())
        };
        let mut progress = ProgressReporter::new(3, None);

        let err = collect(&CancellationToken::new(), &mut collector, &mut rx, &mut progress)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::WorkerLost { index: 1, .. }));
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_cancel_applies_queued_prefix_only() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(TaskResult::ok(1, 1)).await.unwrap();
        tx.send(TaskResult::ok(0, 0)).await.unwrap();
        tx.send(TaskResult::err(2, TaskError::Cancelled)).await.unwrap();
        tx.send(TaskResult::ok(3, 3)).await.unwrap();

        let mut seen = Vec::new();
        let mut collector = |result: TaskResult<usize>| -> Result<(), TaskError> {
            seen.push(result.outcome?);
            Ok(())
        };
        let token = CancellationToken::new();
        token.cancel();
        let mut progress = ProgressReporter::new(4, None);

        let err = collect(&token, &mut collector, &mut rx, &mut progress)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Cancelled { applied: 2 }));
        assert_eq!(seen, vec![0, 1]);
        assert!(tx.send(TaskResult::ok(4, 4)).await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_after_full_range_queued_still_aborts() {
        let (tx, mut rx) = mpsc::channel(8);
        for index in 0..3 {
            tx.send(TaskResult::ok(index, ())).await.unwrap();
        }

        let mut count = 0;
        let mut collector = |_: TaskResult<()>| -> Result<(), TaskError> {
            count += 1;
            Ok(())
        };
        let token = CancellationToken::new();
        token.cancel();
        let mut progress = ProgressReporter::new(3, None);

        let err = collect(&token, &mut collector, &mut rx, &mut progress)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Cancelled { applied: 3 }));
        assert_eq!(count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting_does_not_hang() {
        let (_tx, mut rx) = mpsc::channel::<TaskResult<()>>(8);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let mut collector = |_: TaskResult<()>| -> Result<(), TaskError> { Ok(()) };
        let mut progress = ProgressReporter::new(5, None);

        let err = collect(&token, &mut collector, &mut rx, &mut progress)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Cancelled { applied: 0 }));
    }

    #[tokio::test]
    async fn test_collector_error_cancels() {
        let (tx, mut rx) = mpsc::channel(8);
        for index in 0..4 {
            tx.send(TaskResult::ok(index, index)).await.unwrap();
        }

        let mut collector = |result: TaskResult<usize>| -> Result<(), String> {
            match result.index {
                2 => Err("refused".to_string()),
                _ => Ok(()),
            }
        };
        let token = CancellationToken::new();
        let mut progress = ProgressReporter::new(4, None);

        let err = collect(&token, &mut collector, &mut rx, &mut progress)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Collect { index: 2, .. }));
        assert!(token.is_cancelled());
        assert_eq!(progress.snapshot().completed, 2);
        assert!(tx.send(TaskResult::ok(9, 9)).await.is_err());
    }
}

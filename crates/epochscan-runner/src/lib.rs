//! Bounded-concurrency task runner with deterministic, in-order reduction.
//!
//! A run executes tasks `0..N` on at most `concurrency` workers and folds
//! their results into a caller-owned [`Collector`] strictly in index order,
//! whatever order the tasks complete in.
//!
//! # Example
//!
//! ```rust,no_run
//! use epochscan_core::{RunConfig, TaskError, TaskResult};
//! use epochscan_runner::{handler_fn, Runner, TaskContext};
//!
//! async fn sum() -> Result<u64, Box<dyn std::error::Error>> {
//!     let mut total = 0u64;
//!     let mut collect = |result: TaskResult<u64>| -> Result<(), TaskError> {
//!         total += result.outcome?;
//!         Ok(())
//!     };
//!
//!     let handler = handler_fn(|ctx: TaskContext| async move {
//!         Ok::<_, TaskError>(ctx.index() as u64 * 10)
//!     });
//!     Runner::new(RunConfig::new(5, 3)).run(handler, &mut collect).await?;
//!
//!     Ok(total)
//! }
//! ```

mod dispatcher;
mod handler;
mod progress;
mod reducer;
mod runner;

pub use dispatcher::{dispatch, Dispatch};
pub use handler::{handler_fn, Collector, HandlerFn, TaskContext, TaskHandler};
pub use progress::ProgressReporter;
pub use reducer::{collect, OrderedReducer};
pub use runner::Runner;

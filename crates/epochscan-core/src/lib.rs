//! Epochscan Core Types
//!
//! This crate contains the plain data types shared by the runner and the
//! tools built on top of it, with no dependencies on:
//! - Network/RPC
//! - Async runtime
//!
//! Everything here describes one run: its configuration, its lifecycle,
//! the per-task results flowing through it and the errors it can end with.

pub mod config;
pub mod error;
pub mod progress;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use config::RunConfig;
pub use error::{BoxError, ConfigError, CoreError, RunError, TaskError};
pub use progress::Progress;
pub use status::RunState;
pub use task::{RunSummary, TaskResult};

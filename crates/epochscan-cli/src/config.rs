//! Subcommand configuration.

use std::time::Duration;

use clap::Args;
use epochscan_core::RunConfig;
use epochscan_rpc::EpochTag;

use crate::error::StatError;

/// Options for `epochscan stat`.
#[derive(Args, Debug, Clone)]
pub struct StatArgs {
    /// Epoch number to test from
    #[arg(long, default_value = "0")]
    pub epoch_from: u64,

    /// Number of epochs to test
    #[arg(long, default_value = "30")]
    pub epoch_count: u64,

    /// Number of concurrent RPC workers
    #[arg(long, env = "EPOCHSCAN_THREADS", default_value = "1")]
    pub threads: usize,

    /// Interval to report progress in milliseconds (0 disables)
    #[arg(long, default_value = "1000")]
    pub report_interval_ms: u64,

    /// Timeout for querying one epoch, in milliseconds
    #[arg(long)]
    pub task_timeout_ms: Option<u64>,

    /// Abort on the first epoch that fails instead of counting it
    #[arg(long)]
    pub fail_fast: bool,
}

impl StatArgs {
    /// Exclusive end of the epoch range.
    pub fn epoch_to(&self) -> Result<u64, StatError> {
        self.epoch_from
            .checked_add(self.epoch_count)
            .ok_or(StatError::RangeOverflow {
                from: self.epoch_from,
                count: self.epoch_count,
            })
    }

    /// Fail unless every epoch in the range is finalized.
    pub fn check_finalized(&self, finalized: u64) -> Result<(), StatError> {
        let epoch_to = self.epoch_to()?;
        if epoch_to > finalized {
            return Err(StatError::NotEnoughFinalized {
                required: epoch_to,
                finalized,
            });
        }
        Ok(())
    }

    /// Runner configuration for this range.
    pub fn run_config(&self) -> Result<RunConfig, StatError> {
        let task_count = usize::try_from(self.epoch_count).map_err(|_| StatError::RangeOverflow {
            from: self.epoch_from,
            count: self.epoch_count,
        })?;

        let mut config = RunConfig::new(task_count, self.threads);
        if self.report_interval_ms > 0 {
            config = config.with_report_interval(Duration::from_millis(self.report_interval_ms));
        }
        if let Some(ms) = self.task_timeout_ms {
            config = config.with_task_timeout(Duration::from_millis(ms));
        }
        Ok(config)
    }
}

/// Options for `epochscan poll`.
#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    /// Epoch tags to poll, comma separated
    #[arg(long = "tag", value_delimiter = ',', default_value = "latest_mined")]
    pub tags: Vec<EpochTag>,

    /// Poll interval in milliseconds
    #[arg(long, default_value = "1000")]
    pub interval_ms: u64,

    /// Stop after this many polls
    #[arg(long)]
    pub count: Option<u64>,
}

impl PollArgs {
    /// Poll interval, never zero.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

//! Tool-level errors.

use epochscan_core::TaskError;
use epochscan_rpc::RpcError;
use thiserror::Error;

/// Errors of the `stat` command.
#[derive(Debug, Error)]
pub enum StatError {
    /// The requested range reaches past the latest finalized epoch.
    #[error("Not enough finalized epochs to test: need {required}, latest finalized is {finalized}")]
    NotEnoughFinalized { required: u64, finalized: u64 },

    /// `epoch_from + epoch_count` does not fit.
    #[error("Epoch range overflows: {from} + {count}")]
    RangeOverflow { from: u64, count: u64 },

    /// An epoch failed while running with `--fail-fast`.
    #[error("Epoch {epoch} failed: {source}")]
    EpochFailed {
        epoch: u64,
        #[source]
        source: TaskError,
    },
}

/// Failure to fetch one epoch's data.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Failed to get blocks by epoch: {0}")]
    Blocks(#[source] RpcError),

    #[error("Failed to get block by hash {hash}: {source}")]
    Block {
        hash: String,
        #[source]
        source: RpcError,
    },

    #[error("Failed to get block traces by block hash {hash}: {source}")]
    Traces {
        hash: String,
        #[source]
        source: RpcError,
    },

    #[error("Failed to get epoch receipts: {0}")]
    Receipts(#[source] RpcError),
}

//! `epochscan stat`: fetch blocks, receipts and traces for a range of
//! epochs in parallel and count what came back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use epochscan_core::{RunState, TaskError, TaskResult};
use epochscan_rpc::{Block, BlockTrace, EpochTag, Receipt, RpcClient};
use epochscan_runner::{Collector, Runner, TaskContext, TaskHandler};
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::StatArgs;
use crate::error::{QueryError, StatError};
use crate::report::StatReport;

/// Everything fetched for one epoch.
#[derive(Debug, Default)]
pub struct EpochData {
    pub blocks: Vec<Block>,
    pub receipts: Vec<Vec<Receipt>>,
    pub traces: Vec<Option<BlockTrace>>,
}

impl EpochData {
    pub fn num_txs(&self) -> usize {
        self.blocks.iter().map(|b| b.transactions.len()).sum()
    }

    pub fn num_logs(&self) -> usize {
        self.receipts.iter().flatten().map(|r| r.logs.len()).sum()
    }

    pub fn num_traces(&self) -> usize {
        self.traces
            .iter()
            .flatten()
            .map(|t| t.transaction_traces.len())
            .sum()
    }
}

/// Fetch block hashes, then each block with its traces, then the receipts.
pub async fn query_epoch_data(client: &RpcClient, epoch: u64) -> Result<EpochData, QueryError> {
    let mut data = EpochData::default();

    let hashes = client
        .blocks_by_epoch(epoch)
        .await
        .map_err(QueryError::Blocks)?;

    for hash in hashes {
        let block = client
            .block_by_hash(&hash)
            .await
            .map_err(|source| QueryError::Block {
                hash: hash.clone(),
                source,
            })?;
        data.blocks.push(block);

        let traces = client
            .block_traces(&hash)
            .await
            .map_err(|source| QueryError::Traces {
                hash: hash.clone(),
                source,
            })?;
        data.traces.push(traces);
    }

    data.receipts = client
        .epoch_receipts(epoch)
        .await
        .map_err(QueryError::Receipts)?;

    Ok(data)
}

/// Task handler: task `i` queries epoch `epoch_from + i`.
pub struct EpochQuery {
    client: Arc<RpcClient>,
    epoch_from: u64,
}

impl EpochQuery {
    pub fn new(client: Arc<RpcClient>, epoch_from: u64) -> Self {
        Self { client, epoch_from }
    }
}

#[async_trait]
impl TaskHandler for EpochQuery {
    type Output = EpochData;

    async fn run(&self, ctx: TaskContext) -> Result<EpochData, TaskError> {
        let epoch = self.epoch_from + ctx.index() as u64;
        tokio::select! {
            _ = ctx.cancelled() => Err(TaskError::Cancelled),
            data = query_epoch_data(&self.client, epoch) => data.map_err(TaskError::failed),
        }
    }
}

/// Counts accumulated over the epochs, in epoch order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RpcStat {
    #[serde(skip)]
    epoch_from: u64,
    #[serde(skip)]
    fail_fast: bool,

    pub num_blocks: usize,
    pub num_txs: usize,
    pub num_logs: usize,
    pub num_traces: usize,
    pub num_errors: usize,
}

impl RpcStat {
    /// Empty stats for a range starting at `epoch_from`.
    pub fn new(epoch_from: u64, fail_fast: bool) -> Self {
        Self {
            epoch_from,
            fail_fast,
            ..Self::default()
        }
    }

    fn add(&mut self, data: &EpochData) {
        self.num_blocks += data.blocks.len();
        self.num_txs += data.num_txs();
        self.num_logs += data.num_logs();
        self.num_traces += data.num_traces();
    }
}

impl Collector<EpochData> for RpcStat {
    type Error = StatError;

    fn collect(&mut self, result: TaskResult<EpochData>) -> Result<(), StatError> {
        let epoch = self.epoch_from + result.index as u64;
        match result.outcome {
            Ok(data) => self.add(&data),
            Err(source) if self.fail_fast => return Err(StatError::EpochFailed { epoch, source }),
            Err(e) => {
                warn!(error = %e, epoch, "Failed to query epoch data");
                self.num_errors += 1;
            }
        }
        Ok(())
    }
}

/// Run the `stat` command.
pub async fn run(
    client: Arc<RpcClient>,
    args: &StatArgs,
    cancel: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let finalized = client.epoch_number(EpochTag::LatestFinalized).await?;
    args.check_finalized(finalized)?;
    let config = args.run_config()?;

    info!(
        url = %client.url(),
        epoch_from = args.epoch_from,
        epoch_count = args.epoch_count,
        finalized,
        threads = args.threads,
        "Collecting RPC statistics"
    );

    let started_at = Utc::now();
    let start = Instant::now();
    let mut stats = RpcStat::new(args.epoch_from, args.fail_fast);
    let outcome = Runner::new(config)
        .with_cancellation(cancel)
        .run(EpochQuery::new(client, args.epoch_from), &mut stats)
        .await;

    let state = match &outcome {
        Ok(_) => RunState::Completed,
        Err(_) => RunState::Aborted,
    };
    let report = StatReport {
        started_at,
        state,
        epoch_from: args.epoch_from,
        epoch_count: args.epoch_count,
        stats,
        elapsed: start.elapsed(),
    };
    report.print()?;

    outcome?;
    Ok(())
}

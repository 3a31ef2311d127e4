//! `epochscan poll`: watch epoch numbers advance.

use epochscan_rpc::{EpochTag, RpcClient};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::PollArgs;

/// Last epoch number seen per tag.
#[derive(Debug)]
pub struct Poller {
    last: Vec<(EpochTag, Option<u64>)>,
}

impl Poller {
    pub fn new(tags: &[EpochTag]) -> Self {
        Self {
            last: tags.iter().map(|tag| (*tag, None)).collect(),
        }
    }

    pub fn last(&self, tag: EpochTag) -> Option<u64> {
        self.last
            .iter()
            .find(|(t, _)| *t == tag)
            .and_then(|(_, epoch)| *epoch)
    }

    /// Query every tag once. Returns how many queries succeeded.
    pub async fn poll_once(&mut self, client: &RpcClient) -> usize {
        let mut ok = 0;
        for (tag, last) in &mut self.last {
            match client.epoch_number(*tag).await {
                Ok(epoch) => {
                    let delta = last.map(|prev| i128::from(epoch) - i128::from(prev));
                    info!(tag = %tag, epoch, delta = ?delta, "Epoch number");
                    *last = Some(epoch);
                    ok += 1;
                }
                Err(e) => warn!(
                    tag = %tag,
                    error = %e,
                    transient = e.is_transient(),
                    "Failed to get epoch number"
                ),
            }
        }
        ok
    }
}

/// Poll until cancelled or `--count` polls are done. Returns the number of polls.
pub async fn run(client: &RpcClient, args: &PollArgs, cancel: CancellationToken) -> u64 {
    let mut poller = Poller::new(&args.tags);
    let mut ticker = interval(args.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        url = %client.url(),
        tags = ?args.tags,
        interval_ms = args.interval_ms,
        "Polling epoch numbers"
    );

    let mut polls = 0;
    while args.count.map_or(true, |count| polls < count) {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Poll cancelled");
                break;
            }
            _ = ticker.tick() => {
                poller.poll_once(client).await;
                polls += 1;
            }
        }
    }

    for tag in &args.tags {
        info!(tag = %tag, epoch = ?poller.last(*tag), polls, "Last epoch number");
    }
    polls
}

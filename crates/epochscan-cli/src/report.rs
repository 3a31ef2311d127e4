//! Summary output for `epochscan stat`.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Duration;

use chrono::{DateTime, Utc};
use epochscan_core::RunState;
use serde::Serialize;

use crate::stat::RpcStat;

/// Final (or partial, when aborted) result of a stat run.
#[derive(Debug, Clone, Serialize)]
pub struct StatReport {
    pub started_at: DateTime<Utc>,
    pub state: RunState,
    pub epoch_from: u64,
    pub epoch_count: u64,
    #[serde(flatten)]
    pub stats: RpcStat,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl StatReport {
    /// Wall time divided over the requested epochs.
    pub fn avg_epoch_latency(&self) -> Duration {
        match u32::try_from(self.epoch_count) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.elapsed / n,
        }
    }

    /// Pretty JSON followed by the timing lines.
    pub fn render(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        writeln!(out, "Total elapsed: {:?}", self.elapsed).ok();
        writeln!(out, "Avg epoch latency: {:?}", self.avg_epoch_latency()).ok();
        Ok(out)
    }

    /// Write the report to stdout.
    pub fn print(&self) -> io::Result<()> {
        let rendered = self.render().map_err(io::Error::other)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()
    }
}

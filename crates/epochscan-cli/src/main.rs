//! epochscan - Conflux epoch poller and RPC statistics tool.

mod config;
mod error;
mod poll;
mod report;
mod stat;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use epochscan_rpc::RpcClient;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{PollArgs, StatArgs};

/// epochscan - query a Conflux fullnode over JSON-RPC
#[derive(Parser)]
#[command(name = "epochscan")]
#[command(about = "Conflux epoch poller and RPC statistics tool", long_about = None)]
struct Cli {
    /// Fullnode JSON-RPC URL
    #[arg(long, env = "EPOCHSCAN_URL", default_value = "https://main.confluxrpc.com")]
    url: String,

    /// Timeout for a single RPC call in milliseconds
    #[arg(long, default_value = "3000")]
    rpc_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error), overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll epoch numbers and log how they advance
    Poll(PollArgs),

    /// Fetch a range of epochs in parallel and print statistics
    Stat(StatArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let client = RpcClient::new(&cli.url)?
        .with_timeout(Duration::from_millis(cli.rpc_timeout_ms.max(1)));

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
            ctrl_c.cancel();
        }
    });

    match cli.command {
        Commands::Poll(args) => {
            poll::run(&client, &args, cancel).await;
        }
        Commands::Stat(args) => {
            stat::run(Arc::new(client), &args, cancel).await?;
        }
    }

    Ok(())
}

//! JSON-RPC client for Conflux fullnodes.
//!
//! Provides a thin HTTP transport with per-call timeouts and the handful of
//! `cfx_*` / `trace_*` methods the epoch tools need.

pub mod client;
pub mod conflux;
pub mod error;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use client::RpcClient;
pub use error::RpcError;
pub use types::{parse_quantity, Block, BlockTrace, EpochNumber, EpochTag, Receipt};

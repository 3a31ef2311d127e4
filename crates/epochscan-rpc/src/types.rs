//! Conflux RPC types.
//!
//! Only the fields the epoch tools count are decoded; everything else in
//! blocks, receipts and traces is kept as raw JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::RpcError;

/// Named epoch tags accepted by `cfx_epochNumber` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochTag {
    Earliest,
    LatestCheckpoint,
    LatestFinalized,
    LatestConfirmed,
    LatestState,
    LatestMined,
}

impl EpochTag {
    /// All tags, oldest first.
    pub const ALL: [EpochTag; 6] = [
        Self::Earliest,
        Self::LatestCheckpoint,
        Self::LatestFinalized,
        Self::LatestConfirmed,
        Self::LatestState,
        Self::LatestMined,
    ];

    /// Wire name of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earliest => "earliest",
            Self::LatestCheckpoint => "latest_checkpoint",
            Self::LatestFinalized => "latest_finalized",
            Self::LatestConfirmed => "latest_confirmed",
            Self::LatestState => "latest_state",
            Self::LatestMined => "latest_mined",
        }
    }
}

impl fmt::Display for EpochTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EpochTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("unknown epoch tag '{s}'"))
    }
}

/// An epoch selector: a tag or an explicit number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochNumber {
    Tag(EpochTag),
    Number(u64),
}

impl From<EpochTag> for EpochNumber {
    fn from(tag: EpochTag) -> Self {
        Self::Tag(tag)
    }
}

impl From<u64> for EpochNumber {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl Serialize for EpochNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Tag(tag) => serializer.serialize_str(tag.as_str()),
            Self::Number(n) => serializer.serialize_str(&format!("{n:#x}")),
        }
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(s: &str) -> Result<u64, RpcError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .filter(|d| !d.is_empty())
        .ok_or_else(|| RpcError::InvalidQuantity(s.to_string()))?;
    u64::from_str_radix(digits, 16).map_err(|_| RpcError::InvalidQuantity(s.to_string()))
}

/// A block as returned by `cfx_getBlockByHash(hash, true)`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub hash: String,
    #[serde(default)]
    pub epoch_number: Option<String>,
    #[serde(default)]
    pub transactions: Vec<Value>,
}

/// A transaction receipt; only logs are decoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub logs: Vec<Value>,
}

/// Traces of one block as returned by `trace_block`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTrace {
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub transaction_traces: Vec<Value>,
}

//! Error types for the RPC client.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when calling the fullnode.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The endpoint is not a usable URL.
    #[error("invalid endpoint url '{0}'")]
    InvalidUrl(String),

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The call did not finish within the client timeout.
    #[error("{method} timed out after {timeout:?}")]
    Timeout { method: String, timeout: Duration },

    /// Non-success HTTP status.
    #[error("HTTP {status} from {method}")]
    Status { method: String, status: u16 },

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {code} from {method}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    /// Response body could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The node answered `null` where a value is required.
    #[error("empty result from {0}")]
    EmptyResult(String),

    /// A hex quantity could not be parsed.
    #[error("invalid quantity '{0}'")]
    InvalidQuantity(String),
}

impl RpcError {
    /// Returns true for failures worth retrying (transport, timeout, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

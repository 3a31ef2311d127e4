//! JSON-RPC 2.0 over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::RpcError;

#[derive(Serialize)]
struct Request<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

/// HTTP JSON-RPC client with a per-call timeout.
pub struct RpcClient {
    inner: reqwest::Client,
    url: String,
    timeout: Duration,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Timeout applied to each call unless overridden.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

    /// Create a client for `url`.
    pub fn new(url: &str) -> Result<Self, RpcError> {
        reqwest::Url::parse(url).map_err(|_| RpcError::InvalidUrl(url.to_string()))?;
        Ok(Self {
            inner: reqwest::Client::new(),
            url: url.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            next_id: AtomicU64::new(1),
        })
    }

    /// Builder method to set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Call `method`; a `null` result is an [`RpcError::EmptyResult`].
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R, RpcError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        self.call_optional(method, params)
            .await?
            .ok_or_else(|| RpcError::EmptyResult(method.to_string()))
    }

    /// Call `method`, mapping a `null` result to `None`.
    pub async fn call_optional<P, R>(&self, method: &str, params: P) -> Result<Option<R>, RpcError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Request {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        debug!(url = %self.url, method, id, "RPC request");

        let response = self
            .inner
            .post(&self.url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(method, e))?;

        if !response.status().is_success() {
            return Err(RpcError::Status {
                method: method.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(method, e))?;
        trace!(method, id, len = body.len(), "RPC response");

        let response: Response = serde_json::from_slice(&body)?;
        if let Some(error) = response.error {
            return Err(RpcError::Rpc {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }

        match response.result {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    fn transport_error(&self, method: &str, err: reqwest::Error) -> RpcError {
        if err.is_timeout() {
            RpcError::Timeout {
                method: method.to_string(),
                timeout: self.timeout,
            }
        } else {
            RpcError::Http(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::test_support::{serve, serve_rpc};

    #[test]
    fn test_rejects_bad_url() {
        assert!(matches!(
            RpcClient::new("not a url"),
            Err(RpcError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_call_sends_envelope() {
        let url = serve_rpc(|method, params| {
            assert_eq!(method, "echo");
            json!({ "result": params })
        })
        .await;

        let client = RpcClient::new(&url).unwrap();
        let echoed: Vec<String> = client.call("echo", ["a", "b"]).await.unwrap();
        assert_eq!(echoed, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_ids_increase() {
        let router = Router::new().route(
            "/",
            post(|Json(req): Json<Value>| async move {
                Json(json!({ "jsonrpc": "2.0", "id": req["id"], "result": req["id"] }))
            }),
        );
        let url = serve(router).await;

        let client = RpcClient::new(&url).unwrap();
        let first: u64 = client.call("id", ()).await.unwrap();
        let second: u64 = client.call("id", ()).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_null_result() {
        let url = serve_rpc(|_, _| json!({ "result": null })).await;
        let client = RpcClient::new(&url).unwrap();

        let missing: Option<u64> = client.call_optional("trace_block", ["0x1"]).await.unwrap();
        assert!(missing.is_none());

        let err = client.call::<_, u64>("cfx_epochNumber", ()).await.unwrap_err();
        assert!(matches!(err, RpcError::EmptyResult(m) if m == "cfx_epochNumber"));
    }

    #[tokio::test]
    async fn test_rpc_error_object() {
        let url = serve_rpc(|_, _| {
            json!({ "error": { "code": -32602, "message": "Invalid params" } })
        })
        .await;
        let client = RpcClient::new(&url).unwrap();

        let err = client.call::<_, Value>("cfx_getBlockByHash", ["0x"]).await.unwrap_err();
        assert!(matches!(err, RpcError::Rpc { code: -32602, .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_timeout() {
        let router = Router::new().route(
            "/",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({ "result": 1 }))
            }),
        );
        let url = serve(router).await;

        let client = RpcClient::new(&url)
            .unwrap()
            .with_timeout(Duration::from_millis(50));
        let err = client.call::<_, u64>("slow", ()).await.unwrap_err();
        assert!(matches!(err, RpcError::Timeout { .. }));
        assert!(err.is_transient());
    }
}

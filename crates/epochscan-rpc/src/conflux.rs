//! Conflux `cfx_*` and `trace_*` methods.

use crate::client::RpcClient;
use crate::error::RpcError;
use crate::types::{parse_quantity, Block, BlockTrace, EpochNumber, Receipt};

impl RpcClient {
    /// `cfx_epochNumber`: the epoch number at `epoch` (usually a tag).
    pub async fn epoch_number(&self, epoch: impl Into<EpochNumber>) -> Result<u64, RpcError> {
        let hex: String = self.call("cfx_epochNumber", [epoch.into()]).await?;
        parse_quantity(&hex)
    }

    /// `cfx_getBlocksByEpoch`: block hashes of an epoch, pivot block last.
    pub async fn blocks_by_epoch(&self, epoch: u64) -> Result<Vec<String>, RpcError> {
        self.call("cfx_getBlocksByEpoch", [EpochNumber::Number(epoch)])
            .await
    }

    /// `cfx_getBlockByHash` with full transactions.
    pub async fn block_by_hash(&self, hash: &str) -> Result<Block, RpcError> {
        self.call("cfx_getBlockByHash", (hash, true)).await
    }

    /// `trace_block`: `None` when the node has no traces for the block.
    pub async fn block_traces(&self, hash: &str) -> Result<Option<BlockTrace>, RpcError> {
        self.call_optional("trace_block", [hash]).await
    }

    /// `cfx_getEpochReceipts`: receipts grouped per block.
    pub async fn epoch_receipts(&self, epoch: u64) -> Result<Vec<Vec<Receipt>>, RpcError> {
        self.call("cfx_getEpochReceipts", [EpochNumber::Number(epoch)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::test_support::serve_rpc;
    use crate::types::EpochTag;
    use crate::RpcClient;

    fn fullnode(method: &str, params: Value) -> Value {
        let result = match method {
            "cfx_epochNumber" => match params[0].as_str() {
                Some("latest_finalized") => json!("0x64"),
                _ => json!("0xc8"),
            },
            "cfx_getBlocksByEpoch" => {
                assert_eq!(params, json!(["0xa"]));
                json!(["0xb1", "0xb2"])
            }
            "cfx_getBlockByHash" => {
                assert_eq!(params[1], json!(true));
                json!({ "hash": params[0], "transactions": [{}, {}, {}] })
            }
            "trace_block" if params[0] == "0xb2" => Value::Null,
            "trace_block" => json!({ "transactionTraces": [{ "traces": [] }] }),
            "cfx_getEpochReceipts" => json!([[{ "logs": [{}, {}] }], [{ "logs": [] }]]),
            _ => return json!({ "error": { "code": -32601, "message": "Method not found" } }),
        };
        json!({ "result": result })
    }

    #[tokio::test]
    async fn test_epoch_number() {
        let client = RpcClient::new(&serve_rpc(fullnode).await).unwrap();
        assert_eq!(client.epoch_number(EpochTag::LatestFinalized).await.unwrap(), 100);
        assert_eq!(client.epoch_number(EpochTag::LatestMined).await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_epoch_queries() {
        let client = RpcClient::new(&serve_rpc(fullnode).await).unwrap();

        let hashes = client.blocks_by_epoch(10).await.unwrap();
        assert_eq!(hashes, vec!["0xb1", "0xb2"]);

        let block = client.block_by_hash("0xb1").await.unwrap();
        assert_eq!(block.hash, "0xb1");
        assert_eq!(block.transactions.len(), 3);

        assert_eq!(
            client
                .block_traces("0xb1")
                .await
                .unwrap()
                .map(|t| t.transaction_traces.len()),
            Some(1)
        );
        assert!(client.block_traces("0xb2").await.unwrap().is_none());

        let receipts = client.epoch_receipts(10).await.unwrap();
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0][0].logs.len(), 2);
    }
}

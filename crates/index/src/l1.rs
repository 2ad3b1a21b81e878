//! Remote chain access.
//!
//! The read API needs two things from the settlement chain: the current tip
//! height and block metadata by height. Everything else comes from the local
//! store.

use alloy_primitives::B256;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::{IndexError, IndexResult};
use crate::types::BlockContext;

/// Minimal view of the settlement chain.
#[async_trait]
pub trait RemoteChainClient: Send + Sync {
    /// Current tip height.
    async fn tip_height(&self) -> IndexResult<u64>;

    /// Block metadata at `number`, or `None` past the tip.
    async fn block_by_number(&self, number: u64) -> IndexResult<Option<BlockContext>>;
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlock {
    number: String,
    timestamp: String,
    hash: B256,
}

fn parse_hex_quantity(s: &str) -> IndexResult<u64> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16)
        .map_err(|e| IndexError::Upstream(format!("bad hex quantity {s:?}: {e}")))
}

/// JSON-RPC client over HTTP for any Ethereum-compatible endpoint.
pub struct HttpChainClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpChainClient {
    /// Create a client against an HTTP JSON-RPC endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> IndexResult<Option<T>> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| IndexError::Upstream(format!("{method} request failed: {e}")))?;

        let parsed: JsonRpcResponse<T> = response
            .json()
            .await
            .map_err(|e| IndexError::Upstream(format!("{method} returned invalid body: {e}")))?;

        if let Some(err) = parsed.error {
            return Err(IndexError::Upstream(format!(
                "{method} failed with code {}: {}",
                err.code, err.message
            )));
        }
        Ok(parsed.result)
    }
}

#[async_trait]
impl RemoteChainClient for HttpChainClient {
    async fn tip_height(&self) -> IndexResult<u64> {
        let height: String = self
            .call("eth_blockNumber", json!([]))
            .await?
            .ok_or_else(|| IndexError::Upstream("eth_blockNumber returned null".to_string()))?;
        parse_hex_quantity(&height)
    }

    async fn block_by_number(&self, number: u64) -> IndexResult<Option<BlockContext>> {
        let tag = format!("0x{number:x}");
        let block: Option<RpcBlock> = self
            .call("eth_getBlockByNumber", json!([tag, false]))
            .await?;

        let Some(block) = block else {
            return Ok(None);
        };
        Ok(Some(BlockContext {
            number: parse_hex_quantity(&block.number)?,
            timestamp: parse_hex_quantity(&block.timestamp)?,
            hash: block.hash,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_quantities_parse_with_and_without_prefix() {
        assert_eq!(parse_hex_quantity("0x1a").expect("parse"), 26);
        assert_eq!(parse_hex_quantity("0x0").expect("parse"), 0);
        assert_eq!(parse_hex_quantity("ff").expect("parse"), 255);
    }

    #[test]
    fn bad_hex_quantity_is_an_upstream_error() {
        let err = parse_hex_quantity("0xzz").expect_err("must not parse");
        assert!(matches!(err, IndexError::Upstream(_)));
    }

    #[test]
    fn rpc_block_deserializes_camel_case_fields() {
        let raw = r#"{
            "number": "0x64",
            "timestamp": "0x3e8",
            "hash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "parentHash": "0x0000000000000000000000000000000000000000000000000000000000000000"
        }"#;
        let block: RpcBlock = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(block.number, "0x64");
        assert_eq!(block.timestamp, "0x3e8");
        assert_eq!(block.hash, B256::repeat_byte(0x11));
    }
}

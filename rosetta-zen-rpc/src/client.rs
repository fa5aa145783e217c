use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use rosetta_zen_chain::{Hash, Height};

use crate::error::RpcError;
use crate::retry::RetryPolicy;
use crate::types::{BlockchainInfo, PeerInfo, RawBlock};

/// Operations named in §4.A, over the node's JSON-RPC surface.
#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn get_best_block(&self) -> Result<Height, RpcError>;
    async fn get_hash_from_index(&self, height: Height) -> Result<Hash, RpcError>;
    async fn get_block(&self, hash: Hash) -> Result<RawBlock, RpcError>;
    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, RpcError>;
    async fn get_peers(&self) -> Result<Vec<PeerInfo>, RpcError>;
    async fn get_raw_mempool(&self) -> Result<Vec<Hash>, RpcError>;
    async fn suggested_fee_rate(&self, conf_target: u32) -> Result<f64, RpcError>;
    async fn send_raw_transaction(&self, hex: &str) -> Result<Hash, RpcError>;
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct FeeEstimate {
    feerate: Option<Decimal>,
    #[serde(default)]
    errors: Vec<String>,
}

/// `reqwest`-backed [`NodeClient`], grounded on the retry/typed-decoding
/// shape the pack's bitcoind JSON-RPC clients use.
pub struct HttpNodeClient {
    http: reqwest::Client,
    url: String,
    auth: Option<(String, String)>,
    timeout: Duration,
    retry: RetryPolicy,
    next_id: AtomicU64,
}

impl HttpNodeClient {
    pub fn new(url: String, auth: Option<(String, String)>, timeout: Duration, retry: RetryPolicy) -> HttpNodeClient {
        HttpNodeClient {
            http: reqwest::Client::new(),
            url,
            auth,
            timeout,
            retry,
            next_id: AtomicU64::new(0),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T, RpcError> {
        let mut attempt = 0;
        loop {
            match self.call_once(method, params.clone()).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    tracing::warn!(method, attempt, ?delay, error = %err, "retrying node rpc call");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) if err.is_retryable() => {
                    return Err(RpcError::RetriesExhausted {
                        attempts: attempt + 1,
                        last: Box::new(err),
                    })
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn call_once<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest { jsonrpc: "1.0", id, method, params };

        let mut builder = self.http.post(&self.url).json(&request).timeout(self.timeout);
        if let Some((user, pass)) = &self.auth {
            builder = builder.basic_auth(user, Some(pass));
        }

        let response = builder.send().await?;
        if response.status().is_server_error() {
            return Err(RpcError::Transport(response.error_for_status().unwrap_err()));
        }

        let body: JsonRpcResponse<T> = response.json().await?;
        if let Some(error) = body.error {
            return Err(RpcError::from_node_error(error.code, error.message));
        }
        body.result.ok_or_else(|| {
            RpcError::InvalidResponse(serde::de::Error::custom("missing result"))
        })
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn get_best_block(&self) -> Result<Height, RpcError> {
        let height: i64 = self.call("getblockcount", vec![]).await?;
        Ok(Height(height))
    }

    async fn get_hash_from_index(&self, height: Height) -> Result<Hash, RpcError> {
        let hash: String = self.call("getblockhash", vec![Value::from(height.value())]).await?;
        hash.parse().map_err(|_| RpcError::InvalidResponse(serde::de::Error::custom("invalid hash hex")))
    }

    async fn get_block(&self, hash: Hash) -> Result<RawBlock, RpcError> {
        self.call("getblock", vec![Value::from(hash.to_string()), Value::from(2)]).await
    }

    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, RpcError> {
        self.call("getblockchaininfo", vec![]).await
    }

    async fn get_peers(&self) -> Result<Vec<PeerInfo>, RpcError> {
        self.call("getpeerinfo", vec![]).await
    }

    async fn get_raw_mempool(&self) -> Result<Vec<Hash>, RpcError> {
        let txids: Vec<String> = self.call("getrawmempool", vec![Value::from(false)]).await?;
        txids
            .into_iter()
            .map(|txid| txid.parse().map_err(|_| RpcError::InvalidResponse(serde::de::Error::custom("invalid txid hex"))))
            .collect()
    }

    async fn suggested_fee_rate(&self, conf_target: u32) -> Result<f64, RpcError> {
        let estimate: FeeEstimate = self.call("estimatesmartfee", vec![Value::from(conf_target)]).await?;
        match estimate.feerate {
            Some(rate) => rate.to_f64().ok_or_else(|| {
                RpcError::InvalidResponse(serde::de::Error::custom("fee rate out of range"))
            }),
            None => Err(RpcError::Domain {
                code: -1,
                message: estimate.errors.join("; "),
            }),
        }
    }

    async fn send_raw_transaction(&self, hex: &str) -> Result<Hash, RpcError> {
        let txid: String = self.call("sendrawtransaction", vec![Value::from(hex)]).await?;
        txid.parse().map_err(|_| RpcError::InvalidResponse(serde::de::Error::custom("invalid txid hex")))
    }
}

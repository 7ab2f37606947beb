//! JSON-RPC access to the chain node.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use primitive_types::{H160, H256, U256};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{data_hex, CallRequest, SignedCall, TransactionReceipt};

/// How often a pending transaction's receipt is polled for.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP transport failed before a JSON-RPC response was read.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The node returned a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node returned a result this client cannot interpret.
    #[error("malformed rpc response: {0}")]
    MalformedResponse(&'static str),

    /// The transaction was included but reverted.
    #[error("transaction {0:?} reverted")]
    TransactionReverted(H256),
}

/// Read and submit operations this client needs from a chain node.
///
/// Implementations must not retry or reorder requests; every method is a
/// single round trip whose failure is surfaced unchanged.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chain_id(&self) -> Result<u64, Error>;

    /// The account's current transaction count against the latest state.
    async fn transaction_count(&self, address: H160) -> Result<u64, Error>;

    async fn gas_price(&self) -> Result<U256, Error>;

    async fn estimate_gas(&self, call: &CallRequest) -> Result<U256, Error>;

    /// The node's current X25519 public key for calldata encryption.
    async fn node_public_key(&self) -> Result<[u8; 32], Error>;

    /// Submits a raw signed transaction, returning its hash without waiting
    /// for inclusion.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<H256, Error>;

    /// Executes a signed read-only call against the latest state.
    async fn call(&self, call: &SignedCall) -> Result<Vec<u8>, Error>;

    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<TransactionReceipt>, Error>;

    /// Polls until the transaction is included, failing if it reverted.
    async fn wait_for_receipt(&self, hash: H256) -> Result<TransactionReceipt, Error> {
        loop {
            if let Some(receipt) = self.transaction_receipt(hash).await? {
                if receipt.status == Some(0) {
                    return Err(Error::TransactionReverted(hash));
                }
                return Ok(receipt);
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// A JSON-RPC 2.0 client over HTTP.
pub struct HttpProvider {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, Error> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            method,
            params,
        };
        tracing::debug!(method, id = request.id, "rpc request");
        let response: JsonRpcResponse = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;
        if let Some(error) = response.error {
            return Err(Error::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        serde_json::from_value(response.result)
            .map_err(|_| Error::MalformedResponse("unexpected result shape"))
    }

    async fn request_quantity(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<u64, Error> {
        let quantity: U256 = self.request(method, params).await?;
        quantity
            .try_into()
            .map_err(|_| Error::MalformedResponse("quantity out of range"))
    }

    async fn request_bytes(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Vec<u8>, Error> {
        let raw: String = self.request(method, params).await?;
        data_hex::decode(&raw).map_err(Error::MalformedResponse)
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn chain_id(&self) -> Result<u64, Error> {
        self.request_quantity("eth_chainId", serde_json::json!([]))
            .await
    }

    async fn transaction_count(&self, address: H160) -> Result<u64, Error> {
        self.request_quantity(
            "eth_getTransactionCount",
            serde_json::json!([address, "latest"]),
        )
        .await
    }

    async fn gas_price(&self) -> Result<U256, Error> {
        self.request("eth_gasPrice", serde_json::json!([])).await
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<U256, Error> {
        self.request("eth_estimateGas", serde_json::json!([call]))
            .await
    }

    async fn node_public_key(&self) -> Result<[u8; 32], Error> {
        let raw = self
            .request_bytes("eth_getNodePublicKey", serde_json::json!([]))
            .await?;
        raw.try_into()
            .map_err(|_| Error::MalformedResponse("node key is not 32 bytes"))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<H256, Error> {
        self.request(
            "eth_sendRawTransaction",
            serde_json::json!([data_hex::encode(raw)]),
        )
        .await
    }

    async fn call(&self, call: &SignedCall) -> Result<Vec<u8>, Error> {
        self.request_bytes("eth_call", serde_json::json!([call, "latest"]))
            .await
    }

    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<TransactionReceipt>, Error> {
        self.request("eth_getTransactionReceipt", serde_json::json!([hash]))
            .await
    }
}

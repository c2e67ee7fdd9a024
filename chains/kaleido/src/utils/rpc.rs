use anyhow::{Context, Result};
use async_trait::async_trait;
use core_logic::{ActivityError, RunContext};
use ethers::types::{Address, Bytes, TransactionReceipt, H256, U256};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// The chain surface the bot needs. Everything above this trait is
/// transport-agnostic, which is also the seam the tests mock.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn get_balance(&self, address: Address) -> Result<U256>;
    async fn pending_transaction_count(&self, address: Address) -> Result<U256>;
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;
    async fn gas_price(&self) -> Result<U256>;
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256>;
    async fn transaction_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>>;
}

/// JSON-RPC 2.0 client over a per-account, optionally proxied HTTP
/// transport. No retries at this layer; retrying is the caller's
/// decision (and only the faucet claim does it).
pub struct RpcClient {
    url: String,
    client: Client,
}

impl RpcClient {
    pub fn new(url: &str, proxy: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = proxy {
            // reqwest selects HTTP or SOCKS transport from the scheme.
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            url: url.to_string(),
            client: builder.build().context("Failed to build HTTP client")?,
        })
    }

    /// One JSON-RPC exchange with a fresh random request id. Returns
    /// the `result` member, `None` when the node answered without one
    /// (or with an explicit `null`).
    async fn raw_request(&self, method: &str, params: Value) -> Result<Option<Value>> {
        let id: u64 = rand::random();
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("JSON-RPC call failed ({})", method))?;

        let data: Value = response
            .json()
            .await
            .with_context(|| format!("JSON-RPC call failed ({})", method))?;

        if let Some(err) = data.get("error") {
            return Err(ActivityError::Rpc {
                method: method.to_string(),
                code: err.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            }
            .into());
        }

        match data.get("result") {
            Some(v) if !v.is_null() => Ok(Some(v.clone())),
            _ => Ok(None),
        }
    }

    /// Like [`raw_request`], but a missing result is an error. An
    /// explicit empty-string result is accepted.
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        debug!("JSON-RPC request: {}", method);
        self.raw_request(method, params).await?.ok_or_else(|| {
            ActivityError::Rpc {
                method: method.to_string(),
                code: 0,
                message: "No result in RPC response".to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl ChainRpc for RpcClient {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        let result = self
            .request("eth_getBalance", json!([address, "latest"]))
            .await?;
        serde_json::from_value(result).context("Malformed balance in RPC response")
    }

    async fn pending_transaction_count(&self, address: Address) -> Result<U256> {
        let result = self
            .request("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        serde_json::from_value(result).context("Malformed transaction count in RPC response")
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let result = self
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        serde_json::from_value(result).context("Malformed call output in RPC response")
    }

    async fn gas_price(&self) -> Result<U256> {
        let result = self.request("eth_gasPrice", json!([])).await?;
        serde_json::from_value(result).context("Malformed gas price in RPC response")
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256> {
        let result = self
            .request("eth_sendRawTransaction", json!([raw]))
            .await?;
        serde_json::from_value(result).context("Malformed transaction hash in RPC response")
    }

    async fn transaction_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>> {
        match self
            .raw_request("eth_getTransactionReceipt", json!([hash]))
            .await?
        {
            Some(v) => Ok(Some(
                serde_json::from_value(v).context("Malformed receipt in RPC response")?,
            )),
            None => Ok(None),
        }
    }
}

pub const RECEIPT_POLL: Duration = Duration::from_secs(3);
const RECEIPT_MAX_POLLS: u32 = 100;

/// Polls for a transaction receipt through the interruptible sleep.
/// A stop request surfaces as `Cancelled` at the next poll boundary;
/// the submission itself is never aborted mid-flight.
pub async fn wait_for_receipt(
    rpc: &dyn ChainRpc,
    run: &RunContext,
    hash: H256,
) -> Result<TransactionReceipt> {
    for _ in 0..RECEIPT_MAX_POLLS {
        if let Some(receipt) = rpc.transaction_receipt(hash).await? {
            return Ok(receipt);
        }
        if run.is_stopped() {
            return Err(ActivityError::Cancelled.into());
        }
        run.sleep(RECEIPT_POLL).await;
    }
    anyhow::bail!("Timed out waiting for receipt of {:?}", hash)
}

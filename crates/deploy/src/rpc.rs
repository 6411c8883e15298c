//! Ethereum JSON-RPC client backed by a node that manages the signing keys.

use std::time::Duration;

use alloy_core::primitives::{Address, TxHash};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::client::{ChainClient, TransactionReceipt, TransactionRequest};

/// Default timeout for RPC requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
///
/// # Returns
/// The deserialized result, or an error if the request failed or returned an error response.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &Url,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    let response = client
        .post(url.clone())
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    if let Some(error) = result.get("error") {
        anyhow::bail!(
            "RPC error from {}: {}",
            method,
            error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
        );
    }

    let result_value = result
        .get("result")
        .with_context(|| format!("No result in {} response", method))?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// A [`ChainClient`] talking to a node over HTTP JSON-RPC.
///
/// Transactions are sent with `eth_sendTransaction`, so the node (Hardhat,
/// Anvil, or a node with unlocked accounts) signs them and assigns nonces.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: Url,
}

impl RpcClient {
    pub fn new(url: &str) -> Result<Self, anyhow::Error> {
        let url = Url::parse(url).with_context(|| format!("Invalid RPC URL '{}'", url))?;
        Ok(Self {
            http: create_client()?,
            url,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The chain ID reported by the node.
    pub async fn chain_id(&self) -> Result<u64, anyhow::Error> {
        let chain_id: String = json_rpc_call(&self.http, &self.url, "eth_chainId", vec![]).await?;
        u64::from_str_radix(chain_id.trim_start_matches("0x"), 16)
            .with_context(|| format!("Invalid chain id '{}'", chain_id))
    }
}

impl ChainClient for RpcClient {
    async fn accounts(&self) -> Result<Vec<Address>, anyhow::Error> {
        json_rpc_call(&self.http, &self.url, "eth_accounts", vec![]).await
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, anyhow::Error> {
        let tx = serde_json::to_value(&tx).context("Failed to serialize transaction")?;
        json_rpc_call(&self.http, &self.url, "eth_sendTransaction", vec![tx]).await
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, anyhow::Error> {
        json_rpc_call(
            &self.http,
            &self.url,
            "eth_getTransactionReceipt",
            vec![serde_json::json!(tx_hash)],
        )
        .await
    }
}

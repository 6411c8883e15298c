//! Chain client abstraction and transaction confirmation.
//!
//! The provisioning phases only talk to the chain through [`ChainClient`]:
//! listing the node's signing accounts, submitting node-signed transactions,
//! and fetching receipts. [`PendingTx`] turns a submitted hash into a
//! confirmed [`TransactionReceipt`] under a bounded wait.

use std::{future::Future, time::Duration};

use alloy_core::primitives::{Address, Bytes, TxHash};
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::{
    abi::{Abi, ContractAbi},
    error::{Phase, ProvisionError},
    events::{Event, Log},
};

/// Default maximum time to wait for a transaction to be mined.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Default interval between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A transaction to be signed by the node on behalf of `from`.
///
/// `to` is `None` for contract creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub from: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    pub data: Bytes,
}

/// A mined transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    #[serde(default, deserialize_with = "deserialize_opt_u64_from_hex")]
    pub block_number: Option<u64>,
    /// `1` on success, `0` on revert. Absent on pre-Byzantium chains.
    #[serde(default, deserialize_with = "deserialize_opt_u64_from_hex")]
    pub status: Option<u64>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status != Some(0)
    }

    /// Decode the receipt's logs, in order, against `abi`.
    ///
    /// Logs the ABI does not describe, or that fail to decode, are kept as
    /// [`Event::UNKNOWN`] so positions are preserved.
    pub fn events(&self, abi: &Abi) -> Vec<Event> {
        self.logs
            .iter()
            .map(|log| match abi.decode_log(log) {
                Ok(Some(event)) => event,
                Ok(None) => Event::unknown(log.address),
                Err(e) => {
                    tracing::warn!(
                        error = %format!("{:#}", e),
                        emitter = %log.address,
                        tx_hash = %self.transaction_hash,
                        "Failed to decode receipt log"
                    );
                    Event::unknown(log.address)
                }
            })
            .collect()
    }
}

/// Deserialize an optional u64 from a hex string (with 0x prefix).
fn deserialize_opt_u64_from_hex<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Deserialize::deserialize(deserializer)?;
    s.map(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16))
        .transpose()
        .map_err(serde::de::Error::custom)
}

/// Access to a node that holds the signing keys.
pub trait ChainClient: Send + Sync {
    /// The accounts the node can sign for, in node order.
    fn accounts(&self) -> impl Future<Output = Result<Vec<Address>>> + Send;

    /// Submit a transaction for the node to sign and broadcast.
    fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> impl Future<Output = Result<TxHash>> + Send;

    /// Fetch the receipt of a transaction, `None` while it is pending.
    fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<Option<TransactionReceipt>>> + Send;
}

/// How long to wait for confirmations and how often to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Failure to observe a receipt.
#[derive(Debug, Error)]
pub enum ConfirmError {
    #[error("transaction {tx_hash} not confirmed within {timeout:?}")]
    Timeout { tx_hash: TxHash, timeout: Duration },
    #[error("{0:#}")]
    Client(anyhow::Error),
}

impl ConfirmError {
    /// Map into the run's error taxonomy.
    ///
    /// Timeouts keep their own variant; client errors become the phase's failure.
    pub fn into_provision(
        self,
        phase: Phase,
        on_client_error: impl FnOnce(anyhow::Error) -> ProvisionError,
    ) -> ProvisionError {
        match self {
            Self::Timeout { tx_hash, timeout } => ProvisionError::Timeout {
                phase,
                tx_hash,
                timeout,
            },
            Self::Client(cause) => on_client_error(cause),
        }
    }
}

/// A submitted transaction awaiting confirmation.
#[derive(Debug)]
pub struct PendingTx<'a, C> {
    client: &'a C,
    tx_hash: TxHash,
    policy: ConfirmationPolicy,
}

impl<'a, C: ChainClient> PendingTx<'a, C> {
    pub fn new(client: &'a C, tx_hash: TxHash, policy: ConfirmationPolicy) -> Self {
        Self {
            client,
            tx_hash,
            policy,
        }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Wait until the transaction is mined and return its receipt.
    ///
    /// A reverted transaction is still a confirmed one; callers check
    /// [`TransactionReceipt::succeeded`].
    pub async fn confirm(self) -> Result<TransactionReceipt, ConfirmError> {
        match tokio::time::timeout(self.policy.timeout, self.poll_receipt()).await {
            Ok(result) => result,
            Err(_) => Err(ConfirmError::Timeout {
                tx_hash: self.tx_hash,
                timeout: self.policy.timeout,
            }),
        }
    }

    async fn poll_receipt(&self) -> Result<TransactionReceipt, ConfirmError> {
        loop {
            let receipt = self
                .client
                .transaction_receipt(self.tx_hash)
                .await
                .map_err(ConfirmError::Client)?;

            if let Some(receipt) = receipt {
                tracing::debug!(
                    tx_hash = %self.tx_hash,
                    block_number = ?receipt.block_number,
                    succeeded = receipt.succeeded(),
                    "Transaction confirmed"
                );
                return Ok(receipt);
            }

            tracing::trace!(tx_hash = %self.tx_hash, "Receipt not available yet, polling...");
            tokio::time::sleep(self.policy.poll_interval).await;
        }
    }
}

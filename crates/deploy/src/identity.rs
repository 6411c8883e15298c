//! Acting identity selection.

use std::{fmt, str::FromStr};

use alloy_core::primitives::Address;
use anyhow::Context;
use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};

use crate::{client::ChainClient, error::ProvisionError};

/// The account that signs and pays for every transaction of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Deref)]
pub struct Identity(Address);

impl Identity {
    pub fn address(&self) -> Address {
        self.0
    }
}

/// Which of the node's accounts to act as.
///
/// In TOML, an integer selects by position and a `0x` string by address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentitySelector {
    /// Position in the node's account list (0 is the default deployer).
    Index(usize),
    Address(Address),
}

impl Default for IdentitySelector {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl FromStr for IdentitySelector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") {
            let address = s
                .parse()
                .with_context(|| format!("Invalid identity address '{}'", s))?;
            Ok(Self::Address(address))
        } else {
            let index = s
                .parse()
                .with_context(|| format!("Invalid identity '{}': expected an index or 0x address", s))?;
            Ok(Self::Index(index))
        }
    }
}

impl fmt::Display for IdentitySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{}", index),
            Self::Address(address) => write!(f, "{}", address),
        }
    }
}

/// Resolve the acting identity from the node's accounts.
pub async fn resolve_identity<C: ChainClient>(
    client: &C,
    selector: IdentitySelector,
) -> Result<Identity, ProvisionError> {
    let accounts = client
        .accounts()
        .await
        .map_err(|e| ProvisionError::IdentityUnavailable {
            reason: format!("failed to list accounts: {:#}", e),
        })?;

    tracing::debug!(accounts = accounts.len(), selector = %selector, "Resolving identity");

    if accounts.is_empty() {
        return Err(ProvisionError::IdentityUnavailable {
            reason: "the node exposes no accounts".to_string(),
        });
    }

    let address = match selector {
        IdentitySelector::Index(index) => {
            accounts
                .get(index)
                .copied()
                .ok_or_else(|| ProvisionError::IdentityUnavailable {
                    reason: format!(
                        "account index {} is out of range ({} available)",
                        index,
                        accounts.len()
                    ),
                })?
        }
        IdentitySelector::Address(address) => accounts
            .iter()
            .copied()
            .find(|account| *account == address)
            .ok_or_else(|| ProvisionError::IdentityUnavailable {
                reason: format!("account {} is not managed by the node", address),
            })?,
    };

    Ok(Identity(address))
}

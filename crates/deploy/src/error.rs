//! Error taxonomy for the provisioning run.
//!
//! Every variant is fatal for the run: nothing here is retried, and on-chain
//! state created before the failure is left in place.

use std::time::Duration;

use alloy_core::primitives::{Address, TxHash};
use thiserror::Error;

/// The phase of the run an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Phase {
    IdentityResolution,
    Provisioning,
    PairCreation,
    Authorization,
}

/// A fatal provisioning error.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// No signing identity matches the configured selector.
    #[error("no signing identity available: {reason}")]
    IdentityUnavailable { reason: String },

    /// A component failed to deploy, or its deployment was not confirmed.
    #[error("failed to deploy {component}: {cause:#}")]
    DeploymentFailure {
        component: String,
        cause: anyhow::Error,
    },

    /// The pair-creation transaction itself failed or reverted.
    #[error("failed to create pair through {factory}: {cause:#}")]
    PairCreationFailure {
        factory: String,
        cause: anyhow::Error,
    },

    /// The pair-creation transaction confirmed but emitted no matching event.
    #[error("transaction {tx_hash} emitted no `{event}` event carrying an address in `{field}`")]
    EventNotFound {
        event: String,
        field: String,
        tx_hash: TxHash,
    },

    /// The pair-creation transaction emitted more than one matching event.
    #[error("transaction {tx_hash} emitted {count} `{event}` events, expected exactly one")]
    AmbiguousEvent {
        event: String,
        count: usize,
        tx_hash: TxHash,
    },

    /// An approval transaction failed or reverted.
    #[error("failed to approve {spender} on {token}: {cause:#}")]
    AuthorizationFailure {
        token: String,
        spender: Address,
        cause: anyhow::Error,
    },

    /// A submitted transaction was not confirmed in time.
    #[error("{phase}: transaction {tx_hash} not confirmed within {timeout:?}")]
    Timeout {
        phase: Phase,
        tx_hash: TxHash,
        timeout: Duration,
    },
}

impl ProvisionError {
    /// The phase this error aborted.
    pub fn phase(&self) -> Phase {
        match self {
            Self::IdentityUnavailable { .. } => Phase::IdentityResolution,
            Self::DeploymentFailure { .. } => Phase::Provisioning,
            Self::PairCreationFailure { .. }
            | Self::EventNotFound { .. }
            | Self::AmbiguousEvent { .. } => Phase::PairCreation,
            Self::AuthorizationFailure { .. } => Phase::Authorization,
            Self::Timeout { phase, .. } => *phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display_is_kebab_case() {
        assert_eq!(Phase::IdentityResolution.to_string(), "identity-resolution");
        assert_eq!(Phase::PairCreation.to_string(), "pair-creation");
    }

    #[test]
    fn test_timeout_reports_its_own_phase() {
        let err = ProvisionError::Timeout {
            phase: Phase::Authorization,
            tx_hash: TxHash::ZERO,
            timeout: Duration::from_secs(3),
        };
        assert_eq!(err.phase(), Phase::Authorization);
        assert!(err.to_string().starts_with("authorization: transaction"));
    }

    #[test]
    fn test_deployment_failure_includes_cause_chain() {
        let cause = anyhow::anyhow!("insufficient funds").context("eth_sendTransaction failed");
        let err = ProvisionError::DeploymentFailure {
            component: "DEXRouter".to_string(),
            cause,
        };
        let message = err.to_string();
        assert!(message.contains("DEXRouter"));
        assert!(message.contains("insufficient funds"));
        assert_eq!(err.phase(), Phase::Provisioning);
    }
}

//! Pair creation through the factory and recovery of the pair address.
//!
//! The factory does not return the new pair's address to an external caller;
//! it is recovered from the `PairCreated` event in the confirmed receipt.

use alloy_core::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{
    abi::AbiValue,
    client::ChainClient,
    component::DeployedComponent,
    error::{Phase, ProvisionError},
    events::{ExtractError, unique_event_address},
    session::Session,
};

/// Default factory method creating a pair.
pub const CREATE_PAIR_METHOD: &str = "createPair";
/// Default event announcing a new pair.
pub const PAIR_CREATED_EVENT: &str = "PairCreated";
/// Default address field of the pair-creation event.
pub const PAIR_ADDRESS_FIELD: &str = "pair";

/// How the factory creates pairs and announces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairCreation {
    pub method: String,
    pub event: String,
    pub field: String,
}

impl Default for PairCreation {
    fn default() -> Self {
        Self {
            method: CREATE_PAIR_METHOD.to_string(),
            event: PAIR_CREATED_EVENT.to_string(),
            field: PAIR_ADDRESS_FIELD.to_string(),
        }
    }
}

/// Creates pairs and resolves their addresses from the receipt's events.
pub struct PairResolver<'s, 'a, C> {
    session: &'s Session<'a, C>,
    creation: &'s PairCreation,
}

impl<'s, 'a, C: ChainClient> PairResolver<'s, 'a, C> {
    pub fn new(session: &'s Session<'a, C>, creation: &'s PairCreation) -> Self {
        Self { session, creation }
    }

    /// Create the pair of `token_a` and `token_b` and return its address.
    ///
    /// Tokens are passed to the factory in the given order. The returned
    /// address comes from a confirmed receipt and needs no further wait.
    pub async fn create_pair(
        &self,
        factory: &DeployedComponent,
        token_a: &DeployedComponent,
        token_b: &DeployedComponent,
    ) -> Result<Address, ProvisionError> {
        let failure = |cause| ProvisionError::PairCreationFailure {
            factory: factory.name().to_string(),
            cause,
        };

        let pending = self
            .session
            .call(
                factory,
                &self.creation.method,
                &[AbiValue::from(token_a), AbiValue::from(token_b)],
            )
            .await
            .map_err(failure)?;
        let tx_hash = pending.tx_hash();

        tracing::debug!(
            factory = %factory.address(),
            token_a = %token_a.address(),
            token_b = %token_b.address(),
            tx_hash = %tx_hash,
            "Pair creation submitted"
        );

        let receipt = pending
            .confirm()
            .await
            .map_err(|e| e.into_provision(Phase::PairCreation, failure))?;

        if !receipt.succeeded() {
            return Err(failure(anyhow::anyhow!(
                "{} reverted in transaction {}",
                self.creation.method,
                tx_hash
            )));
        }

        let events = receipt.events(factory.abi());
        let pair = unique_event_address(&events, &self.creation.event, &self.creation.field)
            .map_err(|e| match e {
                ExtractError::NotFound => ProvisionError::EventNotFound {
                    event: self.creation.event.clone(),
                    field: self.creation.field.clone(),
                    tx_hash,
                },
                ExtractError::Ambiguous(count) => ProvisionError::AmbiguousEvent {
                    event: self.creation.event.clone(),
                    count,
                    tx_hash,
                },
            })?;

        tracing::info!(pair = %pair, tx_hash = %tx_hash, "Pair created");

        Ok(pair)
    }
}

//! Spending approvals for deployed tokens.

use alloy_core::primitives::U256;

use crate::{
    abi::AbiValue,
    client::ChainClient,
    component::DeployedComponent,
    error::{Phase, ProvisionError},
    session::Session,
};

/// ERC-20 method setting an allowance.
pub const APPROVE_METHOD: &str = "approve";

/// Grants spenders an allowance over the acting identity's token balance.
pub struct Authorizer<'s, 'a, C> {
    session: &'s Session<'a, C>,
}

impl<'s, 'a, C: ChainClient> Authorizer<'s, 'a, C> {
    pub fn new(session: &'s Session<'a, C>) -> Self {
        Self { session }
    }

    /// Set the allowance of `spender` on `token` to `amount` and wait for confirmation.
    ///
    /// The allowance is replaced, not added to. An `amount` of zero revokes it.
    pub async fn authorize(
        &self,
        token: &DeployedComponent,
        spender: &DeployedComponent,
        amount: U256,
    ) -> Result<(), ProvisionError> {
        let failure = |cause| ProvisionError::AuthorizationFailure {
            token: token.name().to_string(),
            spender: spender.address(),
            cause,
        };

        let pending = self
            .session
            .call(token, APPROVE_METHOD, &[AbiValue::from(spender), AbiValue::from(amount)])
            .await
            .map_err(failure)?;
        let tx_hash = pending.tx_hash();

        let receipt = pending
            .confirm()
            .await
            .map_err(|e| e.into_provision(Phase::Authorization, failure))?;

        if !receipt.succeeded() {
            return Err(failure(anyhow::anyhow!(
                "{} reverted in transaction {}",
                APPROVE_METHOD,
                tx_hash
            )));
        }

        tracing::info!(
            token = token.name(),
            spender = spender.name(),
            amount = %amount,
            tx_hash = %tx_hash,
            "Allowance set"
        );

        Ok(())
    }
}

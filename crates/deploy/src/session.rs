//! Transaction submission on behalf of the acting identity.

use anyhow::{Context, Result};

use crate::{
    abi::AbiValue,
    client::{ChainClient, ConfirmationPolicy, PendingTx},
    component::{ContractSpec, DeployedComponent},
    identity::Identity,
};

/// A chain client bound to the acting identity and a confirmation policy.
#[derive(Debug)]
pub struct Session<'a, C> {
    client: &'a C,
    identity: Identity,
    policy: ConfirmationPolicy,
}

impl<'a, C: ChainClient> Session<'a, C> {
    pub fn new(client: &'a C, identity: Identity, policy: ConfirmationPolicy) -> Self {
        Self {
            client,
            identity,
            policy,
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn policy(&self) -> ConfirmationPolicy {
        self.policy
    }

    /// Submit the creation transaction of `spec`.
    pub async fn deploy(&self, spec: &ContractSpec, args: &[AbiValue]) -> Result<PendingTx<'a, C>> {
        let tx = spec.deploy_request(self.identity, args)?;
        let tx_hash = self
            .client
            .send_transaction(tx)
            .await
            .with_context(|| format!("Failed to submit deployment of {}", spec.name()))?;
        Ok(PendingTx::new(self.client, tx_hash, self.policy))
    }

    /// Submit a call to `method` on an already-deployed component.
    pub async fn call(
        &self,
        component: &DeployedComponent,
        method: &str,
        args: &[AbiValue],
    ) -> Result<PendingTx<'a, C>> {
        let tx = component.call_request(self.identity, method, args)?;
        let tx_hash = self
            .client
            .send_transaction(tx)
            .await
            .with_context(|| format!("Failed to submit {}.{}", component.name(), method))?;
        Ok(PendingTx::new(self.client, tx_hash, self.policy))
    }
}

//! Component deployment with confirmation.

use crate::{
    abi::AbiValue,
    client::ChainClient,
    component::{ContractSpec, DeployedComponent},
    error::{Phase, ProvisionError},
    session::Session,
};

/// Deploys contracts one at a time, each confirmed before it is returned.
///
/// Addresses passed as constructor arguments should come from
/// [`DeployedComponent`]s returned here, so a dependent deployment only ever
/// references mined contracts.
pub struct Provisioner<'s, 'a, C> {
    session: &'s Session<'a, C>,
}

impl<'s, 'a, C: ChainClient> Provisioner<'s, 'a, C> {
    pub fn new(session: &'s Session<'a, C>) -> Self {
        Self { session }
    }

    /// Deploy `spec` as the component `name` and wait for its confirmation.
    pub async fn deploy(
        &self,
        name: &str,
        spec: &ContractSpec,
        args: &[AbiValue],
    ) -> Result<DeployedComponent, ProvisionError> {
        let failure = |cause| ProvisionError::DeploymentFailure {
            component: name.to_string(),
            cause,
        };

        tracing::debug!(component = name, contract = spec.name(), args = args.len(), "Deploying component");

        let pending = self.session.deploy(spec, args).await.map_err(failure)?;
        let tx_hash = pending.tx_hash();
        let receipt = pending
            .confirm()
            .await
            .map_err(|e| e.into_provision(Phase::Provisioning, failure))?;

        if !receipt.succeeded() {
            return Err(failure(anyhow::anyhow!(
                "constructor reverted in transaction {}",
                tx_hash
            )));
        }

        let address = receipt.contract_address.ok_or_else(|| {
            failure(anyhow::anyhow!(
                "receipt of transaction {} carries no contract address",
                tx_hash
            ))
        })?;

        tracing::info!(component = name, address = %address, tx_hash = %tx_hash, "Component deployed");

        Ok(DeployedComponent::new(name, address, spec.abi().clone()))
    }
}

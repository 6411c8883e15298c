//! Run configuration and the ordered deployment of the exchange components.

use std::{path::PathBuf, time::Duration};

use alloy_core::primitives::{Address, U256};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    abi::AbiValue,
    artifacts::ContractSource,
    authorize::Authorizer,
    client::{ChainClient, ConfirmationPolicy, DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_POLL_INTERVAL},
    component::{ContractSpec, DeployedComponent},
    error::ProvisionError,
    identity::{Identity, IdentitySelector, resolve_identity},
    pair::{PairCreation, PairResolver},
    provisioner::Provisioner,
    session::Session,
    units::{DEFAULT_DECIMALS, parse_units},
};

/// The default name for the dexup configuration file.
pub const DEXUP_CONFIG_FILENAME: &str = "Dexup.toml";

/// Default JSON-RPC endpoint (a local Hardhat or Anvil node).
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Default directory holding compiled contract artifacts.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Default allowance granted to the router on each token.
pub const DEFAULT_APPROVAL_AMOUNT: &str = "10000";

/// Constructor parameters of a token component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub initial_supply: u64,
}

impl TokenConfig {
    fn constructor_args(&self) -> Vec<AbiValue> {
        vec![
            self.name.clone().into(),
            self.symbol.clone().into(),
            U256::from(self.initial_supply).into(),
        ]
    }
}

/// Artifact names of the deployed contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractNames {
    pub token: String,
    pub weth: String,
    pub factory: String,
    pub router: String,
}

impl Default for ContractNames {
    fn default() -> Self {
        Self {
            token: "ERC20Token".to_string(),
            weth: "WETH".to_string(),
            factory: "DEXFactory".to_string(),
            router: "DEXRouter".to_string(),
        }
    }
}

/// Allowance granted to the router on each token, as a decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
    pub amount: String,
    pub decimals: u8,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            amount: DEFAULT_APPROVAL_AMOUNT.to_string(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

/// Configuration of a provisioning run.
///
/// Serializable to/from TOML; every field has a default matching a local
/// development node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// JSON-RPC endpoint of the node holding the signing keys.
    pub rpc_url: String,
    /// Directory holding the compiled contract artifacts.
    pub artifacts_dir: PathBuf,
    /// Which of the node's accounts acts for the run.
    pub identity: IdentitySelector,
    /// Maximum time to wait for each transaction to be mined.
    pub confirmation_timeout_secs: u64,
    /// Interval between receipt polls.
    pub poll_interval_ms: u64,
    pub token_a: TokenConfig,
    pub token_b: TokenConfig,
    pub contracts: ContractNames,
    pub pair: PairCreation,
    pub approval: ApprovalConfig,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            identity: IdentitySelector::default(),
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT.as_secs(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            token_a: TokenConfig {
                name: "TokenA".to_string(),
                symbol: "ATKN".to_string(),
                initial_supply: 1_000_000,
            },
            token_b: TokenConfig {
                name: "TokenB".to_string(),
                symbol: "BTKN".to_string(),
                initial_supply: 1_000_000,
            },
            contracts: ContractNames::default(),
            pair: PairCreation::default(),
            approval: ApprovalConfig::default(),
        }
    }
}

impl DeployConfig {
    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize deploy config to TOML")
    }

    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            timeout: Duration::from_secs(self.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct DeploymentResult {
    pub identity: Identity,
    pub token_a: DeployedComponent,
    pub token_b: DeployedComponent,
    pub weth: DeployedComponent,
    pub factory: DeployedComponent,
    pub router: DeployedComponent,
    /// Address of the pair created through the factory.
    pub pair: Address,
}

impl DeploymentResult {
    /// Component names and addresses, in deployment order, ending with the pair.
    pub fn addresses(&self) -> Vec<(String, Address)> {
        let mut addresses: Vec<_> = [
            &self.token_a,
            &self.token_b,
            &self.weth,
            &self.factory,
            &self.router,
        ]
        .into_iter()
        .map(|component| (component.name().to_string(), component.address()))
        .collect();
        addresses.push(("DEXPair".to_string(), self.pair));
        addresses
    }
}

/// Orchestrates the full run: identity, deployments, pair creation, approvals.
#[derive(Debug, Clone)]
pub struct Deployer {
    config: DeployConfig,
    approval_amount: U256,
}

/// The contract specs a run deploys, loaded before anything is submitted.
struct Specs {
    token: ContractSpec,
    weth: ContractSpec,
    factory: ContractSpec,
    router: ContractSpec,
}

impl Deployer {
    /// Validate `config` and build a deployer from it.
    pub fn new(config: DeployConfig) -> Result<Self> {
        let approval_amount = parse_units(&config.approval.amount, config.approval.decimals)
            .context("Invalid approval amount")?;
        if config.confirmation_timeout_secs == 0 {
            anyhow::bail!("Confirmation timeout must be at least one second");
        }
        if config.poll_interval_ms == 0 {
            anyhow::bail!("Receipt poll interval must be at least one millisecond");
        }
        Ok(Self {
            config,
            approval_amount,
        })
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// The allowance, in the token's smallest unit, granted on each token.
    pub fn approval_amount(&self) -> U256 {
        self.approval_amount
    }

    fn load_specs<S: ContractSource>(&self, contracts: &S) -> Result<Specs, ProvisionError> {
        let load = |name: &str| {
            contracts
                .get_factory(name)
                .map_err(|cause| ProvisionError::DeploymentFailure {
                    component: name.to_string(),
                    cause,
                })
        };
        let names = &self.config.contracts;
        Ok(Specs {
            token: load(&names.token)?,
            weth: load(&names.weth)?,
            factory: load(&names.factory)?,
            router: load(&names.router)?,
        })
    }

    /// Run the provisioning sequence.
    ///
    /// Each transaction is confirmed before the next one is submitted. The
    /// first failure aborts the run; components deployed before it stay on-chain.
    pub async fn deploy<C, S>(&self, client: &C, contracts: &S) -> Result<DeploymentResult, ProvisionError>
    where
        C: ChainClient,
        S: ContractSource,
    {
        tracing::info!("Starting deployment process...");

        let specs = self.load_specs(contracts)?;

        let identity = resolve_identity(client, self.config.identity).await?;
        tracing::info!(identity = %identity, "Deploying contracts with identity");

        let session = Session::new(client, identity, self.config.confirmation_policy());
        let provisioner = Provisioner::new(&session);

        let token_a = provisioner
            .deploy(&self.config.token_a.name, &specs.token, &self.config.token_a.constructor_args())
            .await?;
        let token_b = provisioner
            .deploy(&self.config.token_b.name, &specs.token, &self.config.token_b.constructor_args())
            .await?;
        let weth = provisioner.deploy(specs.weth.name(), &specs.weth, &[]).await?;
        let factory = provisioner.deploy(specs.factory.name(), &specs.factory, &[]).await?;
        let router = provisioner
            .deploy(
                specs.router.name(),
                &specs.router,
                &[AbiValue::from(&factory), AbiValue::from(&weth)],
            )
            .await?;

        tracing::info!("Creating pair...");
        let pair = PairResolver::new(&session, &self.config.pair)
            .create_pair(&factory, &token_a, &token_b)
            .await?;

        tracing::info!(amount = %self.approval_amount, spender = %router.address(), "Approving router...");
        let authorizer = Authorizer::new(&session);
        authorizer.authorize(&token_a, &router, self.approval_amount).await?;
        authorizer.authorize(&token_b, &router, self.approval_amount).await?;

        tracing::info!("Deployment complete");

        Ok(DeploymentResult {
            identity,
            token_a,
            token_b,
            weth,
            factory,
            router,
            pair,
        })
    }
}

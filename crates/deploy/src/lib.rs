//! dexup-deploy - Provisioning library for a minimal decentralized exchange.
//!
//! Deploys two ERC-20 tokens, a wrapped-native token, a pair factory and a
//! router to an EVM node, creates the token pair through the factory, and
//! approves the router to spend both tokens on behalf of the acting identity.
//!
//! Every transaction is confirmed before anything that depends on it is
//! submitted. The first failure aborts the run with a [`ProvisionError`]
//! naming the phase it happened in.

pub mod abi;
pub mod artifacts;
pub mod authorize;
pub mod client;
pub mod component;
pub mod deployer;
pub mod error;
pub mod events;
pub mod identity;
pub mod pair;
pub mod provisioner;
pub mod rpc;
pub mod session;
pub mod units;

#[cfg(test)]
mod testing;

pub use abi::{Abi, AbiValue, ContractAbi};
pub use artifacts::{ArtifactStore, ContractSource};
pub use authorize::Authorizer;
pub use client::{ChainClient, ConfirmationPolicy, PendingTx, TransactionReceipt, TransactionRequest};
pub use component::{ContractSpec, DeployedComponent};
pub use deployer::{
    ApprovalConfig, ContractNames, DEXUP_CONFIG_FILENAME, DeployConfig, Deployer,
    DeploymentResult, TokenConfig,
};
pub use error::{Phase, ProvisionError};
pub use events::{Event, Log};
pub use identity::{Identity, IdentitySelector, resolve_identity};
pub use pair::{PairCreation, PairResolver};
pub use provisioner::Provisioner;
pub use rpc::RpcClient;
pub use session::Session;
pub use units::parse_units;

//! Deployable contract descriptors and deployed components.

use alloy_core::primitives::{Address, Bytes};
use anyhow::Result;

use crate::{
    abi::{Abi, AbiValue, ContractAbi},
    client::TransactionRequest,
    identity::Identity,
};

/// A deployable contract: name, ABI and creation bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSpec {
    name: String,
    abi: Abi,
    bytecode: Bytes,
}

impl ContractSpec {
    pub fn new(name: impl Into<String>, abi: Abi, bytecode: Bytes) -> Self {
        Self {
            name: name.into(),
            abi,
            bytecode,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    pub fn bytecode(&self) -> &Bytes {
        &self.bytecode
    }

    /// Build the creation transaction: bytecode followed by encoded constructor arguments.
    pub fn deploy_request(&self, from: Identity, args: &[AbiValue]) -> Result<TransactionRequest> {
        let mut data = self.bytecode.to_vec();
        data.extend(self.abi.encode_constructor(args)?);
        Ok(TransactionRequest {
            from: from.address(),
            to: None,
            data: data.into(),
        })
    }
}

/// A contract whose deployment has been confirmed on-chain.
///
/// Only the provisioner creates these, so holding one means its address is
/// backed by a mined deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedComponent {
    name: String,
    address: Address,
    abi: Abi,
}

impl DeployedComponent {
    pub(crate) fn new(name: impl Into<String>, address: Address, abi: Abi) -> Self {
        Self {
            name: name.into(),
            address,
            abi,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    /// Build a call transaction to `method` on this component.
    pub fn call_request(
        &self,
        from: Identity,
        method: &str,
        args: &[AbiValue],
    ) -> Result<TransactionRequest> {
        Ok(TransactionRequest {
            from: from.address(),
            to: Some(self.address),
            data: self.abi.encode_call(method, args)?,
        })
    }
}

impl From<&DeployedComponent> for AbiValue {
    fn from(component: &DeployedComponent) -> Self {
        AbiValue::Address(component.address)
    }
}

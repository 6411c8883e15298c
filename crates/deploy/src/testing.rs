//! In-memory chain used by unit tests.
//!
//! Mines every transaction instantly, hands out deterministic contract
//! addresses and understands just enough of the fixture contracts to track
//! allowances and announce created pairs.

use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    sync::Mutex,
};

use alloy_core::primitives::{Address, B256, Bytes, TxHash, U256, keccak256};
use anyhow::{Context, Result};
use serde_json::json;

use crate::{
    abi::{Abi, AbiValue},
    client::{ChainClient, TransactionReceipt, TransactionRequest},
    component::ContractSpec,
    events::Log,
};

/// Address whose last byte is `n`.
pub(crate) fn address(n: u8) -> Address {
    Address::with_last_byte(n)
}

fn erc20_abi() -> Abi {
    serde_json::from_value(json!([
        {
            "type": "constructor",
            "inputs": [
                { "name": "name", "type": "string" },
                { "name": "symbol", "type": "string" },
                { "name": "initialSupply", "type": "uint256" }
            ]
        },
        {
            "type": "function",
            "name": "approve",
            "inputs": [
                { "name": "spender", "type": "address" },
                { "name": "amount", "type": "uint256" }
            ],
            "outputs": [{ "name": "", "type": "bool" }],
            "stateMutability": "nonpayable"
        },
        {
            "type": "event",
            "name": "Transfer",
            "anonymous": false,
            "inputs": [
                { "name": "from", "type": "address", "indexed": true },
                { "name": "to", "type": "address", "indexed": true },
                { "name": "value", "type": "uint256", "indexed": false }
            ]
        },
        {
            "type": "event",
            "name": "Approval",
            "anonymous": false,
            "inputs": [
                { "name": "owner", "type": "address", "indexed": true },
                { "name": "spender", "type": "address", "indexed": true },
                { "name": "value", "type": "uint256", "indexed": false }
            ]
        }
    ]))
    .unwrap()
}

fn weth_abi() -> Abi {
    serde_json::from_value(json!([
        { "type": "function", "name": "deposit", "inputs": [], "outputs": [], "stateMutability": "payable" },
        { "type": "receive", "stateMutability": "payable" }
    ]))
    .unwrap()
}

fn factory_abi() -> Abi {
    serde_json::from_value(json!([
        {
            "type": "function",
            "name": "createPair",
            "inputs": [
                { "name": "tokenA", "type": "address" },
                { "name": "tokenB", "type": "address" }
            ],
            "outputs": [{ "name": "pair", "type": "address" }],
            "stateMutability": "nonpayable"
        },
        {
            "type": "event",
            "name": "PairCreated",
            "anonymous": false,
            "inputs": [
                { "name": "token0", "type": "address", "indexed": true },
                { "name": "token1", "type": "address", "indexed": true },
                { "name": "pair", "type": "address", "indexed": false },
                { "name": "", "type": "uint256", "indexed": false }
            ]
        },
        {
            "type": "event",
            "name": "Transfer",
            "anonymous": false,
            "inputs": [
                { "name": "from", "type": "address", "indexed": true },
                { "name": "to", "type": "address", "indexed": true },
                { "name": "value", "type": "uint256", "indexed": false }
            ]
        }
    ]))
    .unwrap()
}

fn router_abi() -> Abi {
    serde_json::from_value(json!([
        {
            "type": "constructor",
            "inputs": [
                { "name": "_factory", "type": "address" },
                { "name": "_WETH", "type": "address" }
            ]
        },
        {
            "type": "function",
            "name": "factory",
            "inputs": [],
            "outputs": [{ "name": "", "type": "address" }],
            "stateMutability": "view"
        }
    ]))
    .unwrap()
}

/// Constructor arguments of the fixture ERC-20 token.
pub(crate) fn token_args(name: &str, symbol: &str, supply: U256) -> Vec<AbiValue> {
    vec![name.to_string().into(), symbol.to_string().into(), supply.into()]
}

/// Build the log `emitter` would produce for the event `name` of `abi`.
///
/// Indexed dynamic values are stored as the hash of their packed encoding.
pub(crate) fn encode_event(abi: &Abi, name: &str, emitter: Address, values: &[AbiValue]) -> Log {
    let event = &abi.event(name).unwrap()[0];
    assert_eq!(event.inputs.len(), values.len(), "value count of `{}`", name);

    let mut topics = vec![event.selector()];
    let mut body = Vec::new();
    for (param, value) in event.inputs.iter().zip(values) {
        if param.indexed {
            topics.push(
                value
                    .as_word()
                    .unwrap_or_else(|| keccak256(value.abi_encode_packed())),
            );
        } else {
            body.push(value.clone());
        }
    }

    Log {
        address: emitter,
        topics,
        data: AbiValue::Tuple(body).abi_encode_params().into(),
    }
}

/// The four contracts of a run, keyed by artifact name, with distinct bytecode.
pub(crate) fn fixture_contracts() -> BTreeMap<String, ContractSpec> {
    [
        ("ERC20Token", erc20_abi(), vec![0x60, 0x80, 0x01]),
        ("WETH", weth_abi(), vec![0x60, 0x80, 0x02]),
        ("DEXFactory", factory_abi(), vec![0x60, 0x80, 0x03]),
        ("DEXRouter", router_abi(), vec![0x60, 0x80, 0x04]),
    ]
    .into_iter()
    .map(|(name, abi, bytecode)| {
        (
            name.to_string(),
            ContractSpec::new(name, abi, Bytes::from(bytecode)),
        )
    })
    .collect()
}

/// A transaction as the mock received it.
#[derive(Debug, Clone)]
pub(crate) struct RecordedTx {
    pub from: Address,
    pub to: Option<Address>,
    pub data: Bytes,
    pub tx_hash: TxHash,
    /// Deployed addresses whose receipts had been fetched when this was submitted.
    pub confirmed_before: Vec<Address>,
}

#[derive(Default)]
struct MockState {
    deploy_addresses: VecDeque<Address>,
    deployments: usize,
    revert_deployment: Option<usize>,
    fail_submissions: bool,
    withhold_receipts: bool,
    pair_address: Option<Address>,
    pair_logs: Option<Vec<Log>>,
    reverted_targets: HashSet<Address>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    confirmed: Vec<Address>,
    allowances: HashMap<(Address, Address, Address), U256>,
    sent: Vec<RecordedTx>,
}

/// A [`ChainClient`] that mines every transaction on submission.
pub(crate) struct MockChain {
    accounts: Vec<Address>,
    token_abi: Abi,
    factory_abi: Abi,
    state: Mutex<MockState>,
}

impl MockChain {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            token_abi: erc20_abi(),
            factory_abi: factory_abi(),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Hand out these addresses to deployments, in order, before falling back to generated ones.
    pub fn with_deploy_addresses(self, addresses: Vec<Address>) -> Self {
        self.state.lock().unwrap().deploy_addresses = addresses.into();
        self
    }

    /// Address announced by `createPair` when no logs are overridden.
    pub fn with_pair_address(self, pair: Address) -> Self {
        self.state.lock().unwrap().pair_address = Some(pair);
        self
    }

    /// Revert the deployment with this zero-based index.
    pub fn revert_deployment(self, index: usize) -> Self {
        self.state.lock().unwrap().revert_deployment = Some(index);
        self
    }

    /// Reject every submission as the node would for an unfunded account.
    pub fn fail_submissions(self) -> Self {
        self.state.lock().unwrap().fail_submissions = true;
        self
    }

    /// Never return receipts.
    pub fn withhold_receipts(self) -> Self {
        self.set_withhold_receipts(true);
        self
    }

    pub fn set_withhold_receipts(&self, withhold: bool) {
        self.state.lock().unwrap().withhold_receipts = withhold;
    }

    /// Logs emitted by subsequent `createPair` calls.
    pub fn set_pair_logs(&self, logs: Vec<Log>) {
        self.state.lock().unwrap().pair_logs = Some(logs);
    }

    /// Revert every subsequent call to `target`.
    pub fn revert_calls_to(&self, target: Address) {
        self.state.lock().unwrap().reverted_targets.insert(target);
    }

    pub fn sent(&self) -> Vec<RecordedTx> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Whether a deployment at `address` has had its receipt fetched.
    pub fn is_confirmed(&self, address: Address) -> bool {
        self.state.lock().unwrap().confirmed.contains(&address)
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Apply a call to `to` and return the logs it emits.
    fn execute_call(
        &self,
        state: &mut MockState,
        from: Address,
        to: Address,
        data: &[u8],
    ) -> Result<Vec<Log>> {
        let approve = self
            .token_abi
            .function("approve")
            .and_then(|overloads| overloads.first())
            .context("Token ABI has no approve")?
            .selector();
        let create_pair = self
            .factory_abi
            .function("createPair")
            .and_then(|overloads| overloads.first())
            .context("Factory ABI has no createPair")?
            .selector();
        if data.len() < 68 {
            return Ok(vec![]);
        }
        let (selector, args) = data.split_at(4);
        let first = Address::from_slice(&args[12..32]);

        if selector == approve.as_slice() {
            let amount = U256::from_be_slice(&args[32..64]);
            state.allowances.insert((to, from, first), amount);
            Ok(vec![])
        } else if selector == create_pair.as_slice() {
            if let Some(logs) = &state.pair_logs {
                return Ok(logs.clone());
            }
            let second = Address::from_slice(&args[44..64]);
            let pair = state.pair_address.unwrap_or(address(0x50));
            let log = encode_event(
                &self.factory_abi,
                "PairCreated",
                to,
                &[first.into(), second.into(), pair.into(), U256::from(1).into()],
            );
            Ok(vec![log])
        } else {
            Ok(vec![])
        }
    }
}

impl ChainClient for MockChain {
    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.accounts.clone())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let mut state = self.state.lock().unwrap();
        if state.fail_submissions {
            anyhow::bail!("insufficient funds for gas * price + value");
        }

        let nonce = state.sent.len() as u64;
        let tx_hash = keccak256(nonce.to_be_bytes());
        let block_number = Some(nonce + 1);

        let receipt = match tx.to {
            None => {
                let index = state.deployments;
                state.deployments += 1;
                let reverted = state.revert_deployment == Some(index);
                let contract_address = state.deploy_addresses.pop_front().unwrap_or_else(|| {
                    Address::from_word(B256::from(U256::from(0x1000 + index)))
                });
                TransactionReceipt {
                    transaction_hash: tx_hash,
                    block_number,
                    status: Some(u64::from(!reverted)),
                    contract_address: (!reverted).then_some(contract_address),
                    logs: vec![],
                }
            }
            Some(to) if state.reverted_targets.contains(&to) => TransactionReceipt {
                transaction_hash: tx_hash,
                block_number,
                status: Some(0),
                contract_address: None,
                logs: vec![],
            },
            Some(to) => {
                let logs = self.execute_call(&mut state, tx.from, to, &tx.data)?;
                TransactionReceipt {
                    transaction_hash: tx_hash,
                    block_number,
                    status: Some(1),
                    contract_address: None,
                    logs,
                }
            }
        };

        let confirmed_before = state.confirmed.clone();
        state.receipts.insert(tx_hash, receipt);
        state.sent.push(RecordedTx {
            from: tx.from,
            to: tx.to,
            data: tx.data,
            tx_hash,
            confirmed_before,
        });
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TransactionReceipt>> {
        let mut state = self.state.lock().unwrap();
        if state.withhold_receipts {
            return Ok(None);
        }
        let Some(receipt) = state.receipts.get(&tx_hash).cloned() else {
            return Ok(None);
        };
        if let Some(deployed) = receipt.contract_address {
            if !state.confirmed.contains(&deployed) {
                state.confirmed.push(deployed);
            }
        }
        Ok(Some(receipt))
    }
}

//! Receipt logs, decoded events, and extraction of a single matching record.

use std::collections::BTreeMap;

use alloy_core::primitives::{Address, B256, Bytes};
use serde::{Deserialize, Serialize};

use crate::abi::AbiValue;

/// A raw log entry as found in a transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// A log decoded against a contract ABI.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    /// The contract that emitted the log.
    pub emitter: Address,
    pub args: BTreeMap<String, AbiValue>,
}

impl Event {
    /// Name given to logs the decoding ABI does not describe.
    pub const UNKNOWN: &'static str = "<unknown>";

    pub fn unknown(emitter: Address) -> Self {
        Self {
            name: Self::UNKNOWN.to_string(),
            emitter,
            args: BTreeMap::new(),
        }
    }

    /// The address-typed argument `field`, if present.
    pub fn address_arg(&self, field: &str) -> Option<Address> {
        self.args.get(field).and_then(AbiValue::as_address)
    }
}

/// Why [`extract_unique`] did not produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    NotFound,
    /// More than one record matched; carries the match count.
    Ambiguous(usize),
}

/// Extract the single value `select` produces over an ordered sequence.
///
/// Fails on zero matches and on more than one match.
pub fn extract_unique<'a, T, M, F>(
    items: impl IntoIterator<Item = &'a T>,
    select: F,
) -> Result<M, ExtractError>
where
    T: 'a,
    F: FnMut(&'a T) -> Option<M>,
{
    let mut matches = items.into_iter().filter_map(select);
    let first = matches.next().ok_or(ExtractError::NotFound)?;
    match matches.count() {
        0 => Ok(first),
        extra => Err(ExtractError::Ambiguous(extra + 1)),
    }
}

/// Address carried in `field` by the single event named `event`.
pub fn unique_event_address(
    events: &[Event],
    event: &str,
    field: &str,
) -> Result<Address, ExtractError> {
    extract_unique(events, |candidate| {
        if candidate.name == event {
            candidate.address_arg(field)
        } else {
            None
        }
    })
}

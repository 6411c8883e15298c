//! Contract ABI handling on top of `alloy-core`'s JSON ABI and dynamic codec.
//!
//! [`ContractAbi`] adds what deploying and wiring contracts needs to a
//! [`JsonAbi`]: constructor and call encoding by method name, and decoding
//! receipt logs into named [`Event`]s.

use std::collections::BTreeMap;

use alloy_core::{
    dyn_abi::{DynSolValue, EventExt, JsonAbiExt},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use anyhow::{Context, Result};

use crate::events::{Event, Log};

/// A parsed contract ABI.
pub type Abi = JsonAbi;

/// A value passed to or decoded from a contract.
pub type AbiValue = DynSolValue;

/// Encoding and decoding operations of a contract ABI.
pub trait ContractAbi {
    /// Encode constructor arguments (without the creation bytecode).
    fn encode_constructor(&self, args: &[AbiValue]) -> Result<Vec<u8>>;

    /// Encode calldata for a function call: selector followed by arguments.
    ///
    /// Overloads are resolved by arity, then by the first one the arguments type-check against.
    fn encode_call(&self, name: &str, args: &[AbiValue]) -> Result<Bytes>;

    /// Decode a log against the events of this ABI.
    ///
    /// Returns `Ok(None)` when no non-anonymous event matches the log's first topic.
    fn decode_log(&self, log: &Log) -> Result<Option<Event>>;
}

impl ContractAbi for JsonAbi {
    fn encode_constructor(&self, args: &[AbiValue]) -> Result<Vec<u8>> {
        match &self.constructor {
            Some(constructor) => constructor
                .abi_encode_input(args)
                .context("Failed to encode constructor arguments"),
            None if args.is_empty() => Ok(Vec::new()),
            None => anyhow::bail!(
                "ABI has no constructor but {} arguments were given",
                args.len()
            ),
        }
    }

    fn encode_call(&self, name: &str, args: &[AbiValue]) -> Result<Bytes> {
        let overloads = self
            .function(name)
            .with_context(|| format!("ABI has no function `{}`", name))?;

        let mut last_error = None;
        for function in overloads.iter().filter(|f| f.inputs.len() == args.len()) {
            match function.abi_encode_input(args) {
                Ok(calldata) => return Ok(calldata.into()),
                Err(e) => {
                    last_error = Some(anyhow::Error::new(e).context(format!(
                        "Failed to encode arguments for `{}`",
                        function.signature()
                    )))
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("ABI has no function `{}` taking {} arguments", name, args.len())
        }))
    }

    fn decode_log(&self, log: &Log) -> Result<Option<Event>> {
        let Some(topic0) = log.topics.first() else {
            return Ok(None);
        };
        let Some(event) = self
            .events()
            .find(|event| !event.anonymous && event.selector() == *topic0)
        else {
            return Ok(None);
        };

        let decoded = event
            .decode_log_parts(log.topics.iter().copied(), &log.data, true)
            .with_context(|| format!("Failed to decode `{}` log", event.name))?;

        // Indexed dynamic values come back as their topic hash.
        let mut indexed = decoded.indexed.into_iter();
        let mut body = decoded.body.into_iter();
        let mut args = BTreeMap::new();
        for (position, param) in event.inputs.iter().enumerate() {
            let value = if param.indexed {
                indexed.next()
            } else {
                body.next()
            };
            let value = value.with_context(|| {
                format!("Log of `{}` is missing a value for `{}`", event.name, param.name)
            })?;
            let key = if param.name.is_empty() {
                position.to_string()
            } else {
                param.name.clone()
            };
            args.insert(key, value);
        }

        Ok(Some(Event {
            name: event.name.clone(),
            emitter: log.address,
            args,
        }))
    }
}

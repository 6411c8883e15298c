//! Decimal token amounts.

use alloy_core::primitives::{
    U256,
    utils::{ParseUnits, Unit},
};
use anyhow::{Context, Result};

/// Decimals of a standard ERC-20 token.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Convert a human-readable decimal amount into the token's smallest unit.
///
/// `parse_units("1.5", 18)` is `1_500_000_000_000_000_000`. Fractional digits
/// beyond `decimals` are rejected rather than rounded, and so are negative amounts.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    let unit = Unit::new(decimals)
        .with_context(|| format!("Unsupported number of decimals: {}", decimals))?;
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));

    if whole.is_empty() && fraction.is_empty() {
        anyhow::bail!("Invalid amount '{}': no digits", amount);
    }
    if fraction.len() > usize::from(decimals) {
        anyhow::bail!(
            "Invalid amount '{}': more than {} fractional digits",
            amount,
            decimals
        );
    }

    let value = match ParseUnits::parse_units(amount, unit)
        .map_err(|e| anyhow::anyhow!("Invalid amount '{}': {}", amount, e))?
    {
        ParseUnits::U256(value) => value,
        ParseUnits::I256(_) => {
            anyhow::bail!("Invalid amount '{}': expected a non-negative decimal number", amount)
        }
    };

    // Scaling by 10^decimals wraps instead of failing.
    let scale = U256::from(10u8).pow(U256::from(decimals));
    if !whole.is_empty() && value / scale != U256::from_str_radix(whole, 10)? {
        anyhow::bail!("Invalid amount '{}': does not fit in 256 bits", amount);
    }

    Ok(value)
}

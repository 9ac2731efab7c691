use crate::error::{CommonError, Result};
use anyhow::Context;
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Decimals of one ether expressed in wei.
pub const ETHER_DECIMALS: u32 = 18;

/// Converts a byte slice to a `0x`-prefixed hex string.
pub fn to_hex<T: AsRef<[u8]>>(data: T) -> String {
    format!("0x{}", hex::encode(data))
}

/// Converts a hex string (with or without `0x`) to a byte vector.
pub fn from_hex(data: &str) -> anyhow::Result<Vec<u8>> {
    let trimmed = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(trimmed).context("Failed to decode hex string")
}

/// Parses a decimal string such as `"10"`, `"0.1"` or `".1"` into base units.
///
/// Fails when the fractional part has more digits than `decimals`.
pub fn parse_units(value: &str, decimals: u32) -> Result<BigUint> {
    let value = value.trim();
    let invalid = || CommonError::InvalidAmount(value.to_string());

    let (whole, fraction) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if fraction.len() > decimals as usize {
        return Err(CommonError::InvalidAmount(format!(
            "{} has more than {} decimal places",
            value, decimals
        )));
    }

    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(whole);
    digits.push_str(fraction);
    for _ in fraction.len()..decimals as usize {
        digits.push('0');
    }
    if digits.is_empty() {
        return Ok(BigUint::zero());
    }
    BigUint::parse_bytes(digits.as_bytes(), 10).ok_or_else(invalid)
}

/// Parses an ether amount into wei.
pub fn parse_ether(value: &str) -> Result<BigUint> {
    parse_units(value, ETHER_DECIMALS)
}

/// Formats base units as a decimal string, trimming trailing fractional zeros.
pub fn format_units(value: &BigUint, decimals: u32) -> String {
    let unit = pow10(decimals);
    let whole = value / &unit;
    let rem = value % &unit;
    if rem.is_zero() {
        return whole.to_string();
    }
    let fraction = format!("{:0>width$}", rem.to_string(), width = decimals as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Formats wei as ether.
pub fn format_ether(value: &BigUint) -> String {
    format_units(value, ETHER_DECIMALS)
}

fn pow10(exp: u32) -> BigUint {
    let ten = BigUint::from(10u32);
    let mut acc = BigUint::one();
    for _ in 0..exp {
        acc *= &ten;
    }
    acc
}

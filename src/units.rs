//! Conversion from human-readable amounts to on-chain base units.
//!
//! Amounts are converted once, when a command's arguments are parsed;
//! everything downstream works in base units only.

use alloy_primitives::utils::{format_units, parse_units, ParseUnits};
use alloy_primitives::U256;

use crate::error::EncodingError;

/// Decimals of the native token.
pub const NATIVE_DECIMALS: u8 = 18;

/// Commission rates are given in percent with two decimals of precision.
pub const COMMISSION_DECIMALS: u8 = 2;

/// 100% expressed in basis points.
pub const MAX_COMMISSION_BPS: u64 = 10_000;

/// Parse a native-token amount such as `"1.5"` into base units.
pub fn parse_amount(value: &str) -> Result<U256, EncodingError> {
	parse_decimal(value, NATIVE_DECIMALS)
}

/// Parse a commission percentage such as `"5"` or `"12.5"` into basis points.
pub fn parse_commission_bps(value: &str) -> Result<u64, EncodingError> {
	let bps = parse_decimal(value, COMMISSION_DECIMALS)?;
	if bps > U256::from(MAX_COMMISSION_BPS) {
		return Err(invalid(value, "commission rate cannot exceed 100%"));
	}
	Ok(bps.to::<u64>())
}

/// Value attached to a payable call: the domain amount plus the protocol fee.
pub fn payable_value(amount: U256, fee: U256) -> Result<U256, EncodingError> {
	amount
		.checked_add(fee)
		.ok_or_else(|| invalid(&amount.to_string(), "amount plus fee overflows"))
}

/// Render base units as a native-token decimal string.
pub fn format_amount(value: U256) -> String {
	format_units(value, NATIVE_DECIMALS).unwrap_or_else(|_| value.to_string())
}

fn parse_decimal(value: &str, decimals: u8) -> Result<U256, EncodingError> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		return Err(invalid(value, "empty amount"));
	}
	if trimmed.starts_with('-') {
		return Err(invalid(value, "amount cannot be negative"));
	}

	let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
	let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
	if (whole.is_empty() && fraction.is_empty()) || !digits_only(whole) || !digits_only(fraction)
	{
		return Err(invalid(value, "not a decimal number"));
	}
	if fraction.len() > decimals as usize {
		return Err(invalid(
			value,
			&format!("at most {decimals} decimal places are allowed"),
		));
	}

	match parse_units(trimmed, decimals) {
		Ok(ParseUnits::U256(v)) => Ok(v),
		Ok(ParseUnits::I256(_)) => Err(invalid(value, "amount cannot be negative")),
		Err(e) => Err(invalid(value, &e.to_string())),
	}
}

fn invalid(value: &str, reason: &str) -> EncodingError {
	EncodingError::InvalidAmount {
		value: value.to_owned(),
		reason: reason.to_owned(),
	}
}

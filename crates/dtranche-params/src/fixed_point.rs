//! Scaled decimal conversion.
//!
//! Accepts plain decimal strings: optional `+`, digits, optional `.` and
//! fraction digits. Signs, exponents and non-finite spellings are rejected
//! here; the scaling itself is `alloy_primitives::utils::parse_units`, which
//! drops fraction digits beyond the scale (truncation toward zero).

use alloy_primitives::utils::{format_units, parse_units, ParseUnits};
use dtranche_types::{Amount, TOKEN_DECIMALS};

use crate::{ParamError, Result};

/// Convert a decimal string to a 10^18 fixed-point amount.
///
/// Lossy past 18 fraction digits.
///
/// # Errors
///
/// - [`ParamError::Negative`] for a leading `-`
/// - [`ParamError::NonFinite`] for `NaN` / `inf` spellings
/// - [`ParamError::Malformed`] for anything else that is not a decimal
/// - [`ParamError::Overflow`] if the scaled value exceeds `uint256`
pub fn to_fixed_point(input: &str) -> Result<Amount> {
    to_scaled(input, TOKEN_DECIMALS)
}

/// Render a 10^18 fixed-point amount as a decimal string.
pub fn from_fixed_point(value: Amount) -> String {
    from_scaled(value, TOKEN_DECIMALS)
}

/// Convert a decimal string to an integer scaled by `10^decimals`.
///
/// # Errors
///
/// See [`to_fixed_point`].
pub fn to_scaled(input: &str, decimals: u8) -> Result<Amount> {
    let trimmed = input.trim();
    let malformed = |reason: &'static str| ParamError::Malformed {
        input: input.to_string(),
        reason,
    };
    let overflow = || ParamError::Overflow {
        input: input.to_string(),
    };

    if trimmed.is_empty() {
        return Err(malformed("empty"));
    }
    if trimmed.starts_with('-') {
        return Err(ParamError::Negative {
            input: input.to_string(),
        });
    }
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if matches!(unsigned.to_ascii_lowercase().as_str(), "nan" | "inf" | "infinity") {
        return Err(ParamError::NonFinite {
            input: input.to_string(),
        });
    }

    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(malformed("no digits"));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("expected digits with at most one decimal point"));
    }
    if frac_part.len() > usize::from(decimals) {
        tracing::debug!(input, decimals, "decimal truncated to target scale");
    }

    // parse_units scales with wrapping multiplication, so bound the result
    // by the integer part scaled with checked arithmetic.
    let whole = if int_part.is_empty() { "0" } else { int_part };
    let whole = Amount::from_str_radix(whole, 10).map_err(|_| overflow())?;
    let floor = whole
        .checked_mul(Amount::from(10u64).pow(Amount::from(decimals)))
        .ok_or_else(overflow)?;

    let scaled = match parse_units(unsigned, decimals) {
        Ok(ParseUnits::U256(value)) => value,
        Ok(ParseUnits::I256(_)) => {
            return Err(ParamError::Negative {
                input: input.to_string(),
            })
        }
        Err(_) => return Err(overflow()),
    };
    if scaled < floor {
        return Err(overflow());
    }
    Ok(scaled)
}

/// Render an integer scaled by `10^decimals` as a minimal decimal string.
pub fn from_scaled(value: Amount, decimals: u8) -> String {
    let Ok(rendered) = format_units(value, decimals) else {
        return value.to_string();
    };
    if !rendered.contains('.') {
        return rendered;
    }
    rendered.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wad(tokens: u64) -> Amount {
        Amount::from(tokens) * Amount::from(1_000_000_000_000_000_000u64)
    }

    #[test]
    fn test_supply_rate() {
        assert_eq!(
            to_fixed_point("1.1").expect("convert"),
            Amount::from(1_100_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_whole_numbers() {
        assert_eq!(to_fixed_point("10").expect("convert"), wad(10));
        assert_eq!(to_fixed_point("1000000").expect("convert"), wad(1_000_000));
        assert_eq!(to_fixed_point("0").expect("convert"), Amount::ZERO);
    }

    #[test]
    fn test_leading_and_trailing_point() {
        assert_eq!(to_fixed_point(".5").expect("convert"), wad(1) / Amount::from(2));
        assert_eq!(to_fixed_point("5.").expect("convert"), wad(5));
        assert_eq!(
            to_fixed_point("+2.25").expect("convert"),
            wad(2) + wad(1) / Amount::from(4)
        );
    }

    #[test]
    fn test_truncates_excess_precision() {
        // 19 fraction digits: the last one is dropped.
        assert_eq!(
            to_fixed_point("0.0000000000000000019").expect("convert"),
            Amount::from(1)
        );
    }

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(to_fixed_point("-1"), Err(ParamError::Negative { .. })));
        assert!(matches!(to_fixed_point("-0.0"), Err(ParamError::Negative { .. })));
    }

    #[test]
    fn test_rejects_non_finite() {
        for input in ["NaN", "inf", "+Infinity"] {
            assert!(
                matches!(to_fixed_point(input), Err(ParamError::NonFinite { .. })),
                "{input} should be non-finite"
            );
        }
    }

    #[test]
    fn test_rejects_malformed() {
        for input in ["", ".", "1.2.3", "1e18", "abc", "1,5", "5%"] {
            assert!(
                matches!(to_fixed_point(input), Err(ParamError::Malformed { .. })),
                "{input:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_large_balances_fit() {
        // Beyond u128 but well within uint256.
        let tokens = "1000000000000000000000000";
        let value = to_fixed_point(tokens).expect("convert");
        assert!(value > Amount::from(u128::MAX));
        assert_eq!(from_fixed_point(value), tokens);
    }

    #[test]
    fn test_overflow() {
        // uint256 holds about 1.16e77, so 1e60 tokens at 18 decimals overflows.
        let huge = format!("1{}", "0".repeat(60));
        assert!(matches!(to_fixed_point(&huge), Err(ParamError::Overflow { .. })));
    }

    #[test]
    fn test_from_fixed_point() {
        assert_eq!(from_fixed_point(Amount::from(1_100_000_000_000_000_000u64)), "1.1");
        assert_eq!(from_fixed_point(wad(10)), "10");
        assert_eq!(from_fixed_point(Amount::from(1)), "0.000000000000000001");
        assert_eq!(from_fixed_point(Amount::ZERO), "0");
    }

    #[test]
    fn test_scaled_zero_decimals() {
        assert_eq!(to_scaled("42.9", 0).expect("convert"), Amount::from(42));
        assert_eq!(from_scaled(Amount::from(42), 0), "42");
        assert_eq!(from_scaled(Amount::from(100), 0), "100");
    }
}

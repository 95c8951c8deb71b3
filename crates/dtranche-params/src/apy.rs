//! Tranche APY units.
//!
//! The vault stores APY as an integer with six implied decimals, so a 5%
//! senior target is `50_000` and a 15% junior target is `150_000`.

use dtranche_types::{Amount, APY_DECIMALS};

use crate::fixed_point::{from_scaled, to_scaled};
use crate::{ParamError, Result};

/// Units per 1.0 (100%) APY.
pub const APY_SCALE: u64 = 1_000_000;

/// Convert a decimal fraction string (`"0.05"` for 5%) to APY units.
///
/// # Errors
///
/// - [`ParamError::Negative`], [`ParamError::NonFinite`], [`ParamError::Malformed`]
///   as for [`to_fixed_point`](crate::fixed_point::to_fixed_point)
/// - [`ParamError::Overflow`] if the result exceeds `u64`
pub fn to_apy_units(input: &str) -> Result<u64> {
    let scaled = to_scaled(input, APY_DECIMALS)?;
    u64::try_from(scaled).map_err(|_| ParamError::Overflow {
        input: input.to_string(),
    })
}

/// Render APY units as a decimal fraction string.
pub fn from_apy_units(units: u64) -> String {
    from_scaled(Amount::from(units), APY_DECIMALS)
}

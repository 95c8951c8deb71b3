//! # dtranche-params
//!
//! Conversion between operator-facing decimal parameters and the integer
//! representations the contracts store.
//!
//! | Parameter | Representation | Example |
//! |-----------|----------------|---------|
//! | Token amounts, supply rate | 10^18 fixed-point | `"1.1"` → `1_100_000_000_000_000_000` |
//! | Tranche APY | 10^6 units | `"0.05"` → `50_000` |
//!
//! Scaling is `alloy_primitives::utils::parse_units` / `format_units` over
//! `U256`; this crate adds the sign, finiteness and overflow checks. Digits
//! past the target scale are truncated, so a decimal string does not always
//! survive a round trip.
//!
//! ## Modules
//!
//! - [`fixed_point`] - Generic scaled decimals and the 10^18 token scale
//! - [`apy`] - Tranche APY units

pub mod apy;
pub mod fixed_point;

pub use apy::{from_apy_units, to_apy_units};
pub use fixed_point::{from_fixed_point, to_fixed_point};

/// Error types for parameter conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// Input is negative.
    #[error("negative parameter: {input}")]
    Negative {
        /// The rejected input.
        input: String,
    },

    /// Input is NaN or infinite.
    #[error("non-finite parameter: {input}")]
    NonFinite {
        /// The rejected input.
        input: String,
    },

    /// Input is not a plain decimal number.
    #[error("malformed decimal {input:?}: {reason}")]
    Malformed {
        /// The rejected input.
        input: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Scaled value does not fit the target integer (`uint256`, or `u64` for APY).
    #[error("parameter out of range: {input}")]
    Overflow {
        /// The rejected input.
        input: String,
    },
}

/// Convenience result type for parameter conversion.
pub type Result<T> = std::result::Result<T, ParamError>;

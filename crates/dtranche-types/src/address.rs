//! Ledger account addresses.
//!
//! Addresses are [`alloy_primitives::Address`]. Whether a component already
//! has an address is carried by [`KnownAddress`] rather than by an empty
//! string, so "not configured" can never be mistaken for a valid address.

pub use alloy_primitives::Address;

use crate::{Result, TypesError};

/// Parse a `0x`-prefixed (or bare) 40-digit hex address.
///
/// # Errors
///
/// - [`TypesError::InvalidAddress`] if the value is not 20 bytes of hex
pub fn parse_address(value: &str) -> Result<Address> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|e| TypesError::InvalidAddress {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Whether a component already has a canonical address on a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KnownAddress {
    /// The component is deployed at this address.
    Known(Address),
    /// No address is known; the component must be deployed.
    Absent,
}

impl KnownAddress {
    /// Parse an optional configured address.
    ///
    /// A missing value and an empty (or whitespace-only) string both mean
    /// [`KnownAddress::Absent`]. Anything else must parse as a non-zero
    /// address.
    ///
    /// # Errors
    ///
    /// - [`TypesError::InvalidAddress`] if the value is malformed or zero
    pub fn from_config(value: Option<&str>) -> Result<Self> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::Absent),
            Some(raw) => {
                let address = parse_address(raw)?;
                if address.is_zero() {
                    return Err(TypesError::InvalidAddress {
                        value: raw.to_string(),
                        reason: "zero address".to_string(),
                    });
                }
                Ok(Self::Known(address))
            }
        }
    }

    /// The address, if known.
    pub fn address(&self) -> Option<Address> {
        match self {
            Self::Known(address) => Some(*address),
            Self::Absent => None,
        }
    }

    /// Whether an address is known.
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl From<Option<Address>> for KnownAddress {
    fn from(value: Option<Address>) -> Self {
        value.map_or(Self::Absent, Self::Known)
    }
}

//! # dtranche-types
//!
//! Shared domain types for the dTranche deployment and operations tooling.
//!
//! The protocol contracts live on an external ledger. Everything here is a
//! client-side description of them: where they live, what they can do, and
//! which permission links must exist between them.
//!
//! ## Modules
//!
//! - [`address`] - Account addresses and the known/absent sum type
//! - [`component`] - Component kinds, capabilities and contract handles
//! - [`edge`] - Permission edges between components
//! - [`settlement`] - Tranche indices, settlement batches and allocations

pub mod address;
pub mod component;
pub mod edge;
pub mod settlement;

pub use address::{parse_address, Address, KnownAddress};
pub use alloy_primitives::U256;
pub use component::{Capability, ComponentKind, ConstructorInput, ContractHandle, PairId, Scalar};
pub use edge::{PermissionEdge, Relation};
pub use settlement::{Allocation, SettlementBatch, Tranche};

/// Fixed-point token amount (18 decimals on chain, uint256).
pub type Amount = U256;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Number of tranches in a vault (senior and junior).
pub const TRANCHE_COUNT: usize = 2;

/// Decimal places of on-chain token amounts and the supply rate.
pub const TOKEN_DECIMALS: u8 = 18;

/// Decimal places of tranche APY units (0.05 is stored as 50_000).
pub const APY_DECIMALS: u8 = 6;

/// Error types for domain type construction.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// Address string is not 20 bytes of hex.
    #[error("invalid address {value:?}: {reason}")]
    InvalidAddress {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A contract handle was asked for an operation its kind does not expose.
    #[error("{kind} at {address} does not expose {capability}")]
    MissingCapability {
        /// The handle's component kind.
        kind: ComponentKind,
        /// The handle's address.
        address: Address,
        /// The capability that was requested.
        capability: Capability,
    },
}

/// Convenience result type for domain type construction.
pub type Result<T> = std::result::Result<T, TypesError>;

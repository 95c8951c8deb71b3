//! # dtranche-ledger
//!
//! The call/response contract between the orchestrator and the external
//! ledger hosting the protocol contracts.
//!
//! [`Ledger`] exposes one method per contract operation the tooling uses.
//! Reads return decoded values; writes return only after the transaction is
//! confirmed, so callers can rely on its effects in the next step. Every
//! method takes the [`ContractHandle`] it targets and refuses handles whose
//! kind does not expose the operation.
//!
//! ## Modules
//!
//! - [`memory`] - In-process simulated chain used for rehearsals and tests

pub mod memory;

use std::fmt;

use dtranche_types::{
    Address, Allocation, Amount, ComponentKind, ContractHandle, SettlementBatch, Timestamp,
    Tranche, TypesError, U256,
};

pub use memory::{MemoryLedger, TxRecord};

/// Transaction hash.
pub type TxHash = [u8; 32];

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The transaction was mined but reverted, or was rejected on simulation.
    #[error("{call} reverted: {reason}")]
    Reverted {
        /// Contract method (or `deploy`).
        call: String,
        /// Revert reason as reported by the ledger.
        reason: String,
    },

    /// RPC / network failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Build artifact missing or unusable.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// The targeted handle does not expose the operation.
    #[error(transparent)]
    Capability(#[from] TypesError),

    /// A returned value could not be decoded into the expected type.
    #[error("unexpected value from {call}: {reason}")]
    UnexpectedValue {
        /// Contract method.
        call: String,
        /// What was wrong.
        reason: String,
    },

    /// No contract of a usable kind at the address.
    #[error("no contract at {0}")]
    NoContract(Address),
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// A positional constructor argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstructorArg {
    /// `address`
    Address(Address),
    /// `uint256`
    Uint(U256),
}

impl fmt::Display for ConstructorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => write!(f, "{address}"),
            Self::Uint(value) => write!(f, "{value}"),
        }
    }
}

/// A contract creation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployRequest {
    /// Kind being deployed; selects the contract code.
    pub kind: ComponentKind,
    /// Constructor arguments in the kind's fixed order.
    pub args: Vec<ConstructorArg>,
}

/// Confirmation of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Block the transaction was included in, when reported.
    pub block_number: Option<u64>,
}

impl Receipt {
    /// Transaction hash as `0x`-prefixed hex.
    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.tx_hash))
    }
}

/// Typed access to the protocol contracts on a ledger.
///
/// Implementations issue at most one transaction per write call and return
/// only after it is confirmed. They never retry a reverted transaction.
#[allow(async_fn_in_trait)]
pub trait Ledger {
    /// Account that signs transactions (deployer and vault owner).
    fn operator(&self) -> Address;

    /// Deploy a component and wait for confirmation; returns the new address.
    async fn deploy(&self, request: &DeployRequest) -> Result<Address>;

    /// Faucet-mint the investment asset.
    async fn mint(&self, asset: &ContractHandle, to: Address, amount: Amount) -> Result<Receipt>;

    /// Token balance of `account`.
    async fn balance_of(&self, token: &ContractHandle, account: Address) -> Result<Amount>;

    /// Whether `vault` is registered as the tranche token's vault.
    async fn is_vault(&self, token: &ContractHandle, vault: Address) -> Result<bool>;

    /// Register `vault` on a tranche token.
    async fn set_vault(&self, token: &ContractHandle, vault: Address) -> Result<Receipt>;

    /// Whether `account` may mint the protocol token.
    async fn is_minter(&self, token: &ContractHandle, account: Address) -> Result<bool>;

    /// Grant `account` the minter role on the protocol token.
    async fn add_minter(&self, token: &ContractHandle, account: Address) -> Result<Receipt>;

    /// Current senior token supply rate (fixed-point; zero means unset).
    async fn senior_supply_rate(&self, vault: &ContractHandle) -> Result<Amount>;

    /// Set the senior token supply rate.
    async fn set_senior_supply_rate(&self, vault: &ContractHandle, rate: Amount) -> Result<Receipt>;

    /// Tranche APY in 10^6 units.
    async fn apy(&self, vault: &ContractHandle, tranche: Tranche) -> Result<u64>;

    /// Set a tranche APY in 10^6 units.
    async fn set_apy(&self, vault: &ContractHandle, tranche: Tranche, units: u64) -> Result<Receipt>;

    /// The vault's own view of the current period.
    async fn current_period(&self, vault: &ContractHandle) -> Result<u64>;

    /// The vault's immutable start time.
    async fn start_time(&self, vault: &ContractHandle) -> Result<Timestamp>;

    /// Settle the current period (owner only).
    async fn settle_profits_by_owner(
        &self,
        vault: &ContractHandle,
        batch: &SettlementBatch,
    ) -> Result<Receipt>;

    /// Redeploy settled capital across tranches (owner only).
    async fn invest_by_owner(&self, vault: &ContractHandle, allocation: &Allocation)
        -> Result<Receipt>;

    /// Appoint the account allowed to notify rewards on a reward pool.
    async fn set_reward_distribution_manager(
        &self,
        pool: &ContractHandle,
        manager: Address,
    ) -> Result<Receipt>;

    /// Start (or top up) a reward pool's distribution.
    async fn notify_reward_amount(&self, pool: &ContractHandle, amount: Amount) -> Result<Receipt>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_hash_hex() {
        let receipt = Receipt {
            tx_hash: [0xab; 32],
            block_number: Some(7),
        };
        assert_eq!(receipt.hash_hex(), format!("0x{}", "ab".repeat(32)));
    }

    #[test]
    fn test_constructor_arg_display() {
        assert_eq!(ConstructorArg::Uint(U256::from(300)).to_string(), "300");
        assert_eq!(
            ConstructorArg::Address(Address::repeat_byte(0x11)).to_string(),
            format!("0x{}", "11".repeat(20))
        );
    }
}

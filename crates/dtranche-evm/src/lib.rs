//! # dtranche-evm
//!
//! [`Ledger`](dtranche_ledger::Ledger) implementation over an EVM JSON-RPC
//! endpoint.
//!
//! Transactions are signed locally with the operator's private key. Contract
//! code comes from compiled build artifacts on disk; calls go through typed
//! `sol!` bindings.
//!
//! ## Modules
//!
//! - [`artifacts`] - Locating and decoding compiled contract artifacts
//! - [`bindings`] - Solidity interface bindings for the protocol contracts
//! - [`ledger`] - The RPC-backed ledger

pub mod artifacts;
pub mod bindings;
pub mod ledger;

use dtranche_ledger::LedgerError;

pub use artifacts::ArtifactStore;
pub use ledger::EvmLedger;

/// Error types for RPC ledger setup.
#[derive(Debug, thiserror::Error)]
pub enum EvmError {
    /// The signing key could not be loaded.
    #[error("signing key error: {0}")]
    Key(String),

    /// The RPC endpoint could not be reached or configured.
    #[error("rpc connection error: {0}")]
    Connect(String),

    /// A build artifact is missing or malformed.
    #[error("artifact {name}: {reason}")]
    Artifact {
        /// Contract name that was looked up.
        name: String,
        /// What went wrong.
        reason: String,
    },

    /// I/O error while reading artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EvmError> for LedgerError {
    fn from(err: EvmError) -> Self {
        match err {
            EvmError::Artifact { .. } | EvmError::Io(_) => LedgerError::Artifact(err.to_string()),
            EvmError::Key(_) | EvmError::Connect(_) => LedgerError::Transport(err.to_string()),
        }
    }
}

/// Convenience result type for RPC ledger setup.
pub type Result<T> = std::result::Result<T, EvmError>;

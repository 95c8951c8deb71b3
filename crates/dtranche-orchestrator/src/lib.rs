//! # dtranche-orchestrator
//!
//! Idempotent deployment and operation of a tranche vault deployment.
//!
//! Every stage reads before it writes: components with a known address are
//! attached rather than redeployed, permission edges that already hold are
//! left alone, and the supply rate is only set while it is still zero. A run
//! that aborts part way can therefore be started again from the top.
//!
//! Stage order for a full deployment:
//!
//! 1. Resolve addresses (configuration, then the deployment record)
//! 2. Deploy or attach each component in dependency order
//! 3. Fund the operator from the asset faucet (fresh deployments only)
//! 4. Reconcile vault permission edges
//! 5. Configure the senior supply rate and tranche APYs
//!
//! Settlement and reward distribution run as separate operations against an
//! existing deployment.
//!
//! ## Modules
//!
//! - [`address_book`] - Per-network profiles and address resolution
//! - [`context`] - Run context threaded through every stage
//! - [`cycle`] - Supply rate, APY and per-period settlement
//! - [`materialize`] - Deploy-or-attach for a single component
//! - [`orchestrator`] - Stage sequencing and reports
//! - [`resolver`] - Dependency ordering of component kinds
//! - [`store`] - Persistent deployment records
//! - [`wiring`] - Permission edge reconciliation

pub mod address_book;
pub mod context;
pub mod cycle;
pub mod materialize;
pub mod orchestrator;
pub mod resolver;
pub mod store;
pub mod wiring;

use dtranche_ledger::LedgerError;
use dtranche_params::ParamError;
use dtranche_types::{Address, ComponentKind};

pub use address_book::{AddressBook, NetworkProfile, RewardPoolSpec, StaticParams};
pub use context::DeploymentContext;
pub use cycle::{Clock, ParamOutcome, SettlementOutcome, SystemClock};
pub use materialize::{DeployParams, Materialized};
pub use orchestrator::{Orchestrator, RunReport, StatusReport};
pub use resolver::deployment_order;
pub use store::{
    check_network_name, DeploymentRecord, FileRecordStore, MemoryRecordStore, RecordStore,
    SettlementStage,
};
pub use wiring::EdgeOutcome;

/// Error types for orchestration.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Unknown network, malformed address, or otherwise unusable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A constructor dependency has no handle yet.
    #[error("{kind} requires {dependency}, which has not been resolved")]
    DependencyMissing {
        /// Kind being materialized.
        kind: ComponentKind,
        /// The missing dependency.
        dependency: ComponentKind,
    },

    /// A transaction reverted. Never retried automatically.
    #[error("{step}: transaction reverted: {reason}")]
    TransactionReverted {
        /// Stage step that issued the transaction.
        step: String,
        /// Revert reason from the ledger.
        reason: String,
    },

    /// A permission edge still does not hold after its write confirmed.
    #[error("edge {edge} does not hold after reconciliation")]
    WiringVerification {
        /// The edge, rendered.
        edge: String,
    },

    /// A decimal parameter could not be converted.
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] ParamError),

    /// The period was already settled on this vault.
    #[error("period {period} of vault {vault} is already settled")]
    AlreadySettled {
        /// Vault address.
        vault: Address,
        /// The settled period.
        period: u64,
    },

    /// A ledger query or transport failure.
    #[error("{step}: {source}")]
    Ledger {
        /// Stage step that made the call.
        step: String,
        /// Underlying ledger error.
        #[source]
        source: LedgerError,
    },

    /// Deployment record could not be read or written.
    #[error("deployment record error: {0}")]
    Store(String),
}

impl OrchestratorError {
    /// Attach the step name to a ledger error, lifting reverts into
    /// [`OrchestratorError::TransactionReverted`].
    pub fn ledger(step: impl Into<String>, err: LedgerError) -> Self {
        match err {
            LedgerError::Reverted { reason, .. } => Self::TransactionReverted {
                step: step.into(),
                reason,
            },
            source => Self::Ledger {
                step: step.into(),
                source,
            },
        }
    }
}

/// Convenience result type for orchestration.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_lifted() {
        let err = OrchestratorError::ledger(
            "setVault",
            LedgerError::Reverted {
                call: "setVault".to_string(),
                reason: "Ownable: caller is not the owner".to_string(),
            },
        );
        assert!(matches!(err, OrchestratorError::TransactionReverted { ref step, .. } if step == "setVault"));
    }

    #[test]
    fn test_transport_kept() {
        let err = OrchestratorError::ledger("isVault", LedgerError::Transport("timeout".to_string()));
        assert!(matches!(err, OrchestratorError::Ledger { .. }));
        assert_eq!(err.to_string(), "isVault: transport error: timeout");
    }
}

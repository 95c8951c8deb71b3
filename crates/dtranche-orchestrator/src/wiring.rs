//! Permission edge reconciliation.
//!
//! Read the edge on the object contract, write only if it is missing, then
//! read again. One write per edge at most; a failed write is never retried.

use dtranche_ledger::{Ledger, Receipt};
use dtranche_types::{ContractHandle, PermissionEdge, Relation};

use crate::{OrchestratorError, Result};

/// What reconciling an edge did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// The edge already held; nothing was sent.
    AlreadySatisfied,
    /// The edge was missing and has been established.
    Established(Receipt),
}

fn check_handles(edge: &PermissionEdge, subject: &ContractHandle, object: &ContractHandle) -> Result<()> {
    if subject.kind() != &edge.subject || object.kind() != &edge.object {
        return Err(OrchestratorError::Config(format!(
            "edge {edge} reconciled with {subject} and {object}"
        )));
    }
    object
        .require(edge.relation.required_capability())
        .map_err(|e| OrchestratorError::Config(format!("edge {edge}: {e}")))
}

/// Whether `edge` currently holds on the ledger.
///
/// # Errors
///
/// - [`OrchestratorError::Ledger`] if the read fails
pub async fn edge_holds<L: Ledger>(
    ledger: &L,
    edge: &PermissionEdge,
    subject: &ContractHandle,
    object: &ContractHandle,
) -> Result<bool> {
    check_handles(edge, subject, object)?;
    let read = match edge.relation {
        Relation::IsVaultOf => ledger.is_vault(object, subject.address()).await,
        Relation::IsMinterOf => ledger.is_minter(object, subject.address()).await,
    };
    read.map_err(|e| OrchestratorError::ledger(edge.to_string(), e))
}

/// Make `edge` hold, writing only if it does not already.
///
/// With `verify` set the edge is read again after the write and must hold.
///
/// # Errors
///
/// - [`OrchestratorError::TransactionReverted`] if the write reverts
/// - [`OrchestratorError::WiringVerification`] if the edge does not hold afterwards
/// - [`OrchestratorError::Ledger`] for read failures, tagged with the edge
pub async fn reconcile_edge<L: Ledger>(
    ledger: &L,
    edge: &PermissionEdge,
    subject: &ContractHandle,
    object: &ContractHandle,
    verify: bool,
) -> Result<EdgeOutcome> {
    if edge_holds(ledger, edge, subject, object).await? {
        tracing::info!(edge = %edge, object = %object.address(), "edge already holds");
        return Ok(EdgeOutcome::AlreadySatisfied);
    }

    let write = match edge.relation {
        Relation::IsVaultOf => ledger.set_vault(object, subject.address()).await,
        Relation::IsMinterOf => ledger.add_minter(object, subject.address()).await,
    };
    let receipt = write.map_err(|e| OrchestratorError::ledger(edge.to_string(), e))?;
    tracing::info!(edge = %edge, tx = %receipt.hash_hex(), "edge established");

    if verify && !edge_holds(ledger, edge, subject, object).await? {
        return Err(OrchestratorError::WiringVerification {
            edge: edge.to_string(),
        });
    }
    Ok(EdgeOutcome::Established(receipt))
}

//! Run context.
//!
//! Holds the handles materialized so far and the deployment record. It is
//! the only mutable state of a run and is passed explicitly to every stage.

use std::collections::BTreeMap;

use dtranche_types::{Address, ComponentKind, ContractHandle};

use crate::store::{DeploymentRecord, RecordStore, SettlementStage};
use crate::{OrchestratorError, Result};

/// State of one orchestration run on one network.
pub struct DeploymentContext<'a> {
    network: String,
    store: &'a dyn RecordStore,
    record: DeploymentRecord,
    handles: BTreeMap<ComponentKind, ContractHandle>,
}

impl std::fmt::Debug for DeploymentContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentContext")
            .field("network", &self.network)
            .field("handles", &self.handles)
            .finish_non_exhaustive()
    }
}

impl<'a> DeploymentContext<'a> {
    /// Start a run on `network`, loading its record from `store`.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Store`] if the record cannot be read
    pub fn load(network: &str, store: &'a dyn RecordStore) -> Result<Self> {
        let record = store.load(network)?;
        tracing::debug!(
            network,
            recorded = record.addresses.len(),
            "deployment record loaded"
        );
        Ok(Self {
            network: network.to_string(),
            store,
            record,
            handles: BTreeMap::new(),
        })
    }

    /// Network name.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// The deployment record as of now.
    pub fn record(&self) -> &DeploymentRecord {
        &self.record
    }

    /// Handle of `kind`, if materialized.
    pub fn handle(&self, kind: &ComponentKind) -> Option<&ContractHandle> {
        self.handles.get(kind)
    }

    /// Handle of `kind`, which `dependent` needs.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::DependencyMissing`] if `kind` is not materialized
    pub fn dependency(&self, dependent: &ComponentKind, kind: &ComponentKind) -> Result<&ContractHandle> {
        self.handles
            .get(kind)
            .ok_or_else(|| OrchestratorError::DependencyMissing {
                kind: dependent.clone(),
                dependency: kind.clone(),
            })
    }

    /// Register an attached handle.
    pub(crate) fn attach(&mut self, handle: ContractHandle) {
        self.handles.insert(handle.kind().clone(), handle);
    }

    /// Register a freshly deployed handle and persist its address.
    pub(crate) fn record_deployment(&mut self, handle: ContractHandle) -> Result<()> {
        let kind = handle.kind().clone();
        self.record.addresses.insert(kind.clone(), handle.address());
        self.handles.insert(kind, handle);
        self.store.save(&self.record)
    }

    /// Record settlement progress of a vault period and persist it.
    pub(crate) fn record_settlement(&mut self, vault: Address, period: u64, stage: SettlementStage) -> Result<()> {
        self.record
            .settlements
            .entry(vault)
            .or_default()
            .insert(period, stage);
        self.store.save(&self.record)
    }

    /// Record that a reward pool's distribution was started.
    pub(crate) fn record_rewards_notified(&mut self, pool: Address) -> Result<()> {
        self.record.rewards_notified.insert(pool);
        self.store.save(&self.record)
    }

    /// Record that the faucet mint was done.
    pub(crate) fn record_faucet_funded(&mut self) -> Result<()> {
        self.record.faucet_funded = true;
        self.store.save(&self.record)
    }
}

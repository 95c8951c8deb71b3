//! Deployment records.
//!
//! One JSON document per network holding what this tooling has done on it:
//! addresses of components it deployed, settlement progress per vault period,
//! reward pools already kicked off and whether the faucet has been drawn.
//! The record is saved after every state-changing step so an interrupted run
//! resumes by attaching instead of redeploying.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dtranche_types::{Address, ComponentKind};
use serde::{Deserialize, Serialize};

use crate::{OrchestratorError, Result};

/// How far a period's settlement got.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStage {
    /// `settleProfitsByOwner` confirmed; investment still outstanding.
    Settled,
    /// `investByOwner` confirmed as well.
    Invested,
}

/// Everything recorded about one network.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Network name.
    pub network: String,
    /// Addresses of components deployed by this tooling.
    #[serde(default)]
    pub addresses: BTreeMap<ComponentKind, Address>,
    /// Settlement progress, per vault and period.
    #[serde(default)]
    pub settlements: BTreeMap<Address, BTreeMap<u64, SettlementStage>>,
    /// Reward pools whose distribution has been started.
    #[serde(default)]
    pub rewards_notified: BTreeSet<Address>,
    /// Whether the faucet mint to the operator has been done.
    #[serde(default)]
    pub faucet_funded: bool,
}

impl DeploymentRecord {
    /// Empty record for `network`.
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            ..Self::default()
        }
    }

    /// Recorded settlement stage of `period` on `vault`.
    pub fn settlement(&self, vault: Address, period: u64) -> Option<SettlementStage> {
        self.settlements
            .get(&vault)
            .and_then(|periods| periods.get(&period))
            .copied()
    }
}

/// Persistence for [`DeploymentRecord`]s.
pub trait RecordStore {
    /// Load the record for `network`, or an empty one if none exists.
    fn load(&self, network: &str) -> Result<DeploymentRecord>;

    /// Save a record, replacing any previous one for the same network.
    fn save(&self, record: &DeploymentRecord) -> Result<()>;
}

/// Check that a network name is usable as a record file stem.
///
/// Names are ASCII letters, digits, `_` and `-`, so a name can never reach
/// outside the record directory.
///
/// # Errors
///
/// - [`OrchestratorError::Config`] for an empty name or any other character
pub fn check_network_name(network: &str) -> Result<()> {
    let valid = !network.is_empty()
        && network
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(OrchestratorError::Config(format!(
            "invalid network name {network:?}: use letters, digits, '_' or '-'"
        )))
    }
}

/// Records kept as `<dir>/<network>.json`.
#[derive(Clone, Debug)]
pub struct FileRecordStore {
    dir: PathBuf,
}

impl FileRecordStore {
    /// Store records under `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the record file for `network`.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Config`] if `network` is not a plain name
    pub fn path(&self, network: &str) -> Result<PathBuf> {
        check_network_name(network)?;
        Ok(self.dir.join(format!("{network}.json")))
    }
}

fn store_err(path: &Path, err: impl std::fmt::Display) -> OrchestratorError {
    OrchestratorError::Store(format!("{}: {err}", path.display()))
}

impl RecordStore for FileRecordStore {
    fn load(&self, network: &str) -> Result<DeploymentRecord> {
        let path = self.path(network)?;
        if !path.exists() {
            return Ok(DeploymentRecord::new(network));
        }
        let raw = fs::read_to_string(&path).map_err(|e| store_err(&path, e))?;
        let record: DeploymentRecord = serde_json::from_str(&raw).map_err(|e| store_err(&path, e))?;
        if record.network != network {
            return Err(OrchestratorError::Store(format!(
                "{} belongs to network {:?}",
                path.display(),
                record.network
            )));
        }
        Ok(record)
    }

    fn save(&self, record: &DeploymentRecord) -> Result<()> {
        let path = self.path(&record.network)?;
        fs::create_dir_all(&self.dir).map_err(|e| store_err(&self.dir, e))?;
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(record).map_err(|e| store_err(&path, e))?;
        fs::write(&tmp, json).map_err(|e| store_err(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| store_err(&path, e))?;
        tracing::debug!(path = %path.display(), "deployment record saved");
        Ok(())
    }
}

/// Records held in memory, for rehearsals and tests.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<String, DeploymentRecord>>,
}

impl MemoryRecordStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn load(&self, network: &str) -> Result<DeploymentRecord> {
        let records = self
            .records
            .lock()
            .map_err(|_| OrchestratorError::Store("record lock poisoned".to_string()))?;
        Ok(records
            .get(network)
            .cloned()
            .unwrap_or_else(|| DeploymentRecord::new(network)))
    }

    fn save(&self, record: &DeploymentRecord) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| OrchestratorError::Store("record lock poisoned".to_string()))?;
        records.insert(record.network.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtranche_types::PairId;

    fn sample() -> DeploymentRecord {
        let mut record = DeploymentRecord::new("bsc_test");
        record
            .addresses
            .insert(ComponentKind::Vault, Address::repeat_byte(0x0a));
        record.addresses.insert(
            ComponentKind::RewardPool(PairId("st-skyrim".to_string())),
            Address::repeat_byte(0x0b),
        );
        record
            .settlements
            .entry(Address::repeat_byte(0x0a))
            .or_default()
            .insert(3, SettlementStage::Settled);
        record
    }

    #[test]
    fn test_missing_file_is_empty_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileRecordStore::new(dir.path().join("deployments"));
        let record = store.load("bsc_test").expect("load");
        assert_eq!(record, DeploymentRecord::new("bsc_test"));
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileRecordStore::new(dir.path().join("deployments"));
        let record = sample();
        store.save(&record).expect("save");

        let raw = fs::read_to_string(store.path("bsc_test").expect("path")).expect("read");
        assert!(raw.contains("\"reward_pool:st-skyrim\""));
        assert!(raw.contains("\"settled\""));

        let loaded = store.load("bsc_test").expect("load");
        assert_eq!(loaded, record);
        assert_eq!(
            loaded.settlement(Address::repeat_byte(0x0a), 3),
            Some(SettlementStage::Settled)
        );
        assert_eq!(loaded.settlement(Address::repeat_byte(0x0a), 4), None);
    }

    #[test]
    fn test_rejects_foreign_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileRecordStore::new(dir.path());
        store.save(&sample()).expect("save");
        fs::rename(
            store.path("bsc_test").expect("path"),
            store.path("mainnet").expect("path"),
        )
        .expect("rename");
        assert!(matches!(store.load("mainnet"), Err(OrchestratorError::Store(_))));
    }

    #[test]
    fn test_network_name_stays_in_record_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileRecordStore::new(dir.path().join("records"));
        for name in ["../escape", "a/b", "a\\b", "", "..", "main net"] {
            assert!(
                matches!(store.load(name), Err(OrchestratorError::Config(_))),
                "{name:?} should be rejected"
            );
            assert!(store.save(&DeploymentRecord::new(name)).is_err());
        }
        assert!(!dir.path().join("escape.json").exists());
        assert!(!dir.path().join("records").exists());
        assert!(check_network_name("bsc_test").is_ok());
        assert!(check_network_name("bsc-main-2").is_ok());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryRecordStore::new();
        assert!(store.load("local").expect("load").addresses.is_empty());
        let mut record = DeploymentRecord::new("local");
        record.faucet_funded = true;
        store.save(&record).expect("save");
        assert!(store.load("local").expect("load").faucet_funded);
    }
}

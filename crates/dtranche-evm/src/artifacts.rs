//! Compiled contract artifacts.
//!
//! Artifacts are the JSON files a Solidity toolchain writes per contract
//! (`artifacts/contracts/Foo.sol/Foo.json` for Hardhat, `build/contracts/Foo.json`
//! for Truffle). Only the top-level `bytecode` field is used. Debug sidecar
//! files (`Foo.dbg.json`) are never matched.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use dtranche_types::ComponentKind;
use serde::Deserialize;

use crate::{EvmError, Result};

#[derive(Deserialize)]
struct ArtifactFile {
    bytecode: String,
}

/// Looks up creation bytecode by component kind.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    names: HashMap<ComponentKind, String>,
}

impl ArtifactStore {
    /// Create a store rooted at `root`, using each kind's default contract name.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            names: HashMap::new(),
        }
    }

    /// Use `name` instead of the default contract name for `kind`.
    pub fn with_name(mut self, kind: ComponentKind, name: impl Into<String>) -> Self {
        self.names.insert(kind, name.into());
        self
    }

    /// Contract name used for `kind`.
    pub fn contract_name<'a>(&'a self, kind: &ComponentKind) -> &'a str {
        self.names
            .get(kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_artifact())
    }

    /// Creation bytecode for `kind`.
    ///
    /// # Errors
    ///
    /// - [`EvmError::Artifact`] if no artifact file exists, it has no usable
    ///   `bytecode`, or the bytecode is empty (an interface or abstract contract)
    pub fn bytecode(&self, kind: &ComponentKind) -> Result<Vec<u8>> {
        let name = self.contract_name(kind);
        let path = find_artifact(&self.root, &format!("{name}.json"))?.ok_or_else(|| {
            EvmError::Artifact {
                name: name.to_string(),
                reason: format!("not found under {}", self.root.display()),
            }
        })?;
        tracing::debug!(kind = %kind, path = %path.display(), "loading artifact");

        let raw = fs::read_to_string(&path)?;
        let artifact: ArtifactFile = serde_json::from_str(&raw).map_err(|e| EvmError::Artifact {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        let hex_code = artifact.bytecode.trim();
        let hex_code = hex_code.strip_prefix("0x").unwrap_or(hex_code);
        let code = hex::decode(hex_code).map_err(|e| EvmError::Artifact {
            name: name.to_string(),
            reason: format!("bad bytecode hex: {e}"),
        })?;
        if code.is_empty() {
            return Err(EvmError::Artifact {
                name: name.to_string(),
                reason: "empty bytecode".to_string(),
            });
        }
        Ok(code)
    }
}

/// Depth-first search for a file named exactly `file_name`.
fn find_artifact(dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path.file_name().and_then(|n| n.to_str()) == Some(file_name) {
            return Ok(Some(path));
        }
    }
    subdirs.sort();
    for sub in subdirs {
        if let Some(found) = find_artifact(&sub, file_name)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtranche_types::PairId;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, body).expect("write");
    }

    #[test]
    fn test_finds_nested_hardhat_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "contracts/BUSD.sol/BUSD.dbg.json",
            r#"{"buildInfo":"x"}"#,
        );
        write(
            dir.path(),
            "contracts/BUSD.sol/BUSD.json",
            r#"{"contractName":"BUSD","bytecode":"0x6080604052"}"#,
        );

        let store = ArtifactStore::new(dir.path());
        let code = store
            .bytecode(&ComponentKind::InvestmentAsset)
            .expect("bytecode");
        assert_eq!(code, vec![0x60, 0x80, 0x60, 0x40, 0x52]);
    }

    #[test]
    fn test_name_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "STAndSkyrimLPTokenStakeRewardPool.json",
            r#"{"bytecode":"6001"}"#,
        );
        let kind = ComponentKind::RewardPool(PairId("st-skyrim".to_string()));
        let store =
            ArtifactStore::new(dir.path()).with_name(kind.clone(), "STAndSkyrimLPTokenStakeRewardPool");

        assert_eq!(store.contract_name(&kind), "STAndSkyrimLPTokenStakeRewardPool");
        assert_eq!(store.bytecode(&kind).expect("bytecode"), vec![0x60, 0x01]);
    }

    #[test]
    fn test_missing_and_empty_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "contracts/IVault.sol/SkyrimInvestVaultAdmin.json",
            r#"{"bytecode":"0x"}"#,
        );
        let store = ArtifactStore::new(dir.path());

        assert!(matches!(
            store.bytecode(&ComponentKind::SeniorToken),
            Err(EvmError::Artifact { .. })
        ));
        assert!(matches!(
            store.bytecode(&ComponentKind::Vault),
            Err(EvmError::Artifact { .. })
        ));
    }
}

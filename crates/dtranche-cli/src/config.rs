//! Configuration file management.
//!
//! ```toml
//! [networks.bsc_test]
//! rpc_url = "https://data-seed-prebsc-2-s1.binance.org:8545/"
//! artifacts_dir = "artifacts"
//! senior_supply_rate = "1.1"
//! lock_period_secs = 300
//!
//! [networks.bsc_test.addresses]
//! asset = "0xe22d0BDd5769722E8C181b4b8BDe0433E45C7D9A"
//! vault = ""
//!
//! [[networks.bsc_test.reward_pools]]
//! pair_id = "st-skyrim"
//! pair_address = "0xfA096EE95Bc02552130F7647c3a12AaBFf4AAaFf"
//! reward_amount = "1000000"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use dtranche_orchestrator::{
    check_network_name, NetworkProfile, OrchestratorError, RewardPoolSpec, StaticParams,
};
use dtranche_params::{to_apy_units, to_fixed_point, ParamError};
use dtranche_types::{Address, ComponentKind, KnownAddress, PairId};
use serde::{Deserialize, Serialize};

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dtranche.toml";

/// Complete tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DtrancheConfig {
    /// Per-network settings, keyed by network name.
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Settings of one network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint. Required unless simulating.
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Environment variable holding the operator's hex private key.
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
    /// Directory searched for compiled contract artifacts.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
    /// Known component addresses. Empty = not deployed.
    #[serde(default)]
    pub addresses: AddressesConfig,
    /// Senior token supply rate.
    #[serde(default = "default_supply_rate")]
    pub senior_supply_rate: String,
    /// Vault period length in seconds.
    #[serde(default = "default_lock_period")]
    pub lock_period_secs: u64,
    /// Seconds between deployment and the vault's start time.
    #[serde(default = "default_start_delay")]
    pub start_delay_secs: u64,
    /// Protocol token supply minted to the operator, in whole tokens.
    #[serde(default = "default_initial_supply")]
    pub protocol_initial_supply: String,
    /// Faucet amount minted to the operator after deploying the asset.
    #[serde(default)]
    pub faucet_mint: Option<String>,
    /// Senior tranche APY (`"0.05"` = 5%).
    #[serde(default)]
    pub senior_apy: Option<String>,
    /// Junior tranche APY.
    #[serde(default)]
    pub junior_apy: Option<String>,
    /// Re-read permission edges after writing them.
    #[serde(default = "default_true")]
    pub verify_wiring: bool,
    /// Skip APY writes that would not change anything.
    #[serde(default = "default_true")]
    pub guard_apy_writes: bool,
    /// Deploy the vault data contract alongside the vault.
    #[serde(default)]
    pub deploy_vault_data: bool,
    /// Liquidity reward pools.
    #[serde(default)]
    pub reward_pools: Vec<RewardPoolConfig>,
}

/// Known addresses of the core components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressesConfig {
    /// Investment asset.
    #[serde(default)]
    pub asset: String,
    /// Senior tranche token.
    #[serde(default)]
    pub senior_token: String,
    /// Junior tranche token.
    #[serde(default)]
    pub junior_token: String,
    /// Protocol reward token.
    #[serde(default)]
    pub protocol_token: String,
    /// Investment vault.
    #[serde(default)]
    pub vault: String,
    /// Vault data contract.
    #[serde(default)]
    pub vault_data: String,
}

/// One reward pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardPoolConfig {
    /// Pair identifier, e.g. `st-skyrim`.
    pub pair_id: String,
    /// LP pair token address.
    pub pair_address: String,
    /// Pool address if already deployed.
    #[serde(default)]
    pub address: String,
    /// Artifact name override for this pool's contract.
    #[serde(default)]
    pub artifact: Option<String>,
    /// Reward amount notified once, in whole tokens.
    #[serde(default)]
    pub reward_amount: Option<String>,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory holding per-network deployment records.
    #[serde(default = "default_record_dir")]
    pub record_dir: PathBuf,
}

// Default value functions

fn default_private_key_env() -> String {
    "PRIVATE_KEY".to_string()
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_supply_rate() -> String {
    "1.1".to_string()
}

fn default_lock_period() -> u64 {
    300
}

fn default_start_delay() -> u64 {
    60
}

fn default_initial_supply() -> String {
    "1000000".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_record_dir() -> PathBuf {
    PathBuf::from("deployments")
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            private_key_env: default_private_key_env(),
            artifacts_dir: default_artifacts_dir(),
            addresses: AddressesConfig::default(),
            senior_supply_rate: default_supply_rate(),
            lock_period_secs: default_lock_period(),
            start_delay_secs: default_start_delay(),
            protocol_initial_supply: default_initial_supply(),
            faucet_mint: None,
            senior_apy: None,
            junior_apy: None,
            verify_wiring: true,
            guard_apy_writes: true,
            deploy_vault_data: false,
            reward_pools: Vec::new(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            record_dir: default_record_dir(),
        }
    }
}

fn known(network: &str, field: &str, value: &str) -> Result<KnownAddress, OrchestratorError> {
    KnownAddress::from_config(Some(value))
        .map_err(|e| OrchestratorError::Config(format!("networks.{network}.{field}: {e}")))
}

fn decimal<T>(
    network: &str,
    field: &str,
    value: &str,
    convert: fn(&str) -> Result<T, ParamError>,
) -> Result<T, OrchestratorError> {
    convert(value).map_err(|e| OrchestratorError::Config(format!("networks.{network}.{field}: {e}")))
}

fn optional_decimal<T>(
    network: &str,
    field: &str,
    value: Option<&str>,
    convert: fn(&str) -> Result<T, ParamError>,
) -> Result<Option<T>, OrchestratorError> {
    value.map(|v| decimal(network, field, v, convert)).transpose()
}

impl NetworkConfig {
    /// Validate into a profile for the address book.
    ///
    /// Every decimal is converted here, so a bad value fails before any
    /// ledger is contacted.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Config`] for a network name that is not a plain
    ///   file stem, malformed or zero addresses, a reward pool without a pair
    ///   address, a malformed decimal, a zero supply rate or a zero period length
    pub fn to_profile(&self, name: &str) -> Result<NetworkProfile, OrchestratorError> {
        check_network_name(name)?;
        let params = StaticParams {
            senior_supply_rate: decimal(name, "senior_supply_rate", &self.senior_supply_rate, to_fixed_point)?,
            lock_period_secs: self.lock_period_secs,
            start_delay_secs: self.start_delay_secs,
            protocol_initial_supply: decimal(
                name,
                "protocol_initial_supply",
                &self.protocol_initial_supply,
                to_fixed_point,
            )?,
            faucet_mint: optional_decimal(name, "faucet_mint", self.faucet_mint.as_deref(), to_fixed_point)?,
            senior_apy: optional_decimal(name, "senior_apy", self.senior_apy.as_deref(), to_apy_units)?,
            junior_apy: optional_decimal(name, "junior_apy", self.junior_apy.as_deref(), to_apy_units)?,
            verify_wiring: self.verify_wiring,
            guard_apy_writes: self.guard_apy_writes,
            deploy_vault_data: self.deploy_vault_data,
        };
        params.validate().map_err(|e| match e {
            OrchestratorError::Config(reason) => OrchestratorError::Config(format!("networks.{name}: {reason}")),
            other => other,
        })?;

        let mut profile = NetworkProfile::new(name);
        let a = &self.addresses;
        for (kind, field, value) in [
            (ComponentKind::InvestmentAsset, "addresses.asset", &a.asset),
            (ComponentKind::SeniorToken, "addresses.senior_token", &a.senior_token),
            (ComponentKind::JuniorToken, "addresses.junior_token", &a.junior_token),
            (ComponentKind::ProtocolToken, "addresses.protocol_token", &a.protocol_token),
            (ComponentKind::Vault, "addresses.vault", &a.vault),
            (ComponentKind::VaultData, "addresses.vault_data", &a.vault_data),
        ] {
            let address = known(name, field, value)?;
            if address.is_known() {
                profile.addresses.insert(kind, address);
            }
        }

        for (i, pool) in self.reward_pools.iter().enumerate() {
            let field = format!("reward_pools[{i}]");
            if pool.pair_id.trim().is_empty() {
                return Err(OrchestratorError::Config(format!(
                    "networks.{name}.{field}.pair_id is empty"
                )));
            }
            let pair_address: Address = known(name, &format!("{field}.pair_address"), &pool.pair_address)?
                .address()
                .ok_or_else(|| {
                    OrchestratorError::Config(format!("networks.{name}.{field}.pair_address is required"))
                })?;
            profile.reward_pools.push(RewardPoolSpec {
                pair: PairId(pool.pair_id.trim().to_string()),
                pair_address,
                address: known(name, &format!("{field}.address"), &pool.address)?,
                artifact: pool.artifact.clone(),
                reward_amount: optional_decimal(
                    name,
                    &format!("{field}.reward_amount"),
                    pool.reward_amount.as_deref(),
                    to_fixed_point,
                )?,
            });
        }

        profile.params = params;
        Ok(profile)
    }
}

impl DtrancheConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `./dtranche.toml` is used
    /// if present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: DtrancheConfig =
            toml::from_str(&content).with_context(|| format!("parsing {}", config_path.display()))?;
        Ok(config)
    }

    /// Settings of `network`.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Config`] if the network is not configured
    pub fn network(&self, network: &str) -> Result<&NetworkConfig, OrchestratorError> {
        self.networks
            .get(network)
            .ok_or_else(|| OrchestratorError::Config(format!("unknown network {network:?}")))
    }

    /// Validate every network into profiles.
    pub fn profiles(&self) -> Result<Vec<NetworkProfile>, OrchestratorError> {
        self.networks
            .iter()
            .map(|(name, network)| network.to_profile(name))
            .collect()
    }
}

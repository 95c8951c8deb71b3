//! Per-network address resolution.
//!
//! A [`NetworkProfile`] holds what the operator configured for one network:
//! known component addresses and the static parameters used when deploying
//! and configuring. Resolution never invents an address; a component nobody
//! has recorded is [`KnownAddress::Absent`].

use std::collections::BTreeMap;

use dtranche_types::{Address, Amount, ComponentKind, KnownAddress, PairId};

use crate::store::DeploymentRecord;
use crate::{OrchestratorError, Result};

/// 10^18, one whole token in fixed-point.
const WAD: u64 = 1_000_000_000_000_000_000;

/// Static deployment and configuration parameters of a network.
///
/// Values are already converted: token amounts are 10^18 fixed-point and
/// APYs are 10^6 units, so a bad decimal is rejected while building the
/// profile rather than part way through a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticParams {
    /// Senior token supply rate, fixed-point (`1.1` = `1.1e18`).
    pub senior_supply_rate: Amount,
    /// Vault period length in seconds.
    pub lock_period_secs: u64,
    /// Delay between deployment and the vault's start time.
    pub start_delay_secs: u64,
    /// Protocol token supply minted to the operator at deployment.
    pub protocol_initial_supply: Amount,
    /// Faucet amount minted to the operator after deploying the asset.
    pub faucet_mint: Option<Amount>,
    /// Senior tranche APY in 10^6 units.
    pub senior_apy: Option<u64>,
    /// Junior tranche APY in 10^6 units.
    pub junior_apy: Option<u64>,
    /// Re-read every edge after establishing it.
    pub verify_wiring: bool,
    /// Skip APY writes when the vault already holds the target value.
    pub guard_apy_writes: bool,
    /// Deploy the auxiliary vault data contract.
    pub deploy_vault_data: bool,
}

impl StaticParams {
    /// Check the values a deployment cannot proceed without.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Config`] for a zero supply rate (the vault
    ///   would never activate) or a zero period length
    pub fn validate(&self) -> Result<()> {
        if self.senior_supply_rate.is_zero() {
            return Err(OrchestratorError::Config(
                "senior supply rate must be nonzero to activate the vault".to_string(),
            ));
        }
        if self.lock_period_secs == 0 {
            return Err(OrchestratorError::Config("lock period must be nonzero".to_string()));
        }
        Ok(())
    }
}

impl Default for StaticParams {
    fn default() -> Self {
        Self {
            senior_supply_rate: Amount::from(11 * WAD / 10),
            lock_period_secs: 300,
            start_delay_secs: 60,
            protocol_initial_supply: Amount::from(1_000_000u64) * Amount::from(WAD),
            faucet_mint: None,
            senior_apy: None,
            junior_apy: None,
            verify_wiring: true,
            guard_apy_writes: true,
            deploy_vault_data: false,
        }
    }
}

/// A liquidity reward pool to deploy for one pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardPoolSpec {
    /// Pair identifier.
    pub pair: PairId,
    /// Address of the staked LP pair token.
    pub pair_address: Address,
    /// Pool address, if already deployed.
    pub address: KnownAddress,
    /// Contract name override for the pool's build artifact.
    pub artifact: Option<String>,
    /// Reward amount to notify once the pool is wired, fixed-point.
    pub reward_amount: Option<Amount>,
}

impl RewardPoolSpec {
    /// Component kind of this pool.
    pub fn kind(&self) -> ComponentKind {
        ComponentKind::RewardPool(self.pair.clone())
    }
}

/// Everything configured for one network.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkProfile {
    /// Network name.
    pub name: String,
    /// Configured addresses. Kinds not present are absent.
    pub addresses: BTreeMap<ComponentKind, KnownAddress>,
    /// Static parameters.
    pub params: StaticParams,
    /// Reward pools, in configuration order.
    pub reward_pools: Vec<RewardPoolSpec>,
}

impl NetworkProfile {
    /// Empty profile with default parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set a configured address.
    pub fn with_address(mut self, kind: ComponentKind, address: Address) -> Self {
        self.addresses.insert(kind, KnownAddress::Known(address));
        self
    }

    /// Reward pool configured for `pair`.
    pub fn reward_pool(&self, pair: &PairId) -> Option<&RewardPoolSpec> {
        self.reward_pools.iter().find(|pool| &pool.pair == pair)
    }

    /// Configured address of `kind`.
    pub fn configured(&self, kind: &ComponentKind) -> KnownAddress {
        match kind {
            ComponentKind::RewardPool(pair) => self
                .reward_pool(pair)
                .map(|pool| pool.address)
                .unwrap_or(KnownAddress::Absent),
            other => self
                .addresses
                .get(other)
                .copied()
                .unwrap_or(KnownAddress::Absent),
        }
    }
}

/// Network profiles by name.
#[derive(Clone, Debug, Default)]
pub struct AddressBook {
    networks: BTreeMap<String, NetworkProfile>,
}

impl AddressBook {
    /// Build from a set of profiles. A later profile with the same name replaces an earlier one.
    pub fn new(profiles: impl IntoIterator<Item = NetworkProfile>) -> Self {
        Self {
            networks: profiles
                .into_iter()
                .map(|profile| (profile.name.clone(), profile))
                .collect(),
        }
    }

    /// Names of all configured networks.
    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }

    /// Profile for `network`.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Config`] if the network is not configured
    pub fn profile(&self, network: &str) -> Result<&NetworkProfile> {
        self.networks.get(network).ok_or_else(|| {
            let known: Vec<&str> = self.networks().collect();
            OrchestratorError::Config(format!(
                "unknown network {network:?} (configured: {})",
                known.join(", ")
            ))
        })
    }

    /// Configured address of `kind` on `network`.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Config`] if the network is not configured
    pub fn resolve(&self, network: &str, kind: &ComponentKind) -> Result<KnownAddress> {
        Ok(self.profile(network)?.configured(kind))
    }

    /// Address of `kind` from configuration, falling back to the deployment record.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Config`] if the network is not configured
    pub fn resolve_with_record(
        &self,
        network: &str,
        kind: &ComponentKind,
        record: &DeploymentRecord,
    ) -> Result<KnownAddress> {
        match self.resolve(network, kind)? {
            KnownAddress::Known(address) => {
                if let Some(recorded) = record.addresses.get(kind) {
                    if *recorded != address {
                        tracing::warn!(
                            kind = %kind,
                            configured = %address,
                            recorded = %recorded,
                            "configured address overrides recorded deployment"
                        );
                    }
                }
                Ok(KnownAddress::Known(address))
            }
            KnownAddress::Absent => Ok(record.addresses.get(kind).copied().into()),
        }
    }
}

//! Protocol components and capability-typed contract handles.
//!
//! Every deployable part of the protocol is a [`ComponentKind`]. A kind fixes
//! two things: the ordered constructor inputs it needs (which is where the
//! deployment dependency graph comes from) and the set of [`Capability`]s a
//! deployed instance exposes.
//!
//! | Kind | Constructor inputs |
//! |------|--------------------|
//! | `asset` | none |
//! | `senior_token` | asset |
//! | `junior_token` | asset |
//! | `protocol_token` | recipient, initial supply |
//! | `vault` | start time, period length, senior, junior, protocol, asset |
//! | `vault_data` | vault |
//! | `reward_pool:<pair>` | pair address, protocol |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::{Result, TypesError};

/// Identifier of a liquidity pair served by a reward pool (e.g. `st-skyrim`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairId(pub String);

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A deployable protocol component.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComponentKind {
    /// Mintable faucet token the vault invests (BUSD on test networks).
    InvestmentAsset,
    /// Senior tranche token.
    SeniorToken,
    /// Junior tranche token.
    JuniorToken,
    /// Protocol reward token.
    ProtocolToken,
    /// Time-boxed investment vault.
    Vault,
    /// Auxiliary data contract bound to the vault.
    VaultData,
    /// Liquidity reward pool for one trading pair.
    RewardPool(PairId),
}

/// Scalar constructor parameters supplied by the operator, not by another component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scalar {
    /// Account receiving the initial supply.
    Recipient,
    /// Initial token supply (fixed-point).
    InitialSupply,
    /// Vault start timestamp.
    StartTime,
    /// Vault period length in seconds.
    PeriodLength,
}

/// One positional constructor argument of a component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstructorInput {
    /// Address of another protocol component.
    Component(ComponentKind),
    /// Address of the external trading pair (reward pools only).
    PairAddress,
    /// Operator-supplied scalar.
    Scalar(Scalar),
}

/// An operation family exposed by a deployed component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `mint(to, amount)` on the faucet asset.
    Faucet,
    /// `balanceOf(account)`.
    Balance,
    /// `isVault(addr)` / `setVault(addr)` on tranche tokens.
    VaultRegistry,
    /// `isMinter(addr)` / `addMinter(addr)` on the protocol token.
    MinterRegistry,
    /// `getCurrentSTSupplyRate()` / `setSeniorTokenSupplyRate(rate)`.
    SupplyRate,
    /// `getAPY(tranche)` / `setAPY(tranche, units)`.
    Apy,
    /// `getCurrentPeriod()` / `startTime()`.
    PeriodClock,
    /// `settleProfitsByOwner(profits, losses)`.
    Settlement,
    /// `investByOwner(allocation)`.
    Investment,
    /// `setRewardDistributionManager(addr)` / `notifyRewardAmount(amount)`.
    RewardDistribution,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Faucet => "faucet",
            Self::Balance => "balance",
            Self::VaultRegistry => "vault-registry",
            Self::MinterRegistry => "minter-registry",
            Self::SupplyRate => "supply-rate",
            Self::Apy => "apy",
            Self::PeriodClock => "period-clock",
            Self::Settlement => "settlement",
            Self::Investment => "investment",
            Self::RewardDistribution => "reward-distribution",
        };
        f.write_str(name)
    }
}

const ASSET_CAPS: &[Capability] = &[Capability::Faucet, Capability::Balance];
const TRANCHE_CAPS: &[Capability] = &[Capability::VaultRegistry, Capability::Balance];
const PROTOCOL_CAPS: &[Capability] = &[Capability::MinterRegistry, Capability::Balance];
const VAULT_CAPS: &[Capability] = &[
    Capability::SupplyRate,
    Capability::Apy,
    Capability::PeriodClock,
    Capability::Settlement,
    Capability::Investment,
];
const REWARD_POOL_CAPS: &[Capability] = &[Capability::RewardDistribution];

impl ComponentKind {
    /// Ordered constructor inputs of this kind.
    pub fn constructor_inputs(&self) -> Vec<ConstructorInput> {
        use ConstructorInput::{Component, PairAddress};
        match self {
            Self::InvestmentAsset => vec![],
            Self::SeniorToken | Self::JuniorToken => vec![Component(Self::InvestmentAsset)],
            Self::ProtocolToken => vec![
                ConstructorInput::Scalar(Scalar::Recipient),
                ConstructorInput::Scalar(Scalar::InitialSupply),
            ],
            Self::Vault => vec![
                ConstructorInput::Scalar(Scalar::StartTime),
                ConstructorInput::Scalar(Scalar::PeriodLength),
                Component(Self::SeniorToken),
                Component(Self::JuniorToken),
                Component(Self::ProtocolToken),
                Component(Self::InvestmentAsset),
            ],
            Self::VaultData => vec![Component(Self::Vault)],
            Self::RewardPool(_) => vec![PairAddress, Component(Self::ProtocolToken)],
        }
    }

    /// Component kinds this kind must be deployed after.
    pub fn dependencies(&self) -> Vec<ComponentKind> {
        self.constructor_inputs()
            .into_iter()
            .filter_map(|input| match input {
                ConstructorInput::Component(kind) => Some(kind),
                _ => None,
            })
            .collect()
    }

    /// Capabilities exposed by a deployed instance of this kind.
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Self::InvestmentAsset => ASSET_CAPS,
            Self::SeniorToken | Self::JuniorToken => TRANCHE_CAPS,
            Self::ProtocolToken => PROTOCOL_CAPS,
            Self::Vault => VAULT_CAPS,
            Self::VaultData => &[],
            Self::RewardPool(_) => REWARD_POOL_CAPS,
        }
    }

    /// Default build-artifact (contract) name used to deploy this kind.
    pub fn default_artifact(&self) -> &'static str {
        match self {
            Self::InvestmentAsset => "BUSD",
            Self::SeniorToken => "SeniorToken",
            Self::JuniorToken => "JuniorToken",
            Self::ProtocolToken => "SkyrimToken",
            Self::Vault => "SkyrimInvestVaultAdmin",
            Self::VaultData => "dTrancheData",
            Self::RewardPool(_) => "LPTokenStakeRewardPool",
        }
    }

    /// The core protocol kinds, without optional auxiliaries.
    pub fn core() -> Vec<ComponentKind> {
        vec![
            Self::InvestmentAsset,
            Self::SeniorToken,
            Self::JuniorToken,
            Self::ProtocolToken,
            Self::Vault,
        ]
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvestmentAsset => f.write_str("asset"),
            Self::SeniorToken => f.write_str("senior_token"),
            Self::JuniorToken => f.write_str("junior_token"),
            Self::ProtocolToken => f.write_str("protocol_token"),
            Self::Vault => f.write_str("vault"),
            Self::VaultData => f.write_str("vault_data"),
            Self::RewardPool(pair) => write!(f, "reward_pool:{pair}"),
        }
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "asset" => Ok(Self::InvestmentAsset),
            "senior_token" => Ok(Self::SeniorToken),
            "junior_token" => Ok(Self::JuniorToken),
            "protocol_token" => Ok(Self::ProtocolToken),
            "vault" => Ok(Self::Vault),
            "vault_data" => Ok(Self::VaultData),
            other => match other.strip_prefix("reward_pool:") {
                Some(pair) if !pair.is_empty() => Ok(Self::RewardPool(PairId(pair.to_string()))),
                _ => Err(format!("unknown component kind: {other}")),
            },
        }
    }
}

impl TryFrom<String> for ComponentKind {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentKind> for String {
    fn from(value: ComponentKind) -> Self {
        value.to_string()
    }
}

/// A reference to a deployed component.
///
/// Handles are immutable. Stages share them by reference; a redeployment
/// produces a new handle rather than changing an existing one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractHandle {
    kind: ComponentKind,
    address: Address,
    capabilities: &'static [Capability],
}

impl ContractHandle {
    /// Create a handle over `address` with the capabilities of `kind`.
    pub fn new(kind: ComponentKind, address: Address) -> Self {
        let capabilities = kind.capabilities();
        Self {
            kind,
            address,
            capabilities,
        }
    }

    /// The component kind.
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// The on-chain address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The capability set.
    pub fn capabilities(&self) -> &'static [Capability] {
        self.capabilities
    }

    /// Whether the handle exposes `capability`.
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Check that the handle exposes `capability`.
    ///
    /// # Errors
    ///
    /// - [`TypesError::MissingCapability`] if it does not
    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(TypesError::MissingCapability {
                kind: self.kind.clone(),
                address: self.address,
                capability,
            })
        }
    }
}

impl fmt::Display for ContractHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind, self.address)
    }
}

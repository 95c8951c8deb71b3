//! In-process simulated chain.
//!
//! `MemoryLedger` models just enough contract behaviour to rehearse a full
//! deployment and settlement cycle without a node:
//!
//! - tranche tokens keep a vault registry, the protocol token a minter set
//! - the vault derives its period from the simulated clock, rejects a second
//!   settlement in the same period and rejects investment before settlement
//! - every confirmed transaction is appended to a log that tests inspect
//!
//! Faults can be injected per method name: a failing method reverts, an
//! ignored method confirms without changing state.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use dtranche_types::{
    Address, Allocation, Amount, Capability, ComponentKind, ConstructorInput, ContractHandle,
    Scalar, SettlementBatch, Timestamp, Tranche, TRANCHE_COUNT, U256,
};

use crate::{ConstructorArg, DeployRequest, Ledger, LedgerError, Receipt, Result};

/// Default simulated start time (2023-11-14T22:13:20Z).
pub const GENESIS_TIME: Timestamp = 1_700_000_000;

/// A confirmed transaction on the simulated chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxRecord {
    /// Position in the log, starting at 0.
    pub seq: u64,
    /// Contract method, or `deploy`.
    pub call: &'static str,
    /// Target contract (the new contract for deployments).
    pub target: Address,
    /// Kind created, for deployments.
    pub deployed: Option<ComponentKind>,
    /// Simulated time of inclusion.
    pub timestamp: Timestamp,
}

#[derive(Debug)]
struct SimVault {
    start_time: Timestamp,
    period_length: u64,
    supply_rate: Amount,
    apy: [u64; TRANCHE_COUNT],
    settled: BTreeSet<u64>,
    invested: [Amount; TRANCHE_COUNT],
}

impl SimVault {
    fn period_at(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.start_time) / self.period_length
    }
}

#[derive(Debug)]
enum SimContract {
    Asset {
        balances: HashMap<Address, Amount>,
    },
    Tranche {
        vaults: HashSet<Address>,
    },
    Protocol {
        minters: HashSet<Address>,
        balances: HashMap<Address, Amount>,
    },
    Vault(SimVault),
    VaultData,
    RewardPool {
        manager: Option<Address>,
        notified: Amount,
    },
}

#[derive(Debug, Default)]
struct Faults {
    failing: HashSet<&'static str>,
    ignored: HashSet<&'static str>,
    failing_deploys: HashSet<ComponentKind>,
}

#[derive(Debug)]
struct ChainState {
    now: Timestamp,
    block: u64,
    next_contract: u64,
    contracts: HashMap<Address, SimContract>,
    log: Vec<TxRecord>,
    faults: Faults,
}

impl ChainState {
    fn check_fault(&self, call: &'static str) -> Result<()> {
        if self.faults.failing.contains(call) {
            return Err(LedgerError::Reverted {
                call: call.to_string(),
                reason: "injected fault".to_string(),
            });
        }
        Ok(())
    }

    fn ignores(&self, call: &'static str) -> bool {
        self.faults.ignored.contains(call)
    }

    fn confirm(&mut self, call: &'static str, target: Address, deployed: Option<ComponentKind>) -> Receipt {
        let seq = self.log.len() as u64;
        self.block += 1;
        self.log.push(TxRecord {
            seq,
            call,
            target,
            deployed,
            timestamp: self.now,
        });
        let mut tx_hash = [0u8; 32];
        tx_hash[24..].copy_from_slice(&seq.to_be_bytes());
        Receipt {
            tx_hash,
            block_number: Some(self.block),
        }
    }

    fn contract(&self, address: Address) -> Result<&SimContract> {
        self.contracts
            .get(&address)
            .ok_or(LedgerError::NoContract(address))
    }

    fn contract_mut(&mut self, address: Address) -> Result<&mut SimContract> {
        self.contracts
            .get_mut(&address)
            .ok_or(LedgerError::NoContract(address))
    }

    fn vault(&self, address: Address) -> Result<&SimVault> {
        match self.contract(address)? {
            SimContract::Vault(vault) => Ok(vault),
            _ => Err(LedgerError::NoContract(address)),
        }
    }

    fn vault_mut(&mut self, address: Address) -> Result<&mut SimVault> {
        match self.contract_mut(address)? {
            SimContract::Vault(vault) => Ok(vault),
            _ => Err(LedgerError::NoContract(address)),
        }
    }
}

/// Simulated ledger with a controllable clock and a transaction log.
#[derive(Debug)]
pub struct MemoryLedger {
    operator: Address,
    state: Mutex<ChainState>,
}

impl MemoryLedger {
    /// Create an empty chain at [`GENESIS_TIME`] operated by `operator`.
    pub fn new(operator: Address) -> Self {
        Self::with_time(operator, GENESIS_TIME)
    }

    /// Create an empty chain at the given time.
    pub fn with_time(operator: Address, now: Timestamp) -> Self {
        Self {
            operator,
            state: Mutex::new(ChainState {
                now,
                block: 0,
                next_contract: 1,
                contracts: HashMap::new(),
                log: Vec::new(),
                faults: Faults::default(),
            }),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, ChainState>> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Transport("simulated chain state poisoned".to_string()))
    }

    /// Current simulated time.
    pub fn now(&self) -> Timestamp {
        self.state().map(|s| s.now).unwrap_or_default()
    }

    /// Set the simulated time. Time never moves backwards.
    pub fn set_time(&self, now: Timestamp) {
        if let Ok(mut state) = self.state() {
            state.now = state.now.max(now);
        }
    }

    /// Advance the simulated time.
    pub fn advance(&self, secs: u64) {
        if let Ok(mut state) = self.state() {
            state.now = state.now.saturating_add(secs);
        }
    }

    /// Make every call to `method` revert until faults are cleared.
    pub fn fail_call(&self, method: &'static str) {
        if let Ok(mut state) = self.state() {
            state.faults.failing.insert(method);
        }
    }

    /// Make deployments of `kind` revert until faults are cleared.
    pub fn fail_deploy(&self, kind: ComponentKind) {
        if let Ok(mut state) = self.state() {
            state.faults.failing_deploys.insert(kind);
        }
    }

    /// Make every call to `method` confirm without changing state.
    pub fn ignore_call(&self, method: &'static str) {
        if let Ok(mut state) = self.state() {
            state.faults.ignored.insert(method);
        }
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        if let Ok(mut state) = self.state() {
            state.faults = Faults::default();
        }
    }

    /// All confirmed transactions in order.
    pub fn transactions(&self) -> Vec<TxRecord> {
        self.state().map(|s| s.log.clone()).unwrap_or_default()
    }

    /// Forget logged transactions. Chain state is kept.
    pub fn clear_log(&self) {
        if let Ok(mut state) = self.state() {
            state.log.clear();
        }
    }

    /// Kinds deployed so far, in deployment order.
    pub fn deployments(&self) -> Vec<ComponentKind> {
        self.transactions()
            .into_iter()
            .filter_map(|tx| tx.deployed)
            .collect()
    }

    /// Number of confirmed calls to `method`.
    pub fn count_calls(&self, method: &str) -> usize {
        self.transactions()
            .iter()
            .filter(|tx| tx.call == method)
            .count()
    }

    /// Amount notified to a reward pool so far.
    pub fn notified_rewards(&self, pool: Address) -> Option<Amount> {
        let state = self.state().ok()?;
        match state.contracts.get(&pool)? {
            SimContract::RewardPool { notified, .. } => Some(*notified),
            _ => None,
        }
    }

    /// Capital invested into each tranche of a vault so far.
    pub fn invested(&self, vault: Address) -> Option<[Amount; TRANCHE_COUNT]> {
        let state = self.state().ok()?;
        state.vault(vault).ok().map(|v| v.invested)
    }
}

fn expect_address(kind: &ComponentKind, arg: Option<&ConstructorArg>) -> Result<Address> {
    match arg {
        Some(ConstructorArg::Address(address)) => Ok(*address),
        _ => Err(LedgerError::Reverted {
            call: "deploy".to_string(),
            reason: format!("{kind}: expected address argument"),
        }),
    }
}

fn expect_uint(kind: &ComponentKind, arg: Option<&ConstructorArg>) -> Result<U256> {
    match arg {
        Some(ConstructorArg::Uint(value)) => Ok(*value),
        _ => Err(LedgerError::Reverted {
            call: "deploy".to_string(),
            reason: format!("{kind}: expected uint argument"),
        }),
    }
}

/// Check the argument list against the kind's constructor shape and build the contract.
fn construct(request: &DeployRequest, operator: Address) -> Result<SimContract> {
    let kind = &request.kind;
    let inputs = kind.constructor_inputs();
    if inputs.len() != request.args.len() {
        return Err(LedgerError::Reverted {
            call: "deploy".to_string(),
            reason: format!(
                "{kind}: expected {} constructor arguments, got {}",
                inputs.len(),
                request.args.len()
            ),
        });
    }

    let mut start_time = 0;
    let mut period_length = 0;
    let mut recipient = operator;
    let mut initial_supply = Amount::ZERO;

    for (input, arg) in inputs.iter().zip(request.args.iter()) {
        match input {
            ConstructorInput::Component(_) | ConstructorInput::PairAddress => {
                let address = expect_address(kind, Some(arg))?;
                if address.is_zero() {
                    return Err(LedgerError::Reverted {
                        call: "deploy".to_string(),
                        reason: format!("{kind}: zero address argument"),
                    });
                }
            }
            ConstructorInput::Scalar(Scalar::Recipient) => {
                recipient = expect_address(kind, Some(arg))?;
            }
            ConstructorInput::Scalar(Scalar::InitialSupply) => {
                initial_supply = expect_uint(kind, Some(arg))?;
            }
            ConstructorInput::Scalar(Scalar::StartTime) => {
                start_time = u64::try_from(expect_uint(kind, Some(arg))?).map_err(|_| {
                    LedgerError::Reverted {
                        call: "deploy".to_string(),
                        reason: "start time out of range".to_string(),
                    }
                })?;
            }
            ConstructorInput::Scalar(Scalar::PeriodLength) => {
                period_length = u64::try_from(expect_uint(kind, Some(arg))?).unwrap_or(0);
            }
        }
    }

    let contract = match kind {
        ComponentKind::InvestmentAsset => SimContract::Asset {
            balances: HashMap::new(),
        },
        ComponentKind::SeniorToken | ComponentKind::JuniorToken => SimContract::Tranche {
            vaults: HashSet::new(),
        },
        ComponentKind::ProtocolToken => {
            let mut balances = HashMap::new();
            balances.insert(recipient, initial_supply);
            SimContract::Protocol {
                minters: HashSet::from([operator]),
                balances,
            }
        }
        ComponentKind::Vault => {
            if period_length == 0 {
                return Err(LedgerError::Reverted {
                    call: "deploy".to_string(),
                    reason: "vault: zero period length".to_string(),
                });
            }
            SimContract::Vault(SimVault {
                start_time,
                period_length,
                supply_rate: Amount::ZERO,
                apy: [0; TRANCHE_COUNT],
                settled: BTreeSet::new(),
                invested: [Amount::ZERO; TRANCHE_COUNT],
            })
        }
        ComponentKind::VaultData => SimContract::VaultData,
        ComponentKind::RewardPool(_) => SimContract::RewardPool {
            manager: None,
            notified: Amount::ZERO,
        },
    };
    Ok(contract)
}

impl Ledger for MemoryLedger {
    fn operator(&self) -> Address {
        self.operator
    }

    async fn deploy(&self, request: &DeployRequest) -> Result<Address> {
        let mut state = self.state()?;
        state.check_fault("deploy")?;
        if state.faults.failing_deploys.contains(&request.kind) {
            return Err(LedgerError::Reverted {
                call: "deploy".to_string(),
                reason: format!("{}: injected fault", request.kind),
            });
        }
        let contract = construct(request, self.operator)?;

        let mut bytes = [0u8; 20];
        bytes[0] = 0xc0;
        bytes[12..].copy_from_slice(&state.next_contract.to_be_bytes());
        let address = Address::new(bytes);
        state.next_contract += 1;
        state.contracts.insert(address, contract);
        state.confirm("deploy", address, Some(request.kind.clone()));

        tracing::debug!(kind = %request.kind, %address, "simulated deployment");
        Ok(address)
    }

    async fn mint(&self, asset: &ContractHandle, to: Address, amount: Amount) -> Result<Receipt> {
        asset.require(Capability::Faucet)?;
        let mut state = self.state()?;
        state.check_fault("mint")?;
        if !state.ignores("mint") {
            match state.contract_mut(asset.address())? {
                SimContract::Asset { balances } => {
                    let balance = balances.entry(to).or_default();
                    *balance = balance.saturating_add(amount);
                }
                _ => return Err(LedgerError::NoContract(asset.address())),
            }
        }
        Ok(state.confirm("mint", asset.address(), None))
    }

    async fn balance_of(&self, token: &ContractHandle, account: Address) -> Result<Amount> {
        token.require(Capability::Balance)?;
        let state = self.state()?;
        state.check_fault("balanceOf")?;
        match state.contract(token.address())? {
            SimContract::Asset { balances } | SimContract::Protocol { balances, .. } => {
                Ok(balances.get(&account).copied().unwrap_or_default())
            }
            SimContract::Tranche { .. } => Ok(Amount::ZERO),
            _ => Err(LedgerError::NoContract(token.address())),
        }
    }

    async fn is_vault(&self, token: &ContractHandle, vault: Address) -> Result<bool> {
        token.require(Capability::VaultRegistry)?;
        let state = self.state()?;
        state.check_fault("isVault")?;
        match state.contract(token.address())? {
            SimContract::Tranche { vaults } => Ok(vaults.contains(&vault)),
            _ => Err(LedgerError::NoContract(token.address())),
        }
    }

    async fn set_vault(&self, token: &ContractHandle, vault: Address) -> Result<Receipt> {
        token.require(Capability::VaultRegistry)?;
        let mut state = self.state()?;
        state.check_fault("setVault")?;
        if !state.ignores("setVault") {
            match state.contract_mut(token.address())? {
                SimContract::Tranche { vaults } => {
                    vaults.insert(vault);
                }
                _ => return Err(LedgerError::NoContract(token.address())),
            }
        }
        Ok(state.confirm("setVault", token.address(), None))
    }

    async fn is_minter(&self, token: &ContractHandle, account: Address) -> Result<bool> {
        token.require(Capability::MinterRegistry)?;
        let state = self.state()?;
        state.check_fault("isMinter")?;
        match state.contract(token.address())? {
            SimContract::Protocol { minters, .. } => Ok(minters.contains(&account)),
            _ => Err(LedgerError::NoContract(token.address())),
        }
    }

    async fn add_minter(&self, token: &ContractHandle, account: Address) -> Result<Receipt> {
        token.require(Capability::MinterRegistry)?;
        let mut state = self.state()?;
        state.check_fault("addMinter")?;
        if !state.ignores("addMinter") {
            match state.contract_mut(token.address())? {
                SimContract::Protocol { minters, .. } => {
                    minters.insert(account);
                }
                _ => return Err(LedgerError::NoContract(token.address())),
            }
        }
        Ok(state.confirm("addMinter", token.address(), None))
    }

    async fn senior_supply_rate(&self, vault: &ContractHandle) -> Result<Amount> {
        vault.require(Capability::SupplyRate)?;
        let state = self.state()?;
        state.check_fault("getCurrentSTSupplyRate")?;
        Ok(state.vault(vault.address())?.supply_rate)
    }

    async fn set_senior_supply_rate(&self, vault: &ContractHandle, rate: Amount) -> Result<Receipt> {
        vault.require(Capability::SupplyRate)?;
        let mut state = self.state()?;
        state.check_fault("setSeniorTokenSupplyRate")?;
        if !state.ignores("setSeniorTokenSupplyRate") {
            state.vault_mut(vault.address())?.supply_rate = rate;
        }
        Ok(state.confirm("setSeniorTokenSupplyRate", vault.address(), None))
    }

    async fn apy(&self, vault: &ContractHandle, tranche: Tranche) -> Result<u64> {
        vault.require(Capability::Apy)?;
        let state = self.state()?;
        state.check_fault("getAPY")?;
        Ok(state.vault(vault.address())?.apy[tranche.index()])
    }

    async fn set_apy(&self, vault: &ContractHandle, tranche: Tranche, units: u64) -> Result<Receipt> {
        vault.require(Capability::Apy)?;
        let mut state = self.state()?;
        state.check_fault("setAPY")?;
        if !state.ignores("setAPY") {
            state.vault_mut(vault.address())?.apy[tranche.index()] = units;
        }
        Ok(state.confirm("setAPY", vault.address(), None))
    }

    async fn current_period(&self, vault: &ContractHandle) -> Result<u64> {
        vault.require(Capability::PeriodClock)?;
        let state = self.state()?;
        state.check_fault("getCurrentPeriod")?;
        let now = state.now;
        Ok(state.vault(vault.address())?.period_at(now))
    }

    async fn start_time(&self, vault: &ContractHandle) -> Result<Timestamp> {
        vault.require(Capability::PeriodClock)?;
        let state = self.state()?;
        state.check_fault("startTime")?;
        Ok(state.vault(vault.address())?.start_time)
    }

    async fn settle_profits_by_owner(
        &self,
        vault: &ContractHandle,
        batch: &SettlementBatch,
    ) -> Result<Receipt> {
        vault.require(Capability::Settlement)?;
        let mut state = self.state()?;
        state.check_fault("settleProfitsByOwner")?;
        let now = state.now;
        let ignored = state.ignores("settleProfitsByOwner");
        let sim = state.vault_mut(vault.address())?;
        let period = sim.period_at(now);
        if sim.settled.contains(&period) {
            return Err(LedgerError::Reverted {
                call: "settleProfitsByOwner".to_string(),
                reason: format!("period {period} already settled"),
            });
        }
        if !ignored {
            sim.settled.insert(period);
        }
        tracing::debug!(
            period,
            profits = ?batch.profits,
            losses = ?batch.losses,
            "simulated settlement"
        );
        Ok(state.confirm("settleProfitsByOwner", vault.address(), None))
    }

    async fn invest_by_owner(
        &self,
        vault: &ContractHandle,
        allocation: &Allocation,
    ) -> Result<Receipt> {
        vault.require(Capability::Investment)?;
        let mut state = self.state()?;
        state.check_fault("investByOwner")?;
        let now = state.now;
        let ignored = state.ignores("investByOwner");
        let sim = state.vault_mut(vault.address())?;
        let period = sim.period_at(now);
        if !sim.settled.contains(&period) {
            return Err(LedgerError::Reverted {
                call: "investByOwner".to_string(),
                reason: format!("period {period} not settled"),
            });
        }
        if !ignored {
            for tranche in Tranche::ALL {
                let slot = &mut sim.invested[tranche.index()];
                *slot = slot.saturating_add(allocation.get(tranche));
            }
        }
        Ok(state.confirm("investByOwner", vault.address(), None))
    }

    async fn set_reward_distribution_manager(
        &self,
        pool: &ContractHandle,
        manager: Address,
    ) -> Result<Receipt> {
        pool.require(Capability::RewardDistribution)?;
        let mut state = self.state()?;
        state.check_fault("setRewardDistributionManager")?;
        if !state.ignores("setRewardDistributionManager") {
            match state.contract_mut(pool.address())? {
                SimContract::RewardPool { manager: slot, .. } => *slot = Some(manager),
                _ => return Err(LedgerError::NoContract(pool.address())),
            }
        }
        Ok(state.confirm("setRewardDistributionManager", pool.address(), None))
    }

    async fn notify_reward_amount(&self, pool: &ContractHandle, amount: Amount) -> Result<Receipt> {
        pool.require(Capability::RewardDistribution)?;
        let operator = self.operator;
        let mut state = self.state()?;
        state.check_fault("notifyRewardAmount")?;
        match state.contract_mut(pool.address())? {
            SimContract::RewardPool { manager, notified } => {
                if *manager != Some(operator) {
                    return Err(LedgerError::Reverted {
                        call: "notifyRewardAmount".to_string(),
                        reason: "caller is not reward distribution manager".to_string(),
                    });
                }
                *notified = notified.saturating_add(amount);
            }
            _ => return Err(LedgerError::NoContract(pool.address())),
        }
        Ok(state.confirm("notifyRewardAmount", pool.address(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtranche_types::PairId;

    const OPERATOR: Address = Address::repeat_byte(0xaa);
    const PERIOD: u64 = 300;

    async fn deploy(ledger: &MemoryLedger, kind: ComponentKind, args: Vec<ConstructorArg>) -> ContractHandle {
        let request = DeployRequest {
            kind: kind.clone(),
            args,
        };
        let address = ledger.deploy(&request).await.expect("deploy");
        ContractHandle::new(kind, address)
    }

    async fn deploy_vault(ledger: &MemoryLedger, start: Timestamp) -> ContractHandle {
        let filler = ConstructorArg::Address(Address::repeat_byte(0x01));
        deploy(
            ledger,
            ComponentKind::Vault,
            vec![
                ConstructorArg::Uint(U256::from(start)),
                ConstructorArg::Uint(U256::from(PERIOD)),
                filler,
                filler,
                filler,
                filler,
            ],
        )
        .await
    }

    #[tokio::test]
    async fn test_deploy_logs_and_assigns_distinct_addresses() {
        let ledger = MemoryLedger::new(OPERATOR);
        let a = deploy(&ledger, ComponentKind::InvestmentAsset, vec![]).await;
        let b = deploy(&ledger, ComponentKind::InvestmentAsset, vec![]).await;
        assert_ne!(a.address(), b.address());
        assert_eq!(
            ledger.deployments(),
            vec![ComponentKind::InvestmentAsset, ComponentKind::InvestmentAsset]
        );
    }

    #[tokio::test]
    async fn test_deploy_rejects_wrong_arity() {
        let ledger = MemoryLedger::new(OPERATOR);
        let request = DeployRequest {
            kind: ComponentKind::SeniorToken,
            args: vec![],
        };
        let err = ledger.deploy(&request).await.expect_err("missing asset arg");
        assert!(matches!(err, LedgerError::Reverted { .. }));
        assert!(ledger.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_vault_registry() {
        let ledger = MemoryLedger::new(OPERATOR);
        let asset = ConstructorArg::Address(Address::repeat_byte(0x02));
        let senior = deploy(&ledger, ComponentKind::SeniorToken, vec![asset]).await;
        let vault = Address::repeat_byte(0x03);

        assert!(!ledger.is_vault(&senior, vault).await.expect("read"));
        ledger.set_vault(&senior, vault).await.expect("write");
        assert!(ledger.is_vault(&senior, vault).await.expect("read"));
        assert_eq!(ledger.count_calls("setVault"), 1);
    }

    #[tokio::test]
    async fn test_capability_enforced() {
        let ledger = MemoryLedger::new(OPERATOR);
        let asset = deploy(&ledger, ComponentKind::InvestmentAsset, vec![]).await;
        let err = ledger
            .is_vault(&asset, Address::repeat_byte(0x03))
            .await
            .expect_err("asset has no vault registry");
        assert!(matches!(err, LedgerError::Capability(_)));
    }

    #[tokio::test]
    async fn test_period_follows_clock() {
        let ledger = MemoryLedger::new(OPERATOR);
        let vault = deploy_vault(&ledger, GENESIS_TIME + 60).await;

        assert_eq!(ledger.current_period(&vault).await.expect("period"), 0);
        ledger.advance(60 + PERIOD);
        assert_eq!(ledger.current_period(&vault).await.expect("period"), 1);
        ledger.advance(PERIOD * 2);
        assert_eq!(ledger.current_period(&vault).await.expect("period"), 3);
    }

    #[tokio::test]
    async fn test_second_settlement_in_period_reverts() {
        let ledger = MemoryLedger::new(OPERATOR);
        let vault = deploy_vault(&ledger, GENESIS_TIME).await;
        let batch = SettlementBatch::default();

        ledger.settle_profits_by_owner(&vault, &batch).await.expect("first");
        let err = ledger
            .settle_profits_by_owner(&vault, &batch)
            .await
            .expect_err("second in same period");
        assert!(matches!(err, LedgerError::Reverted { .. }));

        ledger.advance(PERIOD);
        ledger.settle_profits_by_owner(&vault, &batch).await.expect("next period");
    }

    #[tokio::test]
    async fn test_invest_requires_settlement() {
        let ledger = MemoryLedger::new(OPERATOR);
        let vault = deploy_vault(&ledger, GENESIS_TIME).await;
        let allocation = Allocation([Amount::ZERO, Amount::from(5)]);

        assert!(ledger.invest_by_owner(&vault, &allocation).await.is_err());
        ledger
            .settle_profits_by_owner(&vault, &SettlementBatch::default())
            .await
            .expect("settle");
        ledger.invest_by_owner(&vault, &allocation).await.expect("invest");
        assert_eq!(ledger.invested(vault.address()), Some([Amount::ZERO, Amount::from(5)]));
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let ledger = MemoryLedger::new(OPERATOR);
        let senior = deploy(
            &ledger,
            ComponentKind::SeniorToken,
            vec![ConstructorArg::Address(Address::repeat_byte(0x02))],
        )
        .await;
        let vault = Address::repeat_byte(0x03);

        ledger.ignore_call("setVault");
        ledger.set_vault(&senior, vault).await.expect("confirms");
        assert!(!ledger.is_vault(&senior, vault).await.expect("read"));

        ledger.clear_faults();
        ledger.fail_call("setVault");
        assert!(ledger.set_vault(&senior, vault).await.is_err());
        ledger.clear_faults();
        ledger.fail_deploy(ComponentKind::JuniorToken);
        let junior = DeployRequest {
            kind: ComponentKind::JuniorToken,
            args: vec![ConstructorArg::Address(Address::repeat_byte(0x02))],
        };
        let err = ledger.deploy(&junior).await.expect_err("junior reverts");
        assert!(matches!(err, LedgerError::Reverted { .. }));
        let other = DeployRequest {
            kind: ComponentKind::SeniorToken,
            args: junior.args.clone(),
        };
        ledger.deploy(&other).await.expect("other kinds deploy");
    }

    #[tokio::test]
    async fn test_reward_notification_requires_manager() {
        let ledger = MemoryLedger::new(OPERATOR);
        let pool = deploy(
            &ledger,
            ComponentKind::RewardPool(PairId("st-skyrim".to_string())),
            vec![
                ConstructorArg::Address(Address::repeat_byte(0x04)),
                ConstructorArg::Address(Address::repeat_byte(0x05)),
            ],
        )
        .await;

        assert!(ledger.notify_reward_amount(&pool, Amount::from(10)).await.is_err());
        ledger
            .set_reward_distribution_manager(&pool, OPERATOR)
            .await
            .expect("manager");
        ledger.notify_reward_amount(&pool, Amount::from(10)).await.expect("notify");
        assert_eq!(ledger.notified_rewards(pool.address()), Some(Amount::from(10)));
    }

    #[tokio::test]
    async fn test_clock_never_moves_backwards() {
        let ledger = MemoryLedger::new(OPERATOR);
        ledger.set_time(GENESIS_TIME - 10);
        assert_eq!(ledger.now(), GENESIS_TIME);
        ledger.set_time(GENESIS_TIME + 10);
        assert_eq!(ledger.now(), GENESIS_TIME + 10);
    }
}

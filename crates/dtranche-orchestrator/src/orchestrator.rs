//! Stage sequencing.
//!
//! [`Orchestrator`] binds a ledger, a clock, a network profile and a record
//! store, and runs the operator-facing operations on top of the lower-level
//! stages: `deploy`, `set_apy`, `settle`, `rewards` and `status`.

use std::collections::BTreeMap;
use std::fmt;

use dtranche_ledger::{Ledger, LedgerError, Receipt};
use dtranche_params::{from_apy_units, from_fixed_point};
use dtranche_types::{
    Address, Allocation, Amount, ComponentKind, ContractHandle, KnownAddress, PairId,
    PermissionEdge, SettlementBatch, Timestamp, Tranche,
};

use crate::address_book::{AddressBook, NetworkProfile};
use crate::context::DeploymentContext;
use crate::cycle::{self, Clock, ParamOutcome, SettlementOutcome};
use crate::materialize::{materialize, DeployParams, Materialized};
use crate::resolver::deployment_order;
use crate::store::RecordStore;
use crate::wiring::{edge_holds, reconcile_edge, EdgeOutcome};
use crate::{OrchestratorError, Result};

/// What a `deploy` or `rewards` run did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Components deployed in this run, in order.
    pub deployed: Vec<ContractHandle>,
    /// Components attached at known addresses.
    pub attached: Vec<ContractHandle>,
    /// Edges that had to be written.
    pub edges_established: Vec<PermissionEdge>,
    /// Edges that already held.
    pub edges_satisfied: Vec<PermissionEdge>,
    /// Whether the supply rate was written.
    pub supply_rate_set: bool,
    /// Tranches whose APY was written.
    pub apy_written: Vec<Tranche>,
    /// Whether the operator was funded from the asset faucet.
    pub faucet_funded: bool,
    /// Reward pools whose distribution was started.
    pub rewards_started: Vec<PairId>,
}

impl RunReport {
    /// Whether the run sent no transactions.
    pub fn is_noop(&self) -> bool {
        self.deployed.is_empty()
            && self.edges_established.is_empty()
            && !self.supply_rate_set
            && self.apy_written.is_empty()
            && !self.faucet_funded
            && self.rewards_started.is_empty()
    }

    fn record(&mut self, materialized: Materialized) {
        match materialized {
            Materialized::Attached(handle) => self.attached.push(handle),
            Materialized::Deployed(handle) => self.deployed.push(handle),
        }
    }

    fn record_edge(&mut self, edge: PermissionEdge, outcome: &EdgeOutcome) {
        match outcome {
            EdgeOutcome::AlreadySatisfied => self.edges_satisfied.push(edge),
            EdgeOutcome::Established(_) => self.edges_established.push(edge),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for handle in &self.deployed {
            writeln!(f, "  deployed  {:<28} {}", handle.kind().to_string(), handle.address())?;
        }
        for handle in &self.attached {
            writeln!(f, "  attached  {:<28} {}", handle.kind().to_string(), handle.address())?;
        }
        for edge in &self.edges_established {
            writeln!(f, "  wired     {edge}")?;
        }
        for edge in &self.edges_satisfied {
            writeln!(f, "  ok        {edge}")?;
        }
        if self.faucet_funded {
            writeln!(f, "  funded    operator from asset faucet")?;
        }
        if self.supply_rate_set {
            writeln!(f, "  set       senior supply rate")?;
        }
        for tranche in &self.apy_written {
            writeln!(f, "  set       {tranche} APY")?;
        }
        for pair in &self.rewards_started {
            writeln!(f, "  rewards   {pair}")?;
        }
        write!(
            f,
            "{} deployed, {} attached, {} edges wired",
            self.deployed.len(),
            self.attached.len(),
            self.edges_established.len()
        )
    }
}

/// Snapshot of a deployment as seen on the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusReport {
    /// Network name.
    pub network: String,
    /// Operator account.
    pub operator: Address,
    /// Resolved address of every component.
    pub components: Vec<(ComponentKind, KnownAddress)>,
    /// Vault start time.
    pub start_time: Option<Timestamp>,
    /// Vault's current period.
    pub current_period: Option<u64>,
    /// Senior supply rate (fixed-point).
    pub supply_rate: Option<Amount>,
    /// Tranche APYs in 10^6 units.
    pub apy: Option<[u64; 2]>,
    /// State of every edge whose endpoints are known.
    pub edges: Vec<(PermissionEdge, bool)>,
    /// Operator's investment asset balance.
    pub operator_asset_balance: Option<Amount>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "network   {}", self.network)?;
        writeln!(f, "operator  {}", self.operator)?;
        for (kind, address) in &self.components {
            match address {
                KnownAddress::Known(address) => writeln!(f, "  {:<28} {address}", kind.to_string())?,
                KnownAddress::Absent => writeln!(f, "  {:<28} (not deployed)", kind.to_string())?,
            }
        }
        if let Some(start) = self.start_time {
            writeln!(f, "start time      {start}")?;
        }
        if let Some(period) = self.current_period {
            writeln!(f, "current period  {period}")?;
        }
        if let Some(rate) = self.supply_rate {
            let state = if rate.is_zero() { " (inactive)" } else { "" };
            writeln!(f, "supply rate     {}{state}", from_fixed_point(rate))?;
        }
        if let Some([senior, junior]) = self.apy {
            writeln!(
                f,
                "APY             senior {} / junior {}",
                from_apy_units(senior),
                from_apy_units(junior)
            )?;
        }
        for (edge, holds) in &self.edges {
            writeln!(f, "  [{}] {edge}", if *holds { "x" } else { " " })?;
        }
        if let Some(balance) = self.operator_asset_balance {
            writeln!(f, "operator asset balance  {}", from_fixed_point(balance))?;
        }
        Ok(())
    }
}

/// Runs operations for one network.
pub struct Orchestrator<'a, L, C> {
    ledger: &'a L,
    clock: &'a C,
    book: &'a AddressBook,
    profile: &'a NetworkProfile,
    store: &'a dyn RecordStore,
}

impl<'a, L: Ledger, C: Clock> Orchestrator<'a, L, C> {
    /// Bind an orchestrator to `network`.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Config`] if the network is not in `book`
    pub fn new(
        ledger: &'a L,
        clock: &'a C,
        book: &'a AddressBook,
        network: &str,
        store: &'a dyn RecordStore,
    ) -> Result<Self> {
        let profile = book.profile(network)?;
        Ok(Self {
            ledger,
            clock,
            book,
            profile,
            store,
        })
    }

    fn network(&self) -> &str {
        &self.profile.name
    }

    fn deploy_params(&self) -> DeployParams {
        let params = &self.profile.params;
        DeployParams {
            start_time: self.clock.now().saturating_add(params.start_delay_secs),
            period_length: params.lock_period_secs,
            recipient: self.ledger.operator(),
            initial_supply: params.protocol_initial_supply,
            pair_addresses: self
                .profile
                .reward_pools
                .iter()
                .map(|pool| (pool.pair.clone(), pool.pair_address))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn resolve(&self, ctx: &DeploymentContext<'_>, kind: &ComponentKind) -> Result<KnownAddress> {
        self.book.resolve_with_record(self.network(), kind, ctx.record())
    }

    /// Attach kinds that must already exist.
    fn attach_existing(&self, ctx: &mut DeploymentContext<'_>, kinds: &[ComponentKind]) -> Result<()> {
        for kind in kinds {
            match self.resolve(ctx, kind)? {
                KnownAddress::Known(address) => {
                    ctx.attach(ContractHandle::new(kind.clone(), address));
                }
                KnownAddress::Absent => {
                    return Err(OrchestratorError::Config(format!(
                        "{kind} has no known address on {}; run deploy first",
                        self.network()
                    )));
                }
            }
        }
        Ok(())
    }

    fn handle<'c>(&self, ctx: &'c DeploymentContext<'_>, kind: &ComponentKind) -> Result<&'c ContractHandle> {
        ctx.handle(kind).ok_or_else(|| {
            OrchestratorError::Config(format!("{kind} is not resolved on {}", self.network()))
        })
    }

    /// Deploy or attach every core component, then wire and configure the vault.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Config`] before any transaction if the static
    ///   parameters cannot activate a vault
    ///
    /// Otherwise stops at the first failing step; see the stage functions for
    /// the variants.
    pub async fn deploy(&self) -> Result<RunReport> {
        let network = self.network();
        let params = &self.profile.params;
        params.validate()?;
        let mut ctx = DeploymentContext::load(network, self.store)?;
        let mut report = RunReport::default();

        tracing::info!(network, operator = %self.ledger.operator(), "stage: materialize");
        let mut kinds = ComponentKind::core();
        if params.deploy_vault_data || self.resolve(&ctx, &ComponentKind::VaultData)?.is_known() {
            kinds.push(ComponentKind::VaultData);
        }
        let deploy_params = self.deploy_params();
        for kind in deployment_order(&kinds)? {
            let known = self.resolve(&ctx, &kind)?;
            let materialized = materialize(self.ledger, &mut ctx, &kind, known, &deploy_params).await?;
            report.record(materialized);
        }
        tracing::info!(
            deployed = report.deployed.len(),
            attached = report.attached.len(),
            "stage complete: materialize"
        );

        report.faucet_funded = self.fund_faucet(&mut ctx).await?;

        tracing::info!(network, "stage: wiring");
        let vault = self.handle(&ctx, &ComponentKind::Vault)?.clone();
        for edge in PermissionEdge::vault_edges() {
            let object = self.handle(&ctx, &edge.object)?;
            let outcome = reconcile_edge(self.ledger, &edge, &vault, object, params.verify_wiring).await?;
            report.record_edge(edge, &outcome);
        }
        tracing::info!(
            established = report.edges_established.len(),
            satisfied = report.edges_satisfied.len(),
            "stage complete: wiring"
        );

        tracing::info!(network, "stage: configure");
        report.supply_rate_set =
            cycle::ensure_supply_rate(self.ledger, &vault, params.senior_supply_rate)
                .await?
                .is_written();
        for (tranche, target) in [
            (Tranche::Senior, params.senior_apy),
            (Tranche::Junior, params.junior_apy),
        ] {
            let Some(units) = target else { continue };
            let outcome =
                cycle::ensure_apy(self.ledger, &vault, tranche, units, params.guard_apy_writes).await?;
            if outcome.is_written() {
                report.apy_written.push(tranche);
            }
        }
        tracing::info!(
            supply_rate_set = report.supply_rate_set,
            apy_written = report.apy_written.len(),
            "stage complete: configure"
        );

        Ok(report)
    }

    /// Mint the configured faucet amount to the operator, once, and only from
    /// an asset this tooling deployed.
    async fn fund_faucet(&self, ctx: &mut DeploymentContext<'_>) -> Result<bool> {
        let Some(amount) = self.profile.params.faucet_mint else {
            return Ok(false);
        };
        let asset_kind = ComponentKind::InvestmentAsset;
        let own_asset = !self.profile.configured(&asset_kind).is_known()
            && ctx.record().addresses.contains_key(&asset_kind);
        if !own_asset {
            tracing::debug!("asset not deployed by this tooling; faucet skipped");
            return Ok(false);
        }
        if ctx.record().faucet_funded {
            tracing::info!("operator already funded from faucet");
            return Ok(false);
        }

        let asset = self.handle(ctx, &asset_kind)?.clone();
        let operator = self.ledger.operator();
        let receipt = self
            .ledger
            .mint(&asset, operator, amount)
            .await
            .map_err(|e| OrchestratorError::ledger("mint", e))?;
        ctx.record_faucet_funded()?;
        tracing::info!(
            %operator,
            amount = %from_fixed_point(amount),
            tx = %receipt.hash_hex(),
            "operator funded from faucet"
        );
        Ok(true)
    }

    /// Set both tranche APYs. `force` bypasses the read-before-write guard.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Config`] if the vault is not deployed
    /// - [`OrchestratorError::TransactionReverted`] if a write reverts
    pub async fn set_apy(&self, senior: u64, junior: u64, force: bool) -> Result<[ParamOutcome; 2]> {
        let mut ctx = DeploymentContext::load(self.network(), self.store)?;
        self.attach_existing(&mut ctx, &[ComponentKind::Vault])?;
        let vault = self.handle(&ctx, &ComponentKind::Vault)?;
        let guard = self.profile.params.guard_apy_writes && !force;

        let senior = cycle::ensure_apy(self.ledger, vault, Tranche::Senior, senior, guard).await?;
        let junior = cycle::ensure_apy(self.ledger, vault, Tranche::Junior, junior, guard).await?;
        Ok([senior, junior])
    }

    /// Settle the vault's current period and invest `allocation`.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::AlreadySettled`] if the period is done
    /// - [`OrchestratorError::TransactionReverted`] if either call reverts
    pub async fn settle(&self, batch: &SettlementBatch, allocation: &Allocation) -> Result<SettlementOutcome> {
        let mut ctx = DeploymentContext::load(self.network(), self.store)?;
        self.attach_existing(&mut ctx, &[ComponentKind::Vault])?;
        let vault = self.handle(&ctx, &ComponentKind::Vault)?.clone();

        let outcome = cycle::settle_period(
            self.ledger,
            self.clock,
            &mut ctx,
            &vault,
            self.profile.params.lock_period_secs,
            batch,
            allocation,
        )
        .await?;

        if let KnownAddress::Known(junior) = self.resolve(&ctx, &ComponentKind::JuniorToken)? {
            let junior = ContractHandle::new(ComponentKind::JuniorToken, junior);
            match self.ledger.balance_of(&junior, self.ledger.operator()).await {
                Ok(balance) => {
                    tracing::info!(balance = %from_fixed_point(balance), "operator junior token balance");
                }
                Err(err) => tracing::warn!(error = %err, "could not read junior token balance"),
            }
        }
        Ok(outcome)
    }

    /// Deploy or attach every configured reward pool, grant it minting and
    /// start its distribution once.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Config`] if the protocol token is not deployed
    /// - [`OrchestratorError::TransactionReverted`] if any call reverts
    pub async fn rewards(&self) -> Result<RunReport> {
        let network = self.network();
        let mut report = RunReport::default();
        if self.profile.reward_pools.is_empty() {
            tracing::info!(network, "no reward pools configured");
            return Ok(report);
        }

        let mut ctx = DeploymentContext::load(network, self.store)?;
        self.attach_existing(&mut ctx, &[ComponentKind::ProtocolToken])?;
        let protocol = self.handle(&ctx, &ComponentKind::ProtocolToken)?.clone();
        let deploy_params = self.deploy_params();
        let operator = self.ledger.operator();

        tracing::info!(network, pools = self.profile.reward_pools.len(), "stage: rewards");
        for spec in &self.profile.reward_pools {
            let kind = spec.kind();
            let known = self.resolve(&ctx, &kind)?;
            let materialized = materialize(self.ledger, &mut ctx, &kind, known, &deploy_params).await?;
            let pool = materialized.handle().clone();
            report.record(materialized);

            let edge = PermissionEdge::reward_pool_edge(kind.clone());
            let outcome = reconcile_edge(
                self.ledger,
                &edge,
                &pool,
                &protocol,
                self.profile.params.verify_wiring,
            )
            .await?;
            report.record_edge(edge, &outcome);

            let Some(amount) = spec.reward_amount else {
                continue;
            };
            if ctx.record().rewards_notified.contains(&pool.address()) {
                tracing::info!(pool = %pool, "reward distribution already started");
                continue;
            }
            let step = |call: &str| format!("{call} {}", spec.pair);
            self.ledger
                .set_reward_distribution_manager(&pool, operator)
                .await
                .map_err(|e| OrchestratorError::ledger(step("setRewardDistributionManager"), e))?;
            let receipt: Receipt = self
                .ledger
                .notify_reward_amount(&pool, amount)
                .await
                .map_err(|e| OrchestratorError::ledger(step("notifyRewardAmount"), e))?;
            ctx.record_rewards_notified(pool.address())?;
            tracing::info!(
                pool = %pool,
                amount = %from_fixed_point(amount),
                tx = %receipt.hash_hex(),
                "reward distribution started"
            );
            report.rewards_started.push(spec.pair.clone());
        }
        tracing::info!(
            deployed = report.deployed.len(),
            started = report.rewards_started.len(),
            "stage complete: rewards"
        );
        Ok(report)
    }

    /// Read the deployment's current state without writing anything.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Ledger`] if a read fails
    pub async fn status(&self) -> Result<StatusReport> {
        let ctx = DeploymentContext::load(self.network(), self.store)?;
        let operator = self.ledger.operator();
        let mut report = StatusReport {
            network: self.network().to_string(),
            operator,
            components: Vec::new(),
            start_time: None,
            current_period: None,
            supply_rate: None,
            apy: None,
            edges: Vec::new(),
            operator_asset_balance: None,
        };

        let mut kinds = ComponentKind::core();
        kinds.push(ComponentKind::VaultData);
        kinds.extend(self.profile.reward_pools.iter().map(|pool| pool.kind()));
        let mut handles = BTreeMap::new();
        for kind in kinds {
            let known = self.resolve(&ctx, &kind)?;
            if let KnownAddress::Known(address) = known {
                handles.insert(kind.clone(), ContractHandle::new(kind.clone(), address));
            }
            report.components.push((kind, known));
        }

        let read = |step: &'static str| move |e: LedgerError| OrchestratorError::ledger(step, e);
        if let Some(vault) = handles.get(&ComponentKind::Vault) {
            report.start_time = Some(self.ledger.start_time(vault).await.map_err(read("startTime"))?);
            report.current_period = Some(
                self.ledger
                    .current_period(vault)
                    .await
                    .map_err(read("getCurrentPeriod"))?,
            );
            report.supply_rate = Some(
                self.ledger
                    .senior_supply_rate(vault)
                    .await
                    .map_err(read("getCurrentSTSupplyRate"))?,
            );
            let senior = self.ledger.apy(vault, Tranche::Senior).await.map_err(read("getAPY"))?;
            let junior = self.ledger.apy(vault, Tranche::Junior).await.map_err(read("getAPY"))?;
            report.apy = Some([senior, junior]);
        }

        let mut edges = PermissionEdge::vault_edges();
        edges.extend(
            self.profile
                .reward_pools
                .iter()
                .map(|pool| PermissionEdge::reward_pool_edge(pool.kind())),
        );
        for edge in edges {
            if let (Some(subject), Some(object)) = (handles.get(&edge.subject), handles.get(&edge.object)) {
                let holds = edge_holds(self.ledger, &edge, subject, object).await?;
                report.edges.push((edge, holds));
            }
        }

        if let Some(asset) = handles.get(&ComponentKind::InvestmentAsset) {
            report.operator_asset_balance =
                Some(self.ledger.balance_of(asset, operator).await.map_err(read("balanceOf"))?);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_book::RewardPoolSpec;
    use crate::store::MemoryRecordStore;
    use dtranche_ledger::MemoryLedger;
    use dtranche_params::to_fixed_point;

    const OPERATOR: Address = Address::repeat_byte(0xaa);

    fn book(profile: NetworkProfile) -> AddressBook {
        AddressBook::new([profile])
    }

    #[tokio::test]
    async fn test_fresh_deploy_then_rerun() {
        let ledger = MemoryLedger::new(OPERATOR);
        let store = MemoryRecordStore::new();
        let book = book(NetworkProfile::new("local"));
        let orchestrator = Orchestrator::new(&ledger, &ledger, &book, "local", &store).expect("bind");

        let first = orchestrator.deploy().await.expect("first run");
        assert_eq!(first.deployed.len(), 5);
        assert_eq!(first.edges_established.len(), 3);
        assert!(first.supply_rate_set);

        ledger.clear_log();
        let second = orchestrator.deploy().await.expect("second run");
        assert!(second.deployed.is_empty());
        assert_eq!(second.attached.len(), 5);
        assert_eq!(second.edges_satisfied.len(), 3);
        assert!(!second.supply_rate_set);
        assert!(ledger.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_zero_supply_rate_sends_nothing() {
        let ledger = MemoryLedger::new(OPERATOR);
        let store = MemoryRecordStore::new();
        let mut profile = NetworkProfile::new("local");
        profile.params.senior_supply_rate = to_fixed_point("0").expect("zero");
        let book = book(profile);
        let orchestrator = Orchestrator::new(&ledger, &ledger, &book, "local", &store).expect("bind");

        let err = orchestrator.deploy().await.expect_err("inactive vault");
        assert!(matches!(err, OrchestratorError::Config(_)));
        assert!(ledger.transactions().is_empty());
        assert!(store.load("local").expect("load").addresses.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_network() {
        let ledger = MemoryLedger::new(OPERATOR);
        let store = MemoryRecordStore::new();
        let book = book(NetworkProfile::new("local"));
        assert!(matches!(
            Orchestrator::new(&ledger, &ledger, &book, "mainnet", &store),
            Err(OrchestratorError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_settle_requires_vault() {
        let ledger = MemoryLedger::new(OPERATOR);
        let store = MemoryRecordStore::new();
        let book = book(NetworkProfile::new("local"));
        let orchestrator = Orchestrator::new(&ledger, &ledger, &book, "local", &store).expect("bind");
        let err = orchestrator
            .settle(&SettlementBatch::default(), &Allocation::default())
            .await
            .expect_err("no vault");
        assert!(matches!(err, OrchestratorError::Config(_)));
    }

    #[tokio::test]
    async fn test_configured_apys_and_faucet() {
        let ledger = MemoryLedger::new(OPERATOR);
        let store = MemoryRecordStore::new();
        let mut profile = NetworkProfile::new("local");
        profile.params.senior_apy = Some(50_000);
        profile.params.junior_apy = Some(150_000);
        profile.params.faucet_mint = Some(to_fixed_point("1000000").expect("amount"));
        let book = book(profile);
        let orchestrator = Orchestrator::new(&ledger, &ledger, &book, "local", &store).expect("bind");

        let report = orchestrator.deploy().await.expect("deploy");
        assert_eq!(report.apy_written, vec![Tranche::Senior, Tranche::Junior]);
        assert!(report.faucet_funded);

        let status = orchestrator.status().await.expect("status");
        assert_eq!(status.apy, Some([50_000, 150_000]));
        assert_eq!(
            status.operator_asset_balance,
            Some(Amount::from(1_000_000u64) * Amount::from(10u64).pow(Amount::from(18)))
        );
        assert!(status.edges.iter().all(|(_, holds)| *holds));

        let again = orchestrator.deploy().await.expect("rerun");
        assert!(again.apy_written.is_empty());
        assert!(!again.faucet_funded);
        assert_eq!(ledger.count_calls("mint"), 1);
    }

    #[tokio::test]
    async fn test_rewards_started_once() {
        let ledger = MemoryLedger::new(OPERATOR);
        let store = MemoryRecordStore::new();
        let mut profile = NetworkProfile::new("local");
        profile.reward_pools.push(RewardPoolSpec {
            pair: PairId("st-skyrim".to_string()),
            pair_address: Address::repeat_byte(0xfa),
            address: KnownAddress::Absent,
            artifact: None,
            reward_amount: Some(to_fixed_point("1000000").expect("amount")),
        });
        let book = book(profile);
        let orchestrator = Orchestrator::new(&ledger, &ledger, &book, "local", &store).expect("bind");
        orchestrator.deploy().await.expect("deploy");

        let first = orchestrator.rewards().await.expect("rewards");
        assert_eq!(first.deployed.len(), 1);
        assert_eq!(first.rewards_started, vec![PairId("st-skyrim".to_string())]);

        let second = orchestrator.rewards().await.expect("rerun");
        assert!(second.deployed.is_empty());
        assert!(second.rewards_started.is_empty());
        assert_eq!(second.edges_satisfied.len(), 1);
        assert_eq!(ledger.count_calls("notifyRewardAmount"), 1);
    }

    #[tokio::test]
    async fn test_status_before_deploy() {
        let ledger = MemoryLedger::new(OPERATOR);
        let store = MemoryRecordStore::new();
        let book = book(NetworkProfile::new("local"));
        let orchestrator = Orchestrator::new(&ledger, &ledger, &book, "local", &store).expect("bind");

        let status = orchestrator.status().await.expect("status");
        assert!(status.components.iter().all(|(_, known)| !known.is_known()));
        assert!(status.edges.is_empty());
        assert_eq!(status.current_period, None);
        assert!(status.to_string().contains("(not deployed)"));
    }
}

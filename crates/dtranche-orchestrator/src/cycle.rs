//! Vault lifecycle: supply rate activation, tranche APYs and per-period
//! settlement.
//!
//! A vault is inactive until its senior supply rate is nonzero. Once active,
//! each period is settled exactly once with `settleProfitsByOwner`, and only
//! after that settlement confirms is capital redeployed with `investByOwner`.

use dtranche_ledger::{Ledger, MemoryLedger, Receipt};
use dtranche_params::{from_apy_units, from_fixed_point};
use dtranche_types::{Allocation, Amount, ContractHandle, SettlementBatch, Timestamp, Tranche, U256};

use crate::context::DeploymentContext;
use crate::store::SettlementStage;
use crate::{OrchestratorError, Result};

/// Source of the current time.
pub trait Clock {
    /// Seconds since the Unix epoch.
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

impl Clock for MemoryLedger {
    fn now(&self) -> Timestamp {
        MemoryLedger::now(self)
    }
}

/// Period containing `now` for a vault started at `start_time`.
///
/// Times before the start fall in period 0.
///
/// # Errors
///
/// - [`OrchestratorError::Config`] if `period_length` is zero
pub fn period_at(start_time: Timestamp, period_length: u64, now: Timestamp) -> Result<u64> {
    if period_length == 0 {
        return Err(OrchestratorError::Config("period length must be nonzero".to_string()));
    }
    Ok(now.saturating_sub(start_time) / period_length)
}

/// Outcome of a guarded parameter write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamOutcome {
    /// The ledger already held an acceptable value; nothing was sent.
    Unchanged(U256),
    /// The value was written.
    Written(Receipt),
}

impl ParamOutcome {
    /// Whether a transaction was sent.
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Activate the vault by setting the senior supply rate, unless one is set.
///
/// `target` is 10^18 fixed-point. Any nonzero on-chain rate counts as set,
/// even if it differs from `target`.
///
/// # Errors
///
/// - [`OrchestratorError::Config`] if `target` is zero
/// - [`OrchestratorError::TransactionReverted`] if the write reverts
pub async fn ensure_supply_rate<L: Ledger>(
    ledger: &L,
    vault: &ContractHandle,
    target: Amount,
) -> Result<ParamOutcome> {
    if target.is_zero() {
        return Err(OrchestratorError::Config(
            "senior supply rate must be nonzero to activate the vault".to_string(),
        ));
    }

    let current = ledger
        .senior_supply_rate(vault)
        .await
        .map_err(|e| OrchestratorError::ledger("getCurrentSTSupplyRate", e))?;
    if !current.is_zero() {
        if current != target {
            tracing::warn!(
                current = %from_fixed_point(current),
                configured = %from_fixed_point(target),
                "supply rate already set to a different value; leaving it"
            );
        } else {
            tracing::info!(rate = %from_fixed_point(current), "supply rate already set");
        }
        return Ok(ParamOutcome::Unchanged(current));
    }

    let receipt = ledger
        .set_senior_supply_rate(vault, target)
        .await
        .map_err(|e| OrchestratorError::ledger("setSeniorTokenSupplyRate", e))?;
    tracing::info!(rate = %from_fixed_point(target), tx = %receipt.hash_hex(), "supply rate set");
    Ok(ParamOutcome::Written(receipt))
}

/// Set a tranche APY in 10^6 units.
///
/// With `guard` set, the write is skipped when the vault already holds `units`.
///
/// # Errors
///
/// - [`OrchestratorError::TransactionReverted`] if the write reverts
/// - [`OrchestratorError::Ledger`] if the guard read fails
pub async fn ensure_apy<L: Ledger>(
    ledger: &L,
    vault: &ContractHandle,
    tranche: Tranche,
    units: u64,
    guard: bool,
) -> Result<ParamOutcome> {
    if guard {
        let current = ledger
            .apy(vault, tranche)
            .await
            .map_err(|e| OrchestratorError::ledger(format!("getAPY({})", tranche.index()), e))?;
        if current == units {
            tracing::info!(%tranche, apy = %from_apy_units(current), "APY already set");
            return Ok(ParamOutcome::Unchanged(U256::from(current)));
        }
    }

    let receipt = ledger
        .set_apy(vault, tranche, units)
        .await
        .map_err(|e| OrchestratorError::ledger(format!("setAPY({})", tranche.index()), e))?;
    tracing::info!(%tranche, apy = %from_apy_units(units), tx = %receipt.hash_hex(), "APY set");
    Ok(ParamOutcome::Written(receipt))
}

/// Transactions issued by one settlement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettlementOutcome {
    /// Period settled.
    pub period: u64,
    /// `settleProfitsByOwner` receipt, `None` when resuming after it confirmed earlier.
    pub settle: Option<Receipt>,
    /// `investByOwner` receipt.
    pub invest: Receipt,
}

/// Settle the vault's current period, then invest.
///
/// The period is computed from the vault's start time, `period_length` and
/// `clock`, and cross-checked against the vault's own view. The deployment
/// record journals progress: a period recorded as invested is refused with
/// [`OrchestratorError::AlreadySettled`]; one recorded as settled but not
/// invested resumes at the investment step.
///
/// # Errors
///
/// - [`OrchestratorError::AlreadySettled`] if the period is already done
/// - [`OrchestratorError::TransactionReverted`] if either call reverts; the
///   investment is not attempted when the settlement fails
pub async fn settle_period<L: Ledger, C: Clock>(
    ledger: &L,
    clock: &C,
    ctx: &mut DeploymentContext<'_>,
    vault: &ContractHandle,
    period_length: u64,
    batch: &SettlementBatch,
    allocation: &Allocation,
) -> Result<SettlementOutcome> {
    if allocation.total().is_none() {
        return Err(OrchestratorError::Config("allocation total overflows".to_string()));
    }

    let start_time = ledger
        .start_time(vault)
        .await
        .map_err(|e| OrchestratorError::ledger("startTime", e))?;
    let local = period_at(start_time, period_length, clock.now())?;
    let on_chain = ledger
        .current_period(vault)
        .await
        .map_err(|e| OrchestratorError::ledger("getCurrentPeriod", e))?;
    let period = if on_chain != local {
        tracing::warn!(
            local,
            on_chain,
            start_time,
            "local period disagrees with vault; using the vault's"
        );
        on_chain
    } else {
        local
    };
    tracing::info!(period, start_time, vault = %vault.address(), "settling period");
    if batch.is_empty() {
        tracing::info!(period, "no profit or loss to report this period");
    }

    let settle = match ctx.record().settlement(vault.address(), period) {
        Some(SettlementStage::Invested) => {
            return Err(OrchestratorError::AlreadySettled {
                vault: vault.address(),
                period,
            });
        }
        Some(SettlementStage::Settled) => {
            tracing::info!(period, "settlement confirmed earlier; resuming at investment");
            None
        }
        None => {
            let receipt = ledger
                .settle_profits_by_owner(vault, batch)
                .await
                .map_err(|e| OrchestratorError::ledger("settleProfitsByOwner", e))?;
            ctx.record_settlement(vault.address(), period, SettlementStage::Settled)?;
            tracing::info!(
                period,
                profits = ?batch.profits,
                losses = ?batch.losses,
                tx = %receipt.hash_hex(),
                "period settled"
            );
            Some(receipt)
        }
    };

    let invest = ledger
        .invest_by_owner(vault, allocation)
        .await
        .map_err(|e| OrchestratorError::ledger("investByOwner", e))?;
    ctx.record_settlement(vault.address(), period, SettlementStage::Invested)?;
    tracing::info!(period, allocation = ?allocation.0, tx = %invest.hash_hex(), "capital invested");

    Ok(SettlementOutcome {
        period,
        settle,
        invest,
    })
}

use anyhow::{Context, Result};
use dtranche_ledger::Ledger;
use dtranche_orchestrator::{Clock, Orchestrator};
use dtranche_params::{from_fixed_point, to_fixed_point};
use dtranche_types::{Allocation, Amount, SettlementBatch, TRANCHE_COUNT};

/// Decimal amounts per tranche, senior first.
#[derive(Debug, Clone, Copy)]
pub struct SettleAmounts<'a> {
    pub profits: [&'a str; TRANCHE_COUNT],
    pub losses: [&'a str; TRANCHE_COUNT],
    pub invest: [&'a str; TRANCHE_COUNT],
}

fn parse(values: [&str; TRANCHE_COUNT], what: &str) -> Result<[Amount; TRANCHE_COUNT]> {
    let mut out = [Amount::ZERO; TRANCHE_COUNT];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = to_fixed_point(value).with_context(|| format!("{what} {value:?}"))?;
    }
    Ok(out)
}

impl SettleAmounts<'_> {
    /// Convert to fixed-point batch and allocation.
    pub fn to_fixed_point(&self) -> Result<(SettlementBatch, Allocation)> {
        let batch = SettlementBatch::new(parse(self.profits, "profit")?, parse(self.losses, "loss")?);
        let allocation = Allocation(parse(self.invest, "investment")?);
        Ok((batch, allocation))
    }
}

/// Settle the current period and invest.
pub async fn run<L: Ledger, C: Clock>(orchestrator: &Orchestrator<'_, L, C>, amounts: &SettleAmounts<'_>) -> Result<()> {
    let (batch, allocation) = amounts.to_fixed_point()?;
    let outcome = orchestrator.settle(&batch, &allocation).await?;

    match &outcome.settle {
        Some(receipt) => println!("Period {} settled (tx {})", outcome.period, receipt.hash_hex()),
        None => println!("Period {} was already settled", outcome.period),
    }
    let total = allocation.total().map_or_else(|| "overflow".to_string(), from_fixed_point);
    println!("Invested {total} (tx {})", outcome.invest.hash_hex());
    Ok(())
}

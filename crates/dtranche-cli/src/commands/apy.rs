use anyhow::{Context, Result};
use dtranche_ledger::Ledger;
use dtranche_orchestrator::{Clock, Orchestrator, ParamOutcome};
use dtranche_params::fixed_point::from_scaled;
use dtranche_params::to_apy_units;
use dtranche_types::{Tranche, APY_DECIMALS};

/// Set both tranche APYs from decimal fractions.
pub async fn run<L: Ledger, C: Clock>(
    orchestrator: &Orchestrator<'_, L, C>,
    senior: &str,
    junior: &str,
    force: bool,
) -> Result<()> {
    let senior = to_apy_units(senior).context("--senior")?;
    let junior = to_apy_units(junior).context("--junior")?;

    let outcomes = orchestrator.set_apy(senior, junior, force).await?;
    for (tranche, outcome) in Tranche::ALL.iter().zip(outcomes.iter()) {
        match outcome {
            ParamOutcome::Unchanged(units) => {
                println!("{tranche} APY unchanged at {}", from_scaled(*units, APY_DECIMALS));
            }
            ParamOutcome::Written(receipt) => {
                println!("{tranche} APY set (tx {})", receipt.hash_hex());
            }
        }
    }
    Ok(())
}

use anyhow::Result;
use dtranche_ledger::Ledger;
use dtranche_orchestrator::{Clock, Orchestrator};

/// Deploy reward pools and start their distribution.
pub async fn run<L: Ledger, C: Clock>(orchestrator: &Orchestrator<'_, L, C>) -> Result<()> {
    let report = orchestrator.rewards().await?;
    println!("{report}");
    Ok(())
}

use anyhow::Result;
use dtranche_ledger::Ledger;
use dtranche_orchestrator::{Clock, Orchestrator};

/// Print the network's deployment and vault state.
pub async fn run<L: Ledger, C: Clock>(orchestrator: &Orchestrator<'_, L, C>) -> Result<()> {
    let status = orchestrator.status().await?;
    println!("{status}");
    Ok(())
}

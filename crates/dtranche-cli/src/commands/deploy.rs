use anyhow::Result;
use dtranche_ledger::Ledger;
use dtranche_orchestrator::{Clock, Orchestrator};

/// Deploy or attach the core components, wire and configure them.
pub async fn run<L: Ledger, C: Clock>(orchestrator: &Orchestrator<'_, L, C>) -> Result<()> {
    let report = orchestrator.deploy().await?;
    println!("{report}");
    if report.is_noop() {
        println!("Nothing to do: deployment is up to date.");
    }
    Ok(())
}

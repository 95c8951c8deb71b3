//! dtranche - deployment and operations tool for the tranche yield protocol.
//!
//! Every command is idempotent: rerunning it against the same network only
//! sends the transactions that are still missing.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dtranche_evm::{ArtifactStore, EvmLedger};
use dtranche_ledger::{Ledger, MemoryLedger};
use dtranche_orchestrator::{
    AddressBook, Clock, FileRecordStore, MemoryRecordStore, NetworkProfile, Orchestrator, SystemClock,
};
use dtranche_types::{Address, KnownAddress};

mod commands;
mod config;

use config::DtrancheConfig;

/// Operator account of the in-memory chain.
const SIMULATION_OPERATOR: Address = Address::repeat_byte(0x5e);

/// Deploy, wire and operate a tranche vault.
#[derive(Parser)]
#[command(name = "dtranche")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "DTRANCHE_CONFIG")]
    config: Option<PathBuf>,

    /// Target network, as named in the config file
    #[arg(short, long, global = true, env = "DTRANCHE_NETWORK", default_value = "bsc_test")]
    network: String,

    /// Run against an in-memory chain instead of the configured RPC endpoint
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy or attach every component, wire permissions and set parameters
    Deploy,

    /// Show component addresses, wiring and vault parameters
    Status,

    /// Set both tranche APYs
    SetApy {
        /// Senior tranche APY as a fraction ("0.05" = 5%)
        #[arg(long)]
        senior: String,

        /// Junior tranche APY as a fraction
        #[arg(long)]
        junior: String,

        /// Write even if the vault already holds the value
        #[arg(long)]
        force: bool,
    },

    /// Settle the current period and invest the next allocation
    Settle {
        /// Senior tranche profit, in asset units
        #[arg(long, default_value = "0")]
        senior_profit: String,

        /// Junior tranche profit
        #[arg(long, default_value = "0")]
        junior_profit: String,

        /// Senior tranche loss
        #[arg(long, default_value = "0")]
        senior_loss: String,

        /// Junior tranche loss
        #[arg(long, default_value = "0")]
        junior_loss: String,

        /// Amount invested into the senior tranche
        #[arg(long, default_value = "0")]
        invest_senior: String,

        /// Amount invested into the junior tranche
        #[arg(long, default_value = "0")]
        invest_junior: String,
    },

    /// Deploy reward pools, grant minting and start distribution
    Rewards,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = DtrancheConfig::load(cli.config.as_deref())?;

    let level = if cli.verbose {
        "debug"
    } else {
        config.advanced.log_level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("dtranche={level}").parse()?),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), network = %cli.network, "dtranche starting");

    if cli.simulate {
        simulate(&cli, &config).await
    } else {
        live(&cli, &config).await
    }
}

/// Run against the configured RPC endpoint, recording to disk.
async fn live(cli: &Cli, config: &DtrancheConfig) -> anyhow::Result<()> {
    let network = config.network(&cli.network)?;
    let profile = network.to_profile(&cli.network)?;

    let rpc_url = network
        .rpc_url
        .as_deref()
        .with_context(|| format!("networks.{}.rpc_url is not set", cli.network))?;
    let private_key = std::env::var(&network.private_key_env)
        .with_context(|| format!("reading private key from ${}", network.private_key_env))?;

    let mut artifacts = ArtifactStore::new(&network.artifacts_dir);
    for pool in &profile.reward_pools {
        if let Some(name) = &pool.artifact {
            artifacts = artifacts.with_name(pool.kind(), name.clone());
        }
    }

    let ledger = EvmLedger::connect(rpc_url, &private_key, artifacts).await?;
    let store = FileRecordStore::new(&config.advanced.record_dir);
    let book = AddressBook::new([profile]);
    let orchestrator = Orchestrator::new(&ledger, &SystemClock, &book, &cli.network, &store)?;

    tracing::info!(operator = %ledger.operator(), record = %store.path(&cli.network)?.display(), "connected");
    dispatch(&cli.command, &orchestrator, false).await
}

/// Run against a fresh in-memory chain. Configured addresses are ignored
/// since nothing exists there yet.
async fn simulate(cli: &Cli, config: &DtrancheConfig) -> anyhow::Result<()> {
    let mut profile = match config.networks.get(&cli.network) {
        Some(network) => network.to_profile(&cli.network)?,
        None => NetworkProfile::new(cli.network.as_str()),
    };
    profile.addresses.clear();
    for pool in &mut profile.reward_pools {
        pool.address = KnownAddress::Absent;
    }

    let ledger = MemoryLedger::with_time(SIMULATION_OPERATOR, SystemClock.now());
    let store = MemoryRecordStore::new();
    let book = AddressBook::new([profile]);
    let orchestrator = Orchestrator::new(&ledger, &ledger, &book, &cli.network, &store)?;

    tracing::warn!("simulating against an in-memory chain; nothing is broadcast");
    dispatch(&cli.command, &orchestrator, true).await?;
    tracing::info!(transactions = ledger.transactions().len(), "simulation finished");
    Ok(())
}

async fn dispatch<L: Ledger, C: Clock>(
    command: &Commands,
    orchestrator: &Orchestrator<'_, L, C>,
    bootstrap: bool,
) -> anyhow::Result<()> {
    // A fresh simulated chain has no vault yet.
    if bootstrap && !matches!(command, Commands::Deploy) {
        orchestrator.deploy().await?;
    }

    match command {
        Commands::Deploy => commands::deploy::run(orchestrator).await,
        Commands::Status => commands::status::run(orchestrator).await,
        Commands::SetApy {
            senior,
            junior,
            force,
        } => commands::apy::run(orchestrator, senior, junior, *force).await,
        Commands::Settle {
            senior_profit,
            junior_profit,
            senior_loss,
            junior_loss,
            invest_senior,
            invest_junior,
        } => {
            let amounts = commands::settle::SettleAmounts {
                profits: [senior_profit.as_str(), junior_profit.as_str()],
                losses: [senior_loss.as_str(), junior_loss.as_str()],
                invest: [invest_senior.as_str(), invest_junior.as_str()],
            };
            commands::settle::run(orchestrator, &amounts).await
        }
        Commands::Rewards => commands::rewards::run(orchestrator).await,
    }
}

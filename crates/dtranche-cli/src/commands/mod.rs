//! Subcommand implementations.
//!
//! Each command drives one [`dtranche_orchestrator::Orchestrator`] operation
//! and prints its report to stdout. Progress goes to the log.

pub mod apy;
pub mod deploy;
pub mod rewards;
pub mod settle;
pub mod status;

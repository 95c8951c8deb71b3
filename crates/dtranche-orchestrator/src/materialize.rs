//! Deploy-or-attach for a single component.
//!
//! A known address is attached without touching the ledger. An absent one
//! is deployed with constructor arguments taken from already-materialized
//! dependencies and the run's scalar parameters, and the new address is
//! written to the deployment record before anything else happens.

use std::collections::BTreeMap;

use dtranche_ledger::{ConstructorArg, DeployRequest, Ledger};
use dtranche_types::{
    Address, Amount, ComponentKind, ConstructorInput, ContractHandle, KnownAddress, PairId, Scalar,
    Timestamp, U256,
};

use crate::context::DeploymentContext;
use crate::{OrchestratorError, Result};

/// Scalar constructor parameters of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployParams {
    /// Vault start time.
    pub start_time: Timestamp,
    /// Vault period length in seconds.
    pub period_length: u64,
    /// Recipient of the protocol token's initial supply.
    pub recipient: Address,
    /// Protocol token initial supply (fixed-point).
    pub initial_supply: Amount,
    /// LP pair address per reward pool pair.
    pub pair_addresses: BTreeMap<PairId, Address>,
}

/// Result of materializing one component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Materialized {
    /// An existing deployment was attached.
    Attached(ContractHandle),
    /// A new instance was deployed.
    Deployed(ContractHandle),
}

impl Materialized {
    /// The handle either way.
    pub fn handle(&self) -> &ContractHandle {
        match self {
            Self::Attached(handle) | Self::Deployed(handle) => handle,
        }
    }

    /// Whether a deployment transaction was issued.
    pub fn is_deployed(&self) -> bool {
        matches!(self, Self::Deployed(_))
    }
}

/// Build the constructor arguments of `kind` in its fixed order.
///
/// # Errors
///
/// - [`OrchestratorError::DependencyMissing`] if a dependency is not materialized
/// - [`OrchestratorError::Config`] if a reward pool's pair address is not configured
pub fn constructor_args(
    kind: &ComponentKind,
    ctx: &DeploymentContext<'_>,
    params: &DeployParams,
) -> Result<Vec<ConstructorArg>> {
    kind.constructor_inputs()
        .into_iter()
        .map(|input| match input {
            ConstructorInput::Component(dep) => {
                Ok(ConstructorArg::Address(ctx.dependency(kind, &dep)?.address()))
            }
            ConstructorInput::PairAddress => match kind {
                ComponentKind::RewardPool(pair) => params
                    .pair_addresses
                    .get(pair)
                    .map(|address| ConstructorArg::Address(*address))
                    .ok_or_else(|| {
                        OrchestratorError::Config(format!("no pair address configured for {pair}"))
                    }),
                other => Err(OrchestratorError::Config(format!(
                    "{other} does not take a pair address"
                ))),
            },
            ConstructorInput::Scalar(Scalar::Recipient) => Ok(ConstructorArg::Address(params.recipient)),
            ConstructorInput::Scalar(Scalar::InitialSupply) => Ok(ConstructorArg::Uint(params.initial_supply)),
            ConstructorInput::Scalar(Scalar::StartTime) => {
                Ok(ConstructorArg::Uint(U256::from(params.start_time)))
            }
            ConstructorInput::Scalar(Scalar::PeriodLength) => {
                Ok(ConstructorArg::Uint(U256::from(params.period_length)))
            }
        })
        .collect()
}

/// Attach `kind` at its known address, or deploy it.
///
/// Issues exactly one transaction for an absent kind and none for a known one.
///
/// # Errors
///
/// - [`OrchestratorError::DependencyMissing`] before any transaction if a
///   dependency is not materialized
/// - [`OrchestratorError::TransactionReverted`] if the deployment reverts
/// - [`OrchestratorError::Store`] if the new address cannot be recorded; the
///   message carries the address so the deployment is not lost
pub async fn materialize<L: Ledger>(
    ledger: &L,
    ctx: &mut DeploymentContext<'_>,
    kind: &ComponentKind,
    known: KnownAddress,
    params: &DeployParams,
) -> Result<Materialized> {
    if let KnownAddress::Known(address) = known {
        let handle = ContractHandle::new(kind.clone(), address);
        tracing::info!(kind = %kind, %address, "attached existing deployment");
        ctx.attach(handle.clone());
        return Ok(Materialized::Attached(handle));
    }

    let args = constructor_args(kind, ctx, params)?;
    tracing::info!(
        kind = %kind,
        args = %args.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
        "deploying"
    );
    let request = DeployRequest {
        kind: kind.clone(),
        args,
    };
    let address = ledger
        .deploy(&request)
        .await
        .map_err(|e| OrchestratorError::ledger(format!("deploy {kind}"), e))?;

    tracing::info!(kind = %kind, %address, "deployed");
    let handle = ContractHandle::new(kind.clone(), address);
    ctx.record_deployment(handle.clone()).map_err(|e| {
        tracing::error!(
            kind = %kind,
            %address,
            error = %e,
            "deployment not recorded; configure this address before rerunning"
        );
        OrchestratorError::Store(format!("{kind} deployed at {address} but not recorded: {e}"))
    })?;
    Ok(Materialized::Deployed(handle))
}

//! Integration test: settlement periods and resuming aborted runs.
//!
//! Exercises:
//! 1. Settlement strictly before investment, once per period
//! 2. A second settlement in the same period is refused without a transaction
//! 3. An investment that reverted after settlement is retried alone
//! 4. A deployment that aborted midway resumes without redeploying
//! 5. Wiring that reverted is completed by the next run
//! 6. Parameters that could never activate the vault fail before any transaction

use dtranche_ledger::MemoryLedger;
use dtranche_orchestrator::{
    AddressBook, MemoryRecordStore, NetworkProfile, Orchestrator, OrchestratorError, RecordStore,
    SettlementStage,
};
use dtranche_params::to_fixed_point;
use dtranche_types::{Address, Allocation, Amount, ComponentKind, SettlementBatch};

const OPERATOR: Address = Address::repeat_byte(0xaa);
const NETWORK: &str = "local";
const START_DELAY: u64 = 60;
const PERIOD: u64 = 300;

fn amount(value: &str) -> Amount {
    to_fixed_point(value).expect("amount")
}

fn batch() -> SettlementBatch {
    SettlementBatch::new([amount("12.5"), amount("40")], [Amount::ZERO, amount("1")])
}

#[tokio::test]
async fn test_settle_then_invest_once_per_period() {
    let ledger = MemoryLedger::new(OPERATOR);
    let store = MemoryRecordStore::new();
    let book = AddressBook::new([NetworkProfile::new(NETWORK)]);
    let orchestrator = Orchestrator::new(&ledger, &ledger, &book, NETWORK, &store).expect("bind");
    orchestrator.deploy().await.expect("deploy");
    let vault = store
        .load(NETWORK)
        .expect("record")
        .addresses
        .get(&ComponentKind::Vault)
        .copied()
        .expect("vault recorded");

    ledger.advance(START_DELAY + PERIOD);
    ledger.clear_log();
    let allocation = Allocation([amount("1000"), amount("250")]);
    let outcome = orchestrator.settle(&batch(), &allocation).await.expect("settle");

    assert_eq!(outcome.period, 1);
    assert!(outcome.settle.is_some());
    let calls: Vec<&str> = ledger.transactions().iter().map(|tx| tx.call).collect();
    assert_eq!(calls, vec!["settleProfitsByOwner", "investByOwner"]);
    assert_eq!(ledger.invested(vault), Some(allocation.0));

    // Same period again: refused before any transaction.
    ledger.clear_log();
    let err = orchestrator
        .settle(&batch(), &allocation)
        .await
        .expect_err("already settled");
    assert!(matches!(err, OrchestratorError::AlreadySettled { period: 1, .. }));
    assert!(ledger.transactions().is_empty());

    // The next period is open.
    ledger.advance(PERIOD);
    let next = orchestrator.settle(&batch(), &allocation).await.expect("next period");
    assert_eq!(next.period, 2);
    assert_eq!(ledger.count_calls("settleProfitsByOwner"), 1);
}

#[tokio::test]
async fn test_reverted_investment_resumes_without_resettling() {
    let ledger = MemoryLedger::new(OPERATOR);
    let store = MemoryRecordStore::new();
    let book = AddressBook::new([NetworkProfile::new(NETWORK)]);
    let orchestrator = Orchestrator::new(&ledger, &ledger, &book, NETWORK, &store).expect("bind");
    orchestrator.deploy().await.expect("deploy");
    ledger.advance(START_DELAY);

    ledger.fail_call("investByOwner");
    let allocation = Allocation([amount("10"), amount("10")]);
    let err = orchestrator
        .settle(&batch(), &allocation)
        .await
        .expect_err("investment reverts");
    assert!(matches!(err, OrchestratorError::TransactionReverted { ref step, .. } if step == "investByOwner"));

    let record = store.load(NETWORK).expect("record");
    let vault = record.addresses[&ComponentKind::Vault];
    assert_eq!(record.settlement(vault, 0), Some(SettlementStage::Settled));

    ledger.clear_faults();
    ledger.clear_log();
    let outcome = orchestrator.settle(&batch(), &allocation).await.expect("resume");
    assert_eq!(outcome.period, 0);
    assert!(outcome.settle.is_none());
    assert_eq!(ledger.count_calls("settleProfitsByOwner"), 0);
    assert_eq!(ledger.count_calls("investByOwner"), 1);
    assert_eq!(
        store.load(NETWORK).expect("record").settlement(vault, 0),
        Some(SettlementStage::Invested)
    );
}

#[tokio::test]
async fn test_aborted_deploy_resumes_at_failed_component() {
    let ledger = MemoryLedger::new(OPERATOR);
    let store = MemoryRecordStore::new();

    let book = AddressBook::new([NetworkProfile::new(NETWORK)]);
    let orchestrator = Orchestrator::new(&ledger, &ledger, &book, NETWORK, &store).expect("bind");

    // The vault constructor reverts after four components are deployed.
    ledger.fail_deploy(ComponentKind::Vault);
    let err = orchestrator.deploy().await.expect_err("vault reverts");
    assert!(matches!(err, OrchestratorError::TransactionReverted { ref step, .. } if step == "deploy vault"));
    assert_eq!(store.load(NETWORK).expect("record").addresses.len(), 4);

    ledger.clear_faults();
    ledger.clear_log();
    let report = orchestrator.deploy().await.expect("resume");

    assert_eq!(ledger.deployments(), vec![ComponentKind::Vault]);
    assert_eq!(report.attached.len(), 4);
    assert_eq!(report.edges_established.len(), 3);
}

#[tokio::test]
async fn test_invalid_parameters_send_nothing() {
    let ledger = MemoryLedger::new(OPERATOR);
    let store = MemoryRecordStore::new();
    let mut profile = NetworkProfile::new(NETWORK);
    profile.params.senior_supply_rate = Amount::ZERO;
    let book = AddressBook::new([profile]);
    let orchestrator = Orchestrator::new(&ledger, &ledger, &book, NETWORK, &store).expect("bind");

    let err = orchestrator.deploy().await.expect_err("vault could never activate");
    assert!(matches!(err, OrchestratorError::Config(_)));
    assert!(ledger.transactions().is_empty());
    assert!(store.load(NETWORK).expect("record").addresses.is_empty());
}

#[tokio::test]
async fn test_reverted_wiring_completed_by_next_run() {
    let ledger = MemoryLedger::new(OPERATOR);
    let store = MemoryRecordStore::new();
    let book = AddressBook::new([NetworkProfile::new(NETWORK)]);
    let orchestrator = Orchestrator::new(&ledger, &ledger, &book, NETWORK, &store).expect("bind");

    ledger.fail_call("addMinter");
    let err = orchestrator.deploy().await.expect_err("grant reverts");
    assert!(matches!(err, OrchestratorError::TransactionReverted { .. }));
    assert_eq!(ledger.count_calls("setVault"), 2);
    assert_eq!(ledger.count_calls("setSeniorTokenSupplyRate"), 0);

    ledger.clear_faults();
    ledger.clear_log();
    let report = orchestrator.deploy().await.expect("resume");
    assert!(report.deployed.is_empty());
    assert_eq!(report.edges_satisfied.len(), 2);
    assert_eq!(report.edges_established.len(), 1);
    assert!(report.supply_rate_set);
    assert_eq!(ledger.count_calls("addMinter"), 1);
    assert_eq!(ledger.count_calls("deploy"), 0);
}

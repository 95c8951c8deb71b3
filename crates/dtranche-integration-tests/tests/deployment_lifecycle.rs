//! Integration test: deployment, rerun and attach-to-existing flows.
//!
//! Exercises the complete deploy stage sequence:
//! 1. Fresh deployment of every core component, recorded to disk
//! 2. A second process rerunning deploy from the same record sends nothing
//! 3. Preexisting asset and protocol token are attached, not redeployed
//! 4. Wiring that does not stick is reported as a verification failure
//! 5. Reward pools are deployed, granted minting and started once
//!
//! All runs use the in-memory ledger; no network I/O.

use dtranche_ledger::{ConstructorArg, DeployRequest, Ledger, MemoryLedger};
use dtranche_orchestrator::{
    AddressBook, FileRecordStore, NetworkProfile, Orchestrator, OrchestratorError, RecordStore,
    RewardPoolSpec,
};
use dtranche_params::to_fixed_point;
use dtranche_types::{Address, ComponentKind, KnownAddress, PairId, U256};

const OPERATOR: Address = Address::repeat_byte(0xaa);
const NETWORK: &str = "bsc_test";

fn book(profile: NetworkProfile) -> AddressBook {
    AddressBook::new([profile])
}

#[tokio::test]
async fn test_fresh_deploy_is_recorded_and_rerun_is_noop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ledger = MemoryLedger::new(OPERATOR);
    let book = book(NetworkProfile::new(NETWORK));

    let store = FileRecordStore::new(dir.path());
    let orchestrator = Orchestrator::new(&ledger, &ledger, &book, NETWORK, &store).expect("bind");
    let first = orchestrator.deploy().await.expect("first run");

    assert_eq!(
        ledger.deployments(),
        vec![
            ComponentKind::InvestmentAsset,
            ComponentKind::SeniorToken,
            ComponentKind::JuniorToken,
            ComponentKind::ProtocolToken,
            ComponentKind::Vault,
        ]
    );
    assert_eq!(ledger.count_calls("setVault"), 2);
    assert_eq!(ledger.count_calls("addMinter"), 1);
    assert_eq!(ledger.count_calls("setSeniorTokenSupplyRate"), 1);
    assert!(!first.is_noop());

    // A second process sees only what the first one wrote to disk.
    let raw = std::fs::read_to_string(store.path(NETWORK).expect("path")).expect("record file");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(json["network"], NETWORK);
    assert_eq!(json["addresses"].as_object().map(|m| m.len()), Some(5));

    ledger.clear_log();
    let reopened = FileRecordStore::new(dir.path());
    let orchestrator = Orchestrator::new(&ledger, &ledger, &book, NETWORK, &reopened).expect("bind");
    let second = orchestrator.deploy().await.expect("second run");

    assert!(second.is_noop());
    assert_eq!(second.attached.len(), 5);
    assert_eq!(second.edges_satisfied.len(), 3);
    assert!(ledger.transactions().is_empty());
}

#[tokio::test]
async fn test_existing_asset_and_protocol_token_are_attached() {
    let ledger = MemoryLedger::new(OPERATOR);
    let asset = ledger
        .deploy(&DeployRequest {
            kind: ComponentKind::InvestmentAsset,
            args: vec![],
        })
        .await
        .expect("asset");
    let protocol = ledger
        .deploy(&DeployRequest {
            kind: ComponentKind::ProtocolToken,
            args: vec![ConstructorArg::Address(OPERATOR), ConstructorArg::Uint(U256::from(1))],
        })
        .await
        .expect("protocol token");
    ledger.clear_log();

    let mut profile = NetworkProfile::new(NETWORK)
        .with_address(ComponentKind::InvestmentAsset, asset)
        .with_address(ComponentKind::ProtocolToken, protocol);
    profile.params.faucet_mint = Some(to_fixed_point("1000").expect("amount"));
    let book = book(profile);
    let store = dtranche_orchestrator::MemoryRecordStore::new();
    let orchestrator = Orchestrator::new(&ledger, &ledger, &book, NETWORK, &store).expect("bind");

    let report = orchestrator.deploy().await.expect("deploy");
    assert_eq!(
        ledger.deployments(),
        vec![
            ComponentKind::SeniorToken,
            ComponentKind::JuniorToken,
            ComponentKind::Vault,
        ]
    );
    assert_eq!(report.attached.len(), 2);

    // Configured addresses are not copied into the record.
    let record = store.load(NETWORK).expect("record");
    assert!(!record.addresses.contains_key(&ComponentKind::InvestmentAsset));
    assert!(record.addresses.contains_key(&ComponentKind::Vault));

    // The faucet only pays out from an asset this tooling deployed.
    assert!(!report.faucet_funded);
    assert_eq!(ledger.count_calls("mint"), 0);
}

#[tokio::test]
async fn test_unverified_minter_grant_fails_run() {
    let ledger = MemoryLedger::new(OPERATOR);
    ledger.ignore_call("addMinter");
    let book = book(NetworkProfile::new(NETWORK));
    let store = dtranche_orchestrator::MemoryRecordStore::new();
    let orchestrator = Orchestrator::new(&ledger, &ledger, &book, NETWORK, &store).expect("bind");

    let err = orchestrator.deploy().await.expect_err("minter never granted");
    assert!(matches!(
        err,
        OrchestratorError::WiringVerification { ref edge } if edge.contains("isMinterOf")
    ));
    // Components stay recorded for the next attempt.
    assert_eq!(store.load(NETWORK).expect("record").addresses.len(), 5);
}

#[tokio::test]
async fn test_vault_data_deployed_when_requested() {
    let ledger = MemoryLedger::new(OPERATOR);
    let mut profile = NetworkProfile::new(NETWORK);
    profile.params.deploy_vault_data = true;
    let book = book(profile);
    let store = dtranche_orchestrator::MemoryRecordStore::new();
    let orchestrator = Orchestrator::new(&ledger, &ledger, &book, NETWORK, &store).expect("bind");

    orchestrator.deploy().await.expect("deploy");
    assert_eq!(ledger.deployments().last(), Some(&ComponentKind::VaultData));
    assert_eq!(ledger.deployments().len(), 6);
}

#[tokio::test]
async fn test_reward_pools_follow_deploy() {
    let ledger = MemoryLedger::new(OPERATOR);
    let mut profile = NetworkProfile::new(NETWORK);
    for (pair, byte) in [("st-skyrim", 0xf1), ("jt-skyrim", 0xf2)] {
        profile.reward_pools.push(RewardPoolSpec {
            pair: PairId(pair.to_string()),
            pair_address: Address::repeat_byte(byte),
            address: KnownAddress::Absent,
            artifact: None,
            reward_amount: Some(to_fixed_point("500000").expect("amount")),
        });
    }
    let book = book(profile);
    let store = dtranche_orchestrator::MemoryRecordStore::new();
    let orchestrator = Orchestrator::new(&ledger, &ledger, &book, NETWORK, &store).expect("bind");

    orchestrator.deploy().await.expect("deploy");
    ledger.clear_log();
    let report = orchestrator.rewards().await.expect("rewards");

    assert_eq!(report.deployed.len(), 2);
    assert_eq!(report.rewards_started.len(), 2);
    assert_eq!(ledger.count_calls("addMinter"), 2);
    assert_eq!(ledger.count_calls("notifyRewardAmount"), 2);
    for handle in &report.deployed {
        assert_eq!(
            ledger.notified_rewards(handle.address()),
            Some(to_fixed_point("500000").expect("amount"))
        );
    }

    ledger.clear_log();
    let again = orchestrator.rewards().await.expect("rerun");
    assert!(again.is_noop());
    assert!(ledger.transactions().is_empty());
}

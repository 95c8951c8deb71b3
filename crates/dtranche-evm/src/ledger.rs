//! RPC-backed [`Ledger`].

use std::fmt;

use alloy::dyn_abi::DynSolValue;
use alloy::network::{Ethereum, EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Bytes, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;

use dtranche_ledger::{ConstructorArg, DeployRequest, Ledger, LedgerError, Receipt, Result};
use dtranche_types::{
    Address, Allocation, Amount, Capability, ContractHandle, SettlementBatch, Timestamp, Tranche,
};

use crate::artifacts::ArtifactStore;
use crate::bindings::{IFaucetToken, IProtocolToken, IRewardPool, ITrancheToken, ITrancheVault};
use crate::EvmError;

fn small(call: &str, value: U256) -> Result<u64> {
    u64::try_from(value).map_err(|_| LedgerError::UnexpectedValue {
        call: call.to_string(),
        reason: format!("{value} exceeds 64 bits"),
    })
}

/// Map an RPC or contract error to a revert when the node reports one.
fn classify(call: &str, err: impl fmt::Display) -> LedgerError {
    let message = err.to_string();
    if message.to_ascii_lowercase().contains("revert") {
        LedgerError::Reverted {
            call: call.to_string(),
            reason: message,
        }
    } else {
        LedgerError::Transport(format!("{call}: {message}"))
    }
}

/// ABI-encode constructor arguments as a parameter tuple.
fn encode_args(args: &[ConstructorArg]) -> Vec<u8> {
    let values = args
        .iter()
        .map(|arg| match arg {
            ConstructorArg::Address(address) => DynSolValue::Address(*address),
            ConstructorArg::Uint(value) => DynSolValue::Uint(*value, 256),
        })
        .collect();
    DynSolValue::Tuple(values).abi_encode_params()
}

/// Ledger reached over JSON-RPC, signing with a local key.
#[derive(Clone)]
pub struct EvmLedger {
    provider: DynProvider,
    operator: Address,
    artifacts: ArtifactStore,
}

impl fmt::Debug for EvmLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmLedger")
            .field("operator", &self.operator)
            .field("artifacts", &self.artifacts)
            .finish_non_exhaustive()
    }
}

impl EvmLedger {
    /// Connect to `rpc_url`, signing with the hex `private_key`.
    ///
    /// # Errors
    ///
    /// - [`EvmError::Key`] if the key does not parse
    /// - [`EvmError::Connect`] if the endpoint cannot be set up
    pub async fn connect(rpc_url: &str, private_key: &str, artifacts: ArtifactStore) -> crate::Result<Self> {
        let key = private_key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let signer: PrivateKeySigner = key.parse().map_err(|e| EvmError::Key(format!("{e}")))?;
        let operator = signer.address();

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect(rpc_url)
            .await
            .map_err(|e| EvmError::Connect(e.to_string()))?
            .erased();

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| EvmError::Connect(e.to_string()))?;
        tracing::info!(rpc_url, chain_id, %operator, "connected to ledger");

        Ok(Self {
            provider,
            operator,
            artifacts,
        })
    }

    /// Wait for a submitted transaction and turn a failed status into a revert.
    async fn confirm(&self, call: &str, pending: PendingTransactionBuilder<Ethereum>) -> Result<Receipt> {
        let receipt = pending.get_receipt().await.map_err(|e| classify(call, e))?;
        let tx_hash = ReceiptResponse::transaction_hash(&receipt);
        if !ReceiptResponse::status(&receipt) {
            return Err(LedgerError::Reverted {
                call: call.to_string(),
                reason: format!("transaction {tx_hash} failed"),
            });
        }
        tracing::debug!(call, tx = %tx_hash, "transaction confirmed");
        Ok(Receipt {
            tx_hash: tx_hash.0,
            block_number: ReceiptResponse::block_number(&receipt),
        })
    }
}

impl Ledger for EvmLedger {
    fn operator(&self) -> Address {
        self.operator
    }

    async fn deploy(&self, request: &DeployRequest) -> Result<Address> {
        let mut code = self.artifacts.bytecode(&request.kind)?;
        code.extend(encode_args(&request.args));

        let tx = TransactionRequest::default().with_deploy_code(Bytes::from(code));
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| classify("deploy", e))?;
        let receipt = pending.get_receipt().await.map_err(|e| classify("deploy", e))?;
        if !ReceiptResponse::status(&receipt) {
            return Err(LedgerError::Reverted {
                call: "deploy".to_string(),
                reason: format!(
                    "{} creation {} failed",
                    request.kind,
                    ReceiptResponse::transaction_hash(&receipt)
                ),
            });
        }
        ReceiptResponse::contract_address(&receipt).ok_or_else(|| LedgerError::UnexpectedValue {
                call: "deploy".to_string(),
                reason: "receipt carries no contract address".to_string(),
            })
    }

    async fn mint(&self, asset: &ContractHandle, to: Address, amount: Amount) -> Result<Receipt> {
        asset.require(Capability::Faucet)?;
        let token = IFaucetToken::new(asset.address(), self.provider.clone());
        let pending = token
            .mint(to, amount)
            .send()
            .await
            .map_err(|e| classify("mint", e))?;
        self.confirm("mint", pending).await
    }

    async fn balance_of(&self, token: &ContractHandle, account: Address) -> Result<Amount> {
        token.require(Capability::Balance)?;
        let contract = IFaucetToken::new(token.address(), self.provider.clone());
        let balance = contract
            .balanceOf(account)
            .call()
            .await
            .map_err(|e| classify("balanceOf", e))?;
        Ok(balance)
    }

    async fn is_vault(&self, token: &ContractHandle, vault: Address) -> Result<bool> {
        token.require(Capability::VaultRegistry)?;
        let contract = ITrancheToken::new(token.address(), self.provider.clone());
        contract
            .isVault(vault)
            .call()
            .await
            .map_err(|e| classify("isVault", e))
    }

    async fn set_vault(&self, token: &ContractHandle, vault: Address) -> Result<Receipt> {
        token.require(Capability::VaultRegistry)?;
        let contract = ITrancheToken::new(token.address(), self.provider.clone());
        let pending = contract
            .setVault(vault)
            .send()
            .await
            .map_err(|e| classify("setVault", e))?;
        self.confirm("setVault", pending).await
    }

    async fn is_minter(&self, token: &ContractHandle, account: Address) -> Result<bool> {
        token.require(Capability::MinterRegistry)?;
        let contract = IProtocolToken::new(token.address(), self.provider.clone());
        contract
            .isMinter(account)
            .call()
            .await
            .map_err(|e| classify("isMinter", e))
    }

    async fn add_minter(&self, token: &ContractHandle, account: Address) -> Result<Receipt> {
        token.require(Capability::MinterRegistry)?;
        let contract = IProtocolToken::new(token.address(), self.provider.clone());
        let pending = contract
            .addMinter(account)
            .send()
            .await
            .map_err(|e| classify("addMinter", e))?;
        self.confirm("addMinter", pending).await
    }

    async fn senior_supply_rate(&self, vault: &ContractHandle) -> Result<Amount> {
        vault.require(Capability::SupplyRate)?;
        let contract = ITrancheVault::new(vault.address(), self.provider.clone());
        let rate = contract
            .getCurrentSTSupplyRate()
            .call()
            .await
            .map_err(|e| classify("getCurrentSTSupplyRate", e))?;
        Ok(rate)
    }

    async fn set_senior_supply_rate(&self, vault: &ContractHandle, rate: Amount) -> Result<Receipt> {
        vault.require(Capability::SupplyRate)?;
        let contract = ITrancheVault::new(vault.address(), self.provider.clone());
        let pending = contract
            .setSeniorTokenSupplyRate(rate)
            .send()
            .await
            .map_err(|e| classify("setSeniorTokenSupplyRate", e))?;
        self.confirm("setSeniorTokenSupplyRate", pending).await
    }

    async fn apy(&self, vault: &ContractHandle, tranche: Tranche) -> Result<u64> {
        vault.require(Capability::Apy)?;
        let contract = ITrancheVault::new(vault.address(), self.provider.clone());
        let units = contract
            .getAPY(U256::from(tranche.index()))
            .call()
            .await
            .map_err(|e| classify("getAPY", e))?;
        small("getAPY", units)
    }

    async fn set_apy(&self, vault: &ContractHandle, tranche: Tranche, units: u64) -> Result<Receipt> {
        vault.require(Capability::Apy)?;
        let contract = ITrancheVault::new(vault.address(), self.provider.clone());
        let pending = contract
            .setAPY(U256::from(tranche.index()), U256::from(units))
            .send()
            .await
            .map_err(|e| classify("setAPY", e))?;
        self.confirm("setAPY", pending).await
    }

    async fn current_period(&self, vault: &ContractHandle) -> Result<u64> {
        vault.require(Capability::PeriodClock)?;
        let contract = ITrancheVault::new(vault.address(), self.provider.clone());
        let period = contract
            .getCurrentPeriod()
            .call()
            .await
            .map_err(|e| classify("getCurrentPeriod", e))?;
        small("getCurrentPeriod", period)
    }

    async fn start_time(&self, vault: &ContractHandle) -> Result<Timestamp> {
        vault.require(Capability::PeriodClock)?;
        let contract = ITrancheVault::new(vault.address(), self.provider.clone());
        let start = contract
            .startTime()
            .call()
            .await
            .map_err(|e| classify("startTime", e))?;
        small("startTime", start)
    }

    async fn settle_profits_by_owner(
        &self,
        vault: &ContractHandle,
        batch: &SettlementBatch,
    ) -> Result<Receipt> {
        vault.require(Capability::Settlement)?;
        let contract = ITrancheVault::new(vault.address(), self.provider.clone());
        let pending = contract
            .settleProfitsByOwner(batch.profits, batch.losses)
            .send()
            .await
            .map_err(|e| classify("settleProfitsByOwner", e))?;
        self.confirm("settleProfitsByOwner", pending).await
    }

    async fn invest_by_owner(
        &self,
        vault: &ContractHandle,
        allocation: &Allocation,
    ) -> Result<Receipt> {
        vault.require(Capability::Investment)?;
        let contract = ITrancheVault::new(vault.address(), self.provider.clone());
        let pending = contract
            .investByOwner(allocation.0)
            .send()
            .await
            .map_err(|e| classify("investByOwner", e))?;
        self.confirm("investByOwner", pending).await
    }

    async fn set_reward_distribution_manager(
        &self,
        pool: &ContractHandle,
        manager: Address,
    ) -> Result<Receipt> {
        pool.require(Capability::RewardDistribution)?;
        let contract = IRewardPool::new(pool.address(), self.provider.clone());
        let pending = contract
            .setRewardDistributionManager(manager)
            .send()
            .await
            .map_err(|e| classify("setRewardDistributionManager", e))?;
        self.confirm("setRewardDistributionManager", pending).await
    }

    async fn notify_reward_amount(&self, pool: &ContractHandle, amount: Amount) -> Result<Receipt> {
        pool.require(Capability::RewardDistribution)?;
        let contract = IRewardPool::new(pool.address(), self.provider.clone());
        let pending = contract
            .notifyRewardAmount(amount)
            .send()
            .await
            .map_err(|e| classify("notifyRewardAmount", e))?;
        self.confirm("notifyRewardAmount", pending).await
    }
}

use std::{
    fmt::Display,
    str::FromStr,
    time::{Duration, Instant},
};

use alloy::{
    network::{EthereumWallet, ReceiptResponse},
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::time;
use tracing::{debug, info, instrument};

use crate::{
    error::{AppError, AppResult, LedgerError, LedgerResult},
    ledger::{
        gateway::LedgerGateway,
        models::{Amount, PaymentId, PaymentRecord, Receipt, TransactionHandle},
    },
};

/// Native currency has 18 decimals (wei)
const NATIVE_DECIMALS: u32 = 18;

sol! {
    #[sol(rpc)]
    contract RecurringPayments {
        function getActivePayments() external view returns (uint256[] memory);
        function getPayment(uint256 paymentId) external view returns (
            address recipient,
            uint256 amount,
            uint256 interval,
            uint256 lastPayment,
            bool isActive
        );
        function canExecutePayment(uint256 paymentId) external view returns (bool);
        function executePayment(uint256 paymentId) external;
        function batchExecutePayments(uint256[] calldata paymentIds) external;
    }
}

#[derive(Clone)]
pub struct EvmConfig {
    pub rpc_url: String,
    pub contract_address: String,
    pub private_key: String,
    /// Multiplier applied to the node's gas estimate
    pub gas_limit_buffer: f64,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

/// Ledger gateway backed by an EVM recurring-payments contract
pub struct EvmLedgerGateway {
    config: EvmConfig,
    provider: DynProvider,
    contract: RecurringPayments::RecurringPaymentsInstance<DynProvider>,
    wallet_address: Address,
    contract_address: Address,
}

impl EvmLedgerGateway {
    pub fn new(config: EvmConfig) -> AppResult<Self> {
        let signer = PrivateKeySigner::from_str(config.private_key.trim())
            .map_err(|e| AppError::Config(format!("Invalid PRIVATE_KEY: {}", e)))?;
        let wallet_address = signer.address();

        let contract_address = Address::from_str(config.contract_address.trim())
            .map_err(|e| AppError::Config(format!("Invalid CONTRACT_ADDRESS: {}", e)))?;

        let rpc_url: alloy::transports::http::reqwest::Url = config
            .rpc_url
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid RPC_URL: {}", e)))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(rpc_url)
            .erased();

        let contract = RecurringPayments::new(contract_address, provider.clone());

        info!(
            "✅ Ledger gateway configured: contract={} wallet={}",
            contract_address, wallet_address
        );

        Ok(Self {
            config,
            provider,
            contract,
            wallet_address,
            contract_address,
        })
    }

    pub fn wallet_address(&self) -> Address {
        self.wallet_address
    }

    /// Chain id of the connected node, used as the startup connectivity probe
    pub async fn chain_id(&self) -> LedgerResult<u64> {
        self.provider.get_chain_id().await.map_err(read_err)
    }

    fn gas_limit(&self, estimate: u64) -> u64 {
        let gas_limit = apply_gas_buffer(estimate, self.config.gas_limit_buffer);
        debug!("Gas estimate {} buffered to {}", estimate, gas_limit);
        gas_limit
    }
}

#[async_trait]
impl LedgerGateway for EvmLedgerGateway {
    async fn list_active_payment_ids(&self) -> LedgerResult<Vec<PaymentId>> {
        let ids = self
            .contract
            .getActivePayments()
            .call()
            .await
            .map_err(read_err)?;

        ids.into_iter().map(to_u64).collect()
    }

    async fn is_eligible(&self, id: PaymentId) -> LedgerResult<bool> {
        self.contract
            .canExecutePayment(U256::from(id))
            .call()
            .await
            .map_err(read_err)
    }

    async fn get_payment(&self, id: PaymentId) -> LedgerResult<PaymentRecord> {
        let payment = self
            .contract
            .getPayment(U256::from(id))
            .call()
            .await
            .map_err(read_err)?;

        Ok(PaymentRecord {
            id,
            recipient: payment.recipient.to_checksum(None),
            amount: wei_to_amount(payment.amount)?,
            interval: to_u64(payment.interval)?,
            last_payment: to_u64(payment.lastPayment)?,
            is_active: payment.isActive,
        })
    }

    #[instrument(skip(self))]
    async fn submit_single(&self, id: PaymentId) -> LedgerResult<TransactionHandle> {
        let call = self.contract.executePayment(U256::from(id));
        let estimate = call.estimate_gas().await.map_err(submit_err)?;

        let pending = call
            .gas(self.gas_limit(estimate))
            .send()
            .await
            .map_err(submit_err)?;
        let hash = pending.tx_hash().to_string();

        info!("📤 Payment {} submitted: {}", id, hash);
        Ok(TransactionHandle {
            hash,
            payment_ids: vec![id],
        })
    }

    #[instrument(skip(self))]
    async fn submit_batch(&self, ids: &[PaymentId]) -> LedgerResult<TransactionHandle> {
        let args = ids.iter().map(|id| U256::from(*id)).collect();
        let call = self.contract.batchExecutePayments(args);
        let estimate = call.estimate_gas().await.map_err(submit_err)?;

        let pending = call
            .gas(self.gas_limit(estimate))
            .send()
            .await
            .map_err(submit_err)?;
        let hash = pending.tx_hash().to_string();

        info!("📤 Batch of {} payments submitted: {}", ids.len(), hash);
        Ok(TransactionHandle {
            hash,
            payment_ids: ids.to_vec(),
        })
    }

    async fn await_confirmation(&self, handle: &TransactionHandle) -> LedgerResult<Receipt> {
        let hash = TxHash::from_str(&handle.hash)
            .map_err(|e| LedgerError::Confirmation(format!("Invalid transaction hash: {}", e)))?;

        let start = Instant::now();
        while start.elapsed() < self.config.confirmation_timeout {
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    if !receipt.status() {
                        return Err(LedgerError::Confirmation(format!(
                            "Transaction {} reverted",
                            handle.hash
                        )));
                    }

                    return Ok(Receipt {
                        transaction_hash: handle.hash.clone(),
                        block_number: receipt.block_number(),
                        gas_used: receipt.gas_used(),
                    });
                }
                Ok(None) => debug!("Receipt for {} not available yet", handle.hash),
                Err(e) => debug!("Receipt lookup for {} failed: {}", handle.hash, e),
            }

            time::sleep(self.config.poll_interval).await;
        }

        Err(LedgerError::Confirmation(format!(
            "Transaction {} not confirmed within {}s",
            handle.hash,
            self.config.confirmation_timeout.as_secs()
        )))
    }

    async fn wallet_balance(&self) -> LedgerResult<Amount> {
        let wei = self
            .provider
            .get_balance(self.wallet_address)
            .await
            .map_err(read_err)?;
        wei_to_amount(wei)
    }

    async fn contract_balance(&self) -> LedgerResult<Amount> {
        let wei = self
            .provider
            .get_balance(self.contract_address)
            .await
            .map_err(read_err)?;
        wei_to_amount(wei)
    }
}

fn read_err(e: impl Display) -> LedgerError {
    LedgerError::Gateway(e.to_string())
}

fn submit_err(e: impl Display) -> LedgerError {
    LedgerError::Submission(e.to_string())
}

fn to_u64(value: U256) -> LedgerResult<u64> {
    u64::try_from(value)
        .map_err(|_| LedgerError::Gateway(format!("Value {} does not fit in u64", value)))
}

/// Convert a wei amount into whole currency units
fn wei_to_amount(value: U256) -> LedgerResult<Amount> {
    let wei = i128::try_from(value)
        .map_err(|_| LedgerError::Gateway(format!("Amount {} out of range", value)))?;

    Decimal::try_from_i128_with_scale(wei, NATIVE_DECIMALS)
        .map(|amount| amount.normalize())
        .map_err(|e| LedgerError::Gateway(format!("Amount {} out of range: {}", value, e)))
}

fn apply_gas_buffer(estimate: u64, buffer: f64) -> u64 {
    (estimate as f64 * buffer).ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_wei_to_amount() {
        let half = U256::from(500_000_000_000_000_000u128);
        assert_eq!(wei_to_amount(half).unwrap(), dec!(0.5));

        let dust = U256::from(1u64);
        assert_eq!(wei_to_amount(dust).unwrap(), dec!(0.000000000000000001));

        assert!(wei_to_amount(U256::MAX).is_err());
    }

    #[test]
    fn test_gas_buffer_rounds_up() {
        assert_eq!(apply_gas_buffer(100_000, 1.2), 120_000);
        assert_eq!(apply_gas_buffer(21_001, 1.0), 21_001);
        assert_eq!(apply_gas_buffer(3, 1.5), 5);
    }

    #[test]
    fn test_to_u64_rejects_overflow() {
        assert_eq!(to_u64(U256::from(42u64)).unwrap(), 42);
        assert!(to_u64(U256::MAX).is_err());
    }

    #[test]
    fn test_invalid_key_is_config_error() {
        let result = EvmLedgerGateway::new(EvmConfig {
            rpc_url: "http://localhost:8545".to_string(),
            contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            private_key: "not-a-key".to_string(),
            gas_limit_buffer: 1.2,
            confirmation_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(10),
        });

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}

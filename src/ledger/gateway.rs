use async_trait::async_trait;

use crate::error::LedgerResult;
use crate::ledger::models::{Amount, PaymentId, PaymentRecord, Receipt, TransactionHandle};

/// Gateway trait - the keeper's only view of the payment ledger
///
/// Read operations fail with `LedgerError::Gateway`, submissions with
/// `LedgerError::Submission` and confirmation waits with
/// `LedgerError::Confirmation`.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Identifiers of every payment the ledger reports as active
    async fn list_active_payment_ids(&self) -> LedgerResult<Vec<PaymentId>>;

    /// Ledger's authoritative answer on whether a payment can execute now
    async fn is_eligible(&self, id: PaymentId) -> LedgerResult<bool>;

    /// Fetch a payment record
    async fn get_payment(&self, id: PaymentId) -> LedgerResult<PaymentRecord>;

    /// Broadcast a single payment execution
    async fn submit_single(&self, id: PaymentId) -> LedgerResult<TransactionHandle>;

    /// Broadcast one transaction executing every payment in `ids`
    async fn submit_batch(&self, ids: &[PaymentId]) -> LedgerResult<TransactionHandle>;

    /// Wait until the transaction is mined successfully
    ///
    /// A transaction that lands but reverts is a confirmation failure.
    async fn await_confirmation(&self, handle: &TransactionHandle) -> LedgerResult<Receipt>;

    /// Balance of the keeper's signing wallet
    async fn wallet_balance(&self) -> LedgerResult<Amount>;

    /// Balance held by the ledger contract
    async fn contract_balance(&self) -> LedgerResult<Amount>;
}

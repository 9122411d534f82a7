// Dispatch policy
//
// More than `batch_threshold` due payments: one batch transaction, falling
// back to individual submissions if the batch fails for any reason.
// Otherwise: one transaction per payment.
//
// Failures never propagate to the caller; they are absorbed by the retry
// queue or dropped with a terminal error notification.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::keeper::retry_queue::{RetryOutcome, RetryQueue};
use crate::ledger::{LedgerGateway, PaymentId, Receipt};
use crate::notifications::{EventEmitter, NotificationEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Single,
    Batch,
    /// Batch failed, every payment was re-attempted individually
    BatchFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub mode: DispatchMode,
    pub succeeded: Vec<PaymentId>,
    pub failed: Vec<PaymentId>,
}

/// Outcome of the single-payment path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleOutcome {
    Confirmed,
    /// Failed and queued for retry with this attempt count
    Retrying(u32),
    /// Failed and the attempt ceiling was reached
    Dropped,
}

impl SingleOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, SingleOutcome::Confirmed)
    }
}

pub struct Dispatcher {
    gateway: Arc<dyn LedgerGateway>,
    retry_queue: Arc<RetryQueue>,
    emitter: EventEmitter,
    batch_threshold: usize,
}

impl Dispatcher {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        retry_queue: Arc<RetryQueue>,
        emitter: EventEmitter,
        batch_threshold: usize,
    ) -> Self {
        Self {
            gateway,
            retry_queue,
            emitter,
            batch_threshold,
        }
    }

    /// Submit a set of due payments, batched when there are more than
    /// `batch_threshold` of them
    pub async fn dispatch(&self, ids: &[PaymentId]) -> DispatchReport {
        if ids.len() <= self.batch_threshold {
            let (succeeded, failed) = self.process_each(ids).await;
            return DispatchReport {
                mode: DispatchMode::Single,
                succeeded,
                failed,
            };
        }

        info!("📦 Batch processing {} payments", ids.len());

        match self.submit_batch(ids).await {
            Ok(receipt) => {
                for id in ids {
                    self.retry_queue.clear(*id);
                }

                info!(
                    "✓ Batch of {} payments confirmed (tx: {})",
                    ids.len(),
                    receipt.transaction_hash
                );

                self.emitter
                    .emit(
                        NotificationEvent::success(
                            "Batch Payment Processed",
                            format!("Executed {} payments in one transaction", ids.len()),
                        )
                        .with_payments(ids)
                        .with_transaction(receipt.transaction_hash),
                    )
                    .await;

                DispatchReport {
                    mode: DispatchMode::Batch,
                    succeeded: ids.to_vec(),
                    failed: Vec::new(),
                }
            }
            Err(e) => {
                warn!(
                    "⚠️ Batch of {} payments failed, falling back to individual submission: {}",
                    ids.len(),
                    e
                );

                let (succeeded, failed) = self.process_each(ids).await;
                DispatchReport {
                    mode: DispatchMode::BatchFallback,
                    succeeded,
                    failed,
                }
            }
        }
    }

    async fn process_each(&self, ids: &[PaymentId]) -> (Vec<PaymentId>, Vec<PaymentId>) {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for id in ids {
            if self.process_single(*id).await.is_confirmed() {
                succeeded.push(*id);
            } else {
                failed.push(*id);
            }
        }

        (succeeded, failed)
    }

    async fn submit_batch(&self, ids: &[PaymentId]) -> LedgerResult<Receipt> {
        let handle = self.gateway.submit_batch(ids).await?;
        self.gateway.await_confirmation(&handle).await
    }

    /// Submit one payment and wait for its confirmation.
    ///
    /// Shared by the scan path and the retry drain.
    pub async fn process_single(&self, id: PaymentId) -> SingleOutcome {
        let mut processing = NotificationEvent::info(
            "Processing Payment",
            format!("Submitting payment {}", id),
        )
        .with_payment(id);

        match self.gateway.get_payment(id).await {
            Ok(record) => {
                processing = processing
                    .with_recipient(record.recipient)
                    .with_amount(record.amount);
            }
            Err(e) => warn!("Could not load payment {} details: {}", id, e),
        }

        self.emitter.emit(processing).await;

        match self.submit_single(id).await {
            Ok(receipt) => {
                self.retry_queue.clear(id);

                info!(
                    "✓ Payment {} confirmed (tx: {}, block: {:?})",
                    id, receipt.transaction_hash, receipt.block_number
                );

                self.emitter
                    .emit(
                        NotificationEvent::success(
                            "Payment Processed",
                            format!("Payment {} executed", id),
                        )
                        .with_payment(id)
                        .with_transaction(receipt.transaction_hash),
                    )
                    .await;

                SingleOutcome::Confirmed
            }
            Err(e) => self.handle_failure(id, e).await,
        }
    }

    async fn submit_single(&self, id: PaymentId) -> LedgerResult<Receipt> {
        let handle = self.gateway.submit_single(id).await?;
        self.gateway.await_confirmation(&handle).await
    }

    async fn handle_failure(&self, id: PaymentId, e: LedgerError) -> SingleOutcome {
        match self.retry_queue.record_failure(id) {
            RetryOutcome::Enrolled(attempts) => {
                warn!(
                    "❌ Payment {} failed (attempt {}/{}), queued for retry: {}",
                    id,
                    attempts,
                    self.retry_queue.max_retries(),
                    e
                );
                SingleOutcome::Retrying(attempts)
            }
            RetryOutcome::Exhausted => {
                error!(
                    "❌ Payment {} failed after {} attempts, giving up: {}",
                    id,
                    self.retry_queue.max_retries(),
                    e
                );

                self.emitter
                    .emit(
                        NotificationEvent::error(
                            "Payment Failed",
                            format!(
                                "Payment {} failed after {} attempts",
                                id,
                                self.retry_queue.max_retries()
                            ),
                        )
                        .with_payment(id)
                        .with_error(&e),
                    )
                    .await;

                SingleOutcome::Dropped
            }
        }
    }
}

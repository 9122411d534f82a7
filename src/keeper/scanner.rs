use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::error::LedgerResult;
use crate::keeper::clock::Clock;
use crate::keeper::dispatch::{DispatchReport, Dispatcher};
use crate::keeper::guard::ProcessingGuard;
use crate::ledger::{LedgerGateway, PaymentId, PaymentRecord};
use crate::notifications::{EventEmitter, NotificationEvent};

#[derive(Debug)]
pub enum ScanOutcome {
    /// Another scan held the processing guard; nothing was done
    Skipped,
    Completed(ScanReport),
}

/// Partition of the active payments seen by one scan
#[derive(Debug, Default)]
pub struct ScanReport {
    pub processable: Vec<PaymentId>,
    /// Not due yet, with seconds remaining
    pub not_yet_due: Vec<(PaymentId, u64)>,
    /// Due by timing but refused by the eligibility check
    pub blocked: Vec<PaymentId>,
    pub inactive: Vec<PaymentId>,
    /// Excluded because a ledger read failed
    pub failed_checks: Vec<PaymentId>,
    pub dispatch: Option<DispatchReport>,
}

enum Classification {
    Processable,
    NotYetDue(u64),
    Blocked(PaymentRecord),
    Inactive,
}

/// Discovers due payments and hands them to the dispatcher
pub struct Scanner {
    gateway: Arc<dyn LedgerGateway>,
    dispatcher: Arc<Dispatcher>,
    emitter: EventEmitter,
    clock: Arc<dyn Clock>,
    guard: ProcessingGuard,
}

impl Scanner {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        dispatcher: Arc<Dispatcher>,
        emitter: EventEmitter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            dispatcher,
            emitter,
            clock,
            guard: ProcessingGuard::new(),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.guard.is_held()
    }

    /// Run one scan. Returns `Skipped` without touching the ledger when a
    /// scan is already in progress.
    #[instrument(skip(self))]
    pub async fn scan(&self) -> LedgerResult<ScanOutcome> {
        let Some(_permit) = self.guard.try_acquire() else {
            debug!("⏭️ Scan already in progress, skipping tick");
            return Ok(ScanOutcome::Skipped);
        };

        let ids = self.gateway.list_active_payment_ids().await?;
        let now = self.clock.now();
        let mut report = ScanReport::default();

        debug!("🔍 Checking {} active payments", ids.len());

        for id in ids {
            match self.classify(id, now).await {
                Ok(Classification::Processable) => report.processable.push(id),
                Ok(Classification::NotYetDue(remaining)) => {
                    debug!("Payment {} due in {}s", id, remaining);
                    report.not_yet_due.push((id, remaining));
                }
                Ok(Classification::Blocked(record)) => {
                    warn!("⚠️ Payment {} is due but cannot be executed", id);
                    self.emitter
                        .emit(
                            NotificationEvent::warning(
                                "Payment Blocked",
                                format!(
                                    "Payment {} is due but the ledger refused execution",
                                    id
                                ),
                            )
                            .with_payment(id)
                            .with_recipient(record.recipient)
                            .with_amount(record.amount),
                        )
                        .await;
                    report.blocked.push(id);
                }
                Ok(Classification::Inactive) => report.inactive.push(id),
                Err(e) => {
                    if e.is_read_failure() {
                        warn!("Skipping payment {} this tick: {}", id, e);
                    } else {
                        error!("❌ Unexpected ledger failure for payment {}: {}", id, e);
                    }
                    report.failed_checks.push(id);
                }
            }
        }

        if !report.processable.is_empty() {
            info!("📊 Found {} payments to process", report.processable.len());
            report.dispatch = Some(self.dispatcher.dispatch(&report.processable).await);
        }

        info!(
            "✓ Scan complete: processable={} waiting={} blocked={} inactive={} failed_checks={}",
            report.processable.len(),
            report.not_yet_due.len(),
            report.blocked.len(),
            report.inactive.len(),
            report.failed_checks.len()
        );

        Ok(ScanOutcome::Completed(report))
    }

    async fn classify(&self, id: PaymentId, now: u64) -> LedgerResult<Classification> {
        let record = self.gateway.get_payment(id).await?;
        if !record.is_active {
            return Ok(Classification::Inactive);
        }

        if self.gateway.is_eligible(id).await? {
            return Ok(Classification::Processable);
        }

        if record.is_due(now) {
            Ok(Classification::Blocked(record))
        } else {
            Ok(Classification::NotYetDue(record.seconds_until_due(now)))
        }
    }
}

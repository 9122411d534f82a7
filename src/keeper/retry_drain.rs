use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::keeper::dispatch::{Dispatcher, SingleOutcome};
use crate::keeper::retry_queue::RetryQueue;
use crate::ledger::LedgerGateway;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub attempted: usize,
    pub succeeded: usize,
    /// Still not eligible, left untouched
    pub waiting: usize,
    pub requeued: usize,
    pub exhausted: usize,
    pub failed_checks: usize,
}

/// Re-submits payments from the retry queue on its own schedule
pub struct RetryDrain {
    gateway: Arc<dyn LedgerGateway>,
    dispatcher: Arc<Dispatcher>,
    retry_queue: Arc<RetryQueue>,
}

impl RetryDrain {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        dispatcher: Arc<Dispatcher>,
        retry_queue: Arc<RetryQueue>,
    ) -> Self {
        Self {
            gateway,
            dispatcher,
            retry_queue,
        }
    }

    #[instrument(skip(self))]
    pub async fn drain(&self) -> DrainReport {
        let entries = self.retry_queue.snapshot();
        let mut report = DrainReport::default();

        if entries.is_empty() {
            return report;
        }

        info!("🔄 Processing {} queued retries", entries.len());

        for (id, attempts) in entries {
            // Cleared by a successful scan since the snapshot was taken
            if self.retry_queue.attempts(id).is_none() {
                continue;
            }

            match self.gateway.is_eligible(id).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Payment {} not eligible yet (attempts so far: {})", id, attempts);
                    report.waiting += 1;
                    continue;
                }
                Err(e) if e.is_read_failure() => {
                    warn!("Eligibility check for queued payment {} failed: {}", id, e);
                    report.failed_checks += 1;
                    continue;
                }
                Err(e) => {
                    error!("❌ Unexpected ledger failure for queued payment {}: {}", id, e);
                    report.failed_checks += 1;
                    continue;
                }
            }

            report.attempted += 1;
            match self.dispatcher.process_single(id).await {
                SingleOutcome::Confirmed => report.succeeded += 1,
                SingleOutcome::Retrying(_) => report.requeued += 1,
                SingleOutcome::Dropped => report.exhausted += 1,
            }
        }

        info!(
            "✓ Retry drain complete: attempted={} succeeded={} waiting={} requeued={} exhausted={}",
            report.attempted, report.succeeded, report.waiting, report.requeued, report.exhausted
        );

        report
    }
}

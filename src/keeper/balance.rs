use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::LedgerResult;
use crate::keeper::clock::Clock;
use crate::ledger::models::SECONDS_PER_HOUR;
use crate::ledger::{Amount, LedgerGateway};
use crate::notifications::{EventEmitter, NotificationEvent};

/// Look-ahead window for upcoming obligations
pub const OBLIGATION_WINDOW_SECS: u64 = 24 * SECONDS_PER_HOUR;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    pub wallet_balance: Amount,
    pub contract_balance: Amount,
    /// Sum of payments due within the look-ahead window
    pub upcoming_total: Amount,
    pub warnings: usize,
}

/// Compares wallet and contract balances against thresholds and obligations
pub struct BalanceMonitor {
    gateway: Arc<dyn LedgerGateway>,
    emitter: EventEmitter,
    clock: Arc<dyn Clock>,
    low_balance_threshold: Amount,
}

impl BalanceMonitor {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        emitter: EventEmitter,
        clock: Arc<dyn Clock>,
        low_balance_threshold: Amount,
    ) -> Self {
        Self {
            gateway,
            emitter,
            clock,
            low_balance_threshold,
        }
    }

    /// One balance check. A failed balance or listing read abandons the
    /// check; a failed read of a single payment skips that payment.
    #[instrument(skip(self))]
    pub async fn check(&self) -> LedgerResult<BalanceReport> {
        let mut warnings = 0;

        let wallet_balance = self.gateway.wallet_balance().await?;
        if wallet_balance < self.low_balance_threshold {
            warn!(
                "⚠️ Wallet balance {} below threshold {}",
                wallet_balance, self.low_balance_threshold
            );
            self.emitter
                .emit(
                    NotificationEvent::warning(
                        "Low Wallet Balance",
                        format!(
                            "Keeper wallet holds {} which is below the {} threshold",
                            wallet_balance, self.low_balance_threshold
                        ),
                    )
                    .with_amount(wallet_balance),
                )
                .await;
            warnings += 1;
        }

        let contract_balance = self.gateway.contract_balance().await?;
        let ids = self.gateway.list_active_payment_ids().await?;
        let now = self.clock.now();
        let mut upcoming_total = Decimal::ZERO;

        for id in ids {
            let record = match self.gateway.get_payment(id).await {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping payment {} in balance check: {}", id, e);
                    continue;
                }
            };

            if !record.is_due_within(now, OBLIGATION_WINDOW_SECS) {
                continue;
            }

            upcoming_total += record.amount;

            if record.amount > contract_balance {
                let hours = record.seconds_until_due(now) / SECONDS_PER_HOUR;
                warn!(
                    "⚠️ Contract balance {} cannot cover payment {} ({}) due in {}h",
                    contract_balance, id, record.amount, hours
                );
                self.emitter
                    .emit(
                        NotificationEvent::warning(
                            "Insufficient Contract Balance",
                            format!(
                                "Payment {} of {} is due in {} hours but the contract holds {}",
                                id, record.amount, hours, contract_balance
                            ),
                        )
                        .with_payment(id)
                        .with_recipient(record.recipient)
                        .with_amount(record.amount)
                        .with_hours_remaining(hours),
                    )
                    .await;
                warnings += 1;
            }
        }

        if upcoming_total > contract_balance {
            warn!(
                "⚠️ Payments due in the next 24h total {} against a contract balance of {}",
                upcoming_total, contract_balance
            );
        }

        info!(
            "✓ Balance check complete: wallet={} contract={} upcoming={} warnings={}",
            wallet_balance, contract_balance, upcoming_total, warnings
        );

        Ok(BalanceReport {
            wallet_balance,
            contract_balance,
            upcoming_total,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::EventKind;
    use crate::testing::{payment, FixedClock, MockLedger, RecordingNotifier, T0};
    use rust_decimal_macros::dec;

    fn monitor(ledger: Arc<MockLedger>, notifier: Arc<RecordingNotifier>) -> BalanceMonitor {
        BalanceMonitor::new(
            ledger,
            EventEmitter::new(notifier),
            Arc::new(FixedClock::new(T0)),
            dec!(0.1),
        )
    }

    #[tokio::test]
    async fn test_low_wallet_balance_warns() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_balances(dec!(0.05), dec!(100));
        let notifier = Arc::new(RecordingNotifier::default());

        let report = monitor(ledger, notifier.clone()).check().await.unwrap();

        assert_eq!(report.warnings, 1);
        let warnings = notifier.of_kind(EventKind::Warning);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].amount, Some(dec!(0.05)));
    }

    #[tokio::test]
    async fn test_healthy_wallet_balance_is_quiet() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_balances(dec!(0.2), dec!(100));
        let notifier = Arc::new(RecordingNotifier::default());

        let report = monitor(ledger, notifier.clone()).check().await.unwrap();

        assert_eq!(report.warnings, 0);
        assert!(notifier.events().is_empty());
    }

    #[tokio::test]
    async fn test_underfunded_upcoming_payment_warns_with_hours() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_balances(dec!(1), dec!(5));
        // Due in 5.5 hours, more than the contract holds
        ledger.insert(payment(1, dec!(10), 86400, T0 - 86400 + 19_800), false);
        // Due in 5.5 hours, affordable
        ledger.insert(payment(2, dec!(3), 86400, T0 - 86400 + 19_800), false);
        // Unaffordable but due in two days
        ledger.insert(payment(3, dec!(10), 86400 * 3, T0 - 86400), false);
        let notifier = Arc::new(RecordingNotifier::default());

        let report = monitor(ledger, notifier.clone()).check().await.unwrap();

        assert_eq!(report.warnings, 1);
        assert_eq!(report.upcoming_total, dec!(13));

        let warning = &notifier.of_kind(EventKind::Warning)[0];
        assert_eq!(warning.payment_ids, vec![1]);
        assert_eq!(warning.hours_remaining, Some(5));
    }

    #[tokio::test]
    async fn test_overdue_payment_reports_zero_hours() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_balances(dec!(1), dec!(0.5));
        ledger.insert(payment(4, dec!(1), 3600, T0 - 7200), true);
        let notifier = Arc::new(RecordingNotifier::default());

        monitor(ledger, notifier.clone()).check().await.unwrap();

        assert_eq!(notifier.of_kind(EventKind::Warning)[0].hours_remaining, Some(0));
    }

    #[tokio::test]
    async fn test_inactive_payment_is_ignored() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_balances(dec!(1), dec!(0));
        let mut record = payment(5, dec!(1), 3600, T0 - 3600);
        record.is_active = false;
        ledger.insert(record, false);
        let notifier = Arc::new(RecordingNotifier::default());

        let report = monitor(ledger, notifier.clone()).check().await.unwrap();

        assert_eq!(report.warnings, 0);
        assert_eq!(report.upcoming_total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_balance_read_failure_abandons_check() {
        let ledger = Arc::new(MockLedger::new());
        ledger.fail_balances(true);
        ledger.insert_due(1, T0);
        let notifier = Arc::new(RecordingNotifier::default());

        assert!(monitor(ledger.clone(), notifier.clone()).check().await.is_err());
        assert!(notifier.events().is_empty());
        assert_eq!(ledger.list_calls(), 0);
    }
}

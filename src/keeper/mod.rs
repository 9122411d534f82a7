// Payment keeper: scan, dispatch, retry, balance and pattern components
pub mod analyzer;
pub mod balance;
pub mod clock;
pub mod dispatch;
pub mod guard;
pub mod retry_drain;
pub mod retry_queue;
pub mod scanner;
pub mod scheduler;

use std::sync::Arc;

use crate::ledger::{Amount, LedgerGateway};
use crate::notifications::{EventEmitter, Notifier};

pub use analyzer::{BatchRecommendation, PatternAnalyzer};
pub use balance::{BalanceMonitor, BalanceReport};
pub use clock::{Clock, SystemClock};
pub use dispatch::{DispatchMode, DispatchReport, Dispatcher, SingleOutcome};
pub use retry_drain::{DrainReport, RetryDrain};
pub use retry_queue::{RetryOutcome, RetryQueue};
pub use scanner::{ScanOutcome, ScanReport, Scanner};
pub use scheduler::KeeperScheduler;

#[derive(Debug, Clone)]
pub struct KeeperSettings {
    pub max_retries: u32,
    pub batch_threshold: usize,
    pub low_balance_threshold: Amount,
}

/// Every keeper component, wired to one gateway, one notifier and one
/// shared retry queue
pub struct Keeper {
    pub scanner: Arc<Scanner>,
    pub retry_drain: Arc<RetryDrain>,
    pub balance_monitor: Arc<BalanceMonitor>,
    pub analyzer: Arc<PatternAnalyzer>,
    pub retry_queue: Arc<RetryQueue>,
    pub emitter: EventEmitter,
}

impl Keeper {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        settings: KeeperSettings,
    ) -> Self {
        let emitter = EventEmitter::new(notifier);
        let retry_queue = Arc::new(RetryQueue::new(settings.max_retries));

        let dispatcher = Arc::new(Dispatcher::new(
            gateway.clone(),
            retry_queue.clone(),
            emitter.clone(),
            settings.batch_threshold,
        ));

        let scanner = Arc::new(Scanner::new(
            gateway.clone(),
            dispatcher.clone(),
            emitter.clone(),
            clock.clone(),
        ));

        let retry_drain = Arc::new(RetryDrain::new(
            gateway.clone(),
            dispatcher,
            retry_queue.clone(),
        ));

        let balance_monitor = Arc::new(BalanceMonitor::new(
            gateway.clone(),
            emitter.clone(),
            clock,
            settings.low_balance_threshold,
        ));

        let analyzer = Arc::new(PatternAnalyzer::new(gateway));

        Self {
            scanner,
            retry_drain,
            balance_monitor,
            analyzer,
            retry_queue,
            emitter,
        }
    }
}

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

use crate::ledger::models::PaymentId;

/// Result of recording a failed submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Stored with this attempt count, will be retried by the drain
    Enrolled(u32),
    /// Attempt ceiling reached, entry dropped
    Exhausted,
}

/// Bounded-attempt store of payments whose submission failed.
///
/// Shared by the dispatch path and the drain schedule. Every
/// read-modify-write happens under one lock acquisition and the lock is
/// never held across an await point.
#[derive(Debug)]
pub struct RetryQueue {
    max_retries: u32,
    entries: Mutex<HashMap<PaymentId, u32>>,
}

impl RetryQueue {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Count one more failure for `id`.
    ///
    /// Entries never hold a count of `max_retries`: the failure that would
    /// reach it removes the entry instead.
    pub fn record_failure(&self, id: PaymentId) -> RetryOutcome {
        let mut entries = self.entries.lock();
        let next = entries.get(&id).copied().unwrap_or(0) + 1;

        if next >= self.max_retries {
            entries.remove(&id);
            debug!("Payment {} exhausted {} attempts", id, self.max_retries);
            RetryOutcome::Exhausted
        } else {
            entries.insert(id, next);
            debug!("Payment {} queued for retry (attempt {}/{})", id, next, self.max_retries);
            RetryOutcome::Enrolled(next)
        }
    }

    /// Forget `id` after a successful submission. Idempotent.
    pub fn clear(&self, id: PaymentId) -> bool {
        self.entries.lock().remove(&id).is_some()
    }

    pub fn attempts(&self, id: PaymentId) -> Option<u32> {
        self.entries.lock().get(&id).copied()
    }

    /// Point-in-time copy ordered by payment id
    pub fn snapshot(&self) -> Vec<(PaymentId, u32)> {
        let mut entries: Vec<_> = self
            .entries
            .lock()
            .iter()
            .map(|(id, count)| (*id, *count))
            .collect();
        entries.sort_unstable();
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

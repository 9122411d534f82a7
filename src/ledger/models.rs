use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// On-chain payment identifier
pub type PaymentId = u64;

/// Fixed-point amount in whole currency units
pub type Amount = Decimal;

/// Seconds in one hour
pub const SECONDS_PER_HOUR: u64 = 3600;

/// Recurring payment as stored by the ledger contract.
///
/// Read-only to the keeper: the record only changes through
/// submissions executed by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub recipient: String,
    pub amount: Amount,
    /// Interval between executions, in seconds
    pub interval: u64,
    /// Unix timestamp (seconds) of the last execution
    pub last_payment: u64,
    pub is_active: bool,
}

impl PaymentRecord {
    /// Unix timestamp at which the payment becomes due
    pub fn next_due_at(&self) -> u64 {
        self.last_payment.saturating_add(self.interval)
    }

    /// Active and `now >= last_payment + interval`
    pub fn is_due(&self, now: u64) -> bool {
        self.is_active && now >= self.next_due_at()
    }

    /// Seconds until the payment becomes due, zero once due
    pub fn seconds_until_due(&self, now: u64) -> u64 {
        self.next_due_at().saturating_sub(now)
    }

    /// Active and due at or before `now + window`
    pub fn is_due_within(&self, now: u64, window: u64) -> bool {
        self.is_active && self.seconds_until_due(now) <= window
    }
}

/// Handle to a broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHandle {
    pub hash: String,
    pub payment_ids: Vec<PaymentId>,
}

impl fmt::Display for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// Successful confirmation of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: String,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

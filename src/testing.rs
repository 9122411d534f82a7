// In-memory collaborators for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::error::{DeliveryError, LedgerError, LedgerResult};
use crate::keeper::clock::Clock;
use crate::ledger::{Amount, LedgerGateway, PaymentId, PaymentRecord, Receipt, TransactionHandle};
use crate::notifications::{EventKind, NotificationEvent, Notifier};

pub const T0: u64 = 1_700_000_000;

/// Clock pinned to a settable instant
pub struct FixedClock(AtomicU64);

impl FixedClock {
    pub fn new(now: u64) -> Self {
        Self(AtomicU64::new(now))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn payment(id: PaymentId, amount: Amount, interval: u64, last_payment: u64) -> PaymentRecord {
    PaymentRecord {
        id,
        recipient: format!("0x{:040x}", id),
        amount,
        interval,
        last_payment,
        is_active: true,
    }
}

/// Pauses `list_active_payment_ids` until released
#[derive(Default)]
pub struct ListGate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
struct MockState {
    payments: BTreeMap<PaymentId, PaymentRecord>,
    eligible: HashSet<PaymentId>,
    eligibility_errors: HashSet<PaymentId>,
    payment_errors: HashSet<PaymentId>,
    failing_singles: HashSet<PaymentId>,
    failing_confirmations: HashSet<PaymentId>,
    batch_fails: bool,
    batch_confirmation_fails: bool,
    list_fails: bool,
    balance_fails: bool,
    wallet_balance: Decimal,
    contract_balance: Decimal,
    single_submissions: Vec<PaymentId>,
    batch_submissions: Vec<Vec<PaymentId>>,
    list_calls: usize,
    eligibility_calls: Vec<PaymentId>,
    tx_counter: u64,
}

/// Scriptable ledger gateway
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<MockState>,
    gate: Option<Arc<ListGate>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gate(gate: Arc<ListGate>) -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            gate: Some(gate),
        }
    }

    pub fn insert(&self, record: PaymentRecord, eligible: bool) {
        let mut state = self.state.lock();
        if eligible {
            state.eligible.insert(record.id);
        } else {
            state.eligible.remove(&record.id);
        }
        state.payments.insert(record.id, record);
    }

    /// Payment that became due at `now` and is eligible
    pub fn insert_due(&self, id: PaymentId, now: u64) {
        self.insert(payment(id, Decimal::ONE, 3600, now - 3600), true);
    }

    pub fn set_eligible(&self, id: PaymentId, eligible: bool) {
        let mut state = self.state.lock();
        if eligible {
            state.eligible.insert(id);
        } else {
            state.eligible.remove(&id);
        }
    }

    pub fn fail_eligibility(&self, id: PaymentId) {
        self.state.lock().eligibility_errors.insert(id);
    }

    pub fn fail_get_payment(&self, id: PaymentId) {
        self.state.lock().payment_errors.insert(id);
    }

    pub fn fail_single(&self, id: PaymentId) {
        self.state.lock().failing_singles.insert(id);
    }

    pub fn succeed_single(&self, id: PaymentId) {
        let mut state = self.state.lock();
        state.failing_singles.remove(&id);
        state.failing_confirmations.remove(&id);
    }

    pub fn fail_confirmation(&self, id: PaymentId) {
        self.state.lock().failing_confirmations.insert(id);
    }

    pub fn fail_batch(&self, fails: bool) {
        self.state.lock().batch_fails = fails;
    }

    pub fn fail_batch_confirmation(&self, fails: bool) {
        self.state.lock().batch_confirmation_fails = fails;
    }

    pub fn fail_list(&self, fails: bool) {
        self.state.lock().list_fails = fails;
    }

    pub fn fail_balances(&self, fails: bool) {
        self.state.lock().balance_fails = fails;
    }

    pub fn set_balances(&self, wallet: Decimal, contract: Decimal) {
        let mut state = self.state.lock();
        state.wallet_balance = wallet;
        state.contract_balance = contract;
    }

    pub fn single_submissions(&self) -> Vec<PaymentId> {
        self.state.lock().single_submissions.clone()
    }

    pub fn batch_submissions(&self) -> Vec<Vec<PaymentId>> {
        self.state.lock().batch_submissions.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().list_calls
    }

    pub fn eligibility_calls(&self) -> Vec<PaymentId> {
        self.state.lock().eligibility_calls.clone()
    }

    fn next_hash(state: &mut MockState) -> String {
        state.tx_counter += 1;
        format!("0x{:064x}", state.tx_counter)
    }
}

#[async_trait]
impl LedgerGateway for MockLedger {
    async fn list_active_payment_ids(&self) -> LedgerResult<Vec<PaymentId>> {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let mut state = self.state.lock();
        state.list_calls += 1;
        if state.list_fails {
            return Err(LedgerError::Gateway("list unavailable".into()));
        }
        Ok(state.payments.keys().copied().collect())
    }

    async fn is_eligible(&self, id: PaymentId) -> LedgerResult<bool> {
        let mut state = self.state.lock();
        state.eligibility_calls.push(id);
        if state.eligibility_errors.contains(&id) {
            return Err(LedgerError::Gateway(format!("eligibility read failed for {}", id)));
        }
        Ok(state.eligible.contains(&id))
    }

    async fn get_payment(&self, id: PaymentId) -> LedgerResult<PaymentRecord> {
        let state = self.state.lock();
        if state.payment_errors.contains(&id) {
            return Err(LedgerError::Gateway(format!("payment read failed for {}", id)));
        }
        state
            .payments
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::Gateway(format!("payment {} not found", id)))
    }

    async fn submit_single(&self, id: PaymentId) -> LedgerResult<TransactionHandle> {
        let mut state = self.state.lock();
        state.single_submissions.push(id);
        if state.failing_singles.contains(&id) {
            return Err(LedgerError::Submission(format!("execution of {} reverted", id)));
        }
        Ok(TransactionHandle {
            hash: Self::next_hash(&mut state),
            payment_ids: vec![id],
        })
    }

    async fn submit_batch(&self, ids: &[PaymentId]) -> LedgerResult<TransactionHandle> {
        let mut state = self.state.lock();
        state.batch_submissions.push(ids.to_vec());
        if state.batch_fails {
            return Err(LedgerError::Submission("batch execution reverted".into()));
        }
        Ok(TransactionHandle {
            hash: Self::next_hash(&mut state),
            payment_ids: ids.to_vec(),
        })
    }

    async fn await_confirmation(&self, handle: &TransactionHandle) -> LedgerResult<Receipt> {
        let state = self.state.lock();
        let fails = if handle.payment_ids.len() > 1 {
            state.batch_confirmation_fails
        } else {
            handle
                .payment_ids
                .iter()
                .any(|id| state.failing_confirmations.contains(id))
        };

        if fails {
            return Err(LedgerError::Confirmation(format!(
                "receipt for {} not found",
                handle.hash
            )));
        }

        Ok(Receipt {
            transaction_hash: handle.hash.clone(),
            block_number: Some(state.tx_counter),
            gas_used: 21_000,
        })
    }

    async fn wallet_balance(&self) -> LedgerResult<Amount> {
        let state = self.state.lock();
        if state.balance_fails {
            return Err(LedgerError::Gateway("balance unavailable".into()));
        }
        Ok(state.wallet_balance)
    }

    async fn contract_balance(&self) -> LedgerResult<Amount> {
        let state = self.state.lock();
        if state.balance_fails {
            return Err(LedgerError::Gateway("balance unavailable".into()));
        }
        Ok(state.contract_balance)
    }
}

/// Notifier that keeps every delivered event
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotificationEvent>>,
    attempts: AtomicUsize,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<NotificationEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DeliveryError::Rejected {
                status: 503,
                body: "sink unavailable".into(),
            });
        }
        self.events.lock().push(event.clone());
        Ok(())
    }
}

// Ledger access: payment records, submissions and balances
pub mod evm;
pub mod gateway;
pub mod models;

pub use evm::{EvmConfig, EvmLedgerGateway};
pub use gateway::LedgerGateway;
pub use models::{Amount, PaymentId, PaymentRecord, Receipt, TransactionHandle};

use thiserror::Error;

/// Top-level error type for the keeper process
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Notification error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Startup failed: {0}")]
    Startup(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by the ledger gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Read failure: skip the item for this tick
    #[error("Gateway read failed: {0}")]
    Gateway(String),

    /// Transaction could not be built or broadcast
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Transaction was broadcast but no successful receipt was observed
    #[error("Confirmation failed: {0}")]
    Confirmation(String),
}

impl LedgerError {
    pub fn is_read_failure(&self) -> bool {
        matches!(self, LedgerError::Gateway(_))
    }
}

/// Notification delivery errors. Always swallowed by the emitter.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Webhook request failed: {0}")]
    Request(String),

    #[error("Webhook rejected event with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for DeliveryError {
    fn from(error: reqwest::Error) -> Self {
        DeliveryError::Request(format!("{:?}", error))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl From<rust_decimal::Error> for AppError {
    fn from(error: rust_decimal::Error) -> Self {
        AppError::Config(format!("Decimal conversion error: {:?}", error))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for ledger gateway calls
pub type LedgerResult<T> = Result<T, LedgerError>;

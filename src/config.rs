use std::{fmt, str::FromStr, time::Duration};

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Raw settings as read from the environment
#[derive(Deserialize, Clone)]
struct RawConfig {
    rpc_url: String,
    contract_address: String,
    private_key: String,
    webhook_url: Option<String>,
    low_balance_threshold: String,
    check_interval: u64,
    max_retry_attempts: u32,
    gas_limit_buffer: f64,
    batch_processing_threshold: usize,
    retry_interval: u64,
    balance_check_interval: u64,
    analysis_hour: u32,
    confirmation_timeout: u64,
}

/// Keeper configuration, loaded once at process start
#[derive(Clone)]
pub struct KeeperConfig {
    pub rpc_url: String,
    pub contract_address: String,
    pub private_key: String,
    pub webhook_url: Option<String>,
    pub low_balance_threshold: Decimal,
    pub schedule: ScheduleConfig,
    pub max_retry_attempts: u32,
    pub gas_limit_buffer: f64,
    pub batch_processing_threshold: usize,
    pub confirmation_timeout: Duration,
}

/// Timing of the four independent triggers
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub scan_interval: Duration,
    pub retry_interval: Duration,
    pub balance_check_interval: Duration,
    /// UTC hour of the daily pattern analysis
    pub analysis_hour: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(60),
            retry_interval: Duration::from_secs(300),
            balance_check_interval: Duration::from_secs(3600),
            analysis_hour: 0,
        }
    }
}

impl KeeperConfig {
    pub fn from_env() -> AppResult<Self> {
        let settings = config::Config::builder()
            .set_default("rpc_url", "")?
            .set_default("contract_address", "")?
            .set_default("private_key", "")?
            .set_default("low_balance_threshold", "0.1")?
            .set_default("check_interval", 60)?
            .set_default("max_retry_attempts", 3)?
            .set_default("gas_limit_buffer", 1.2)?
            .set_default("batch_processing_threshold", 3)?
            .set_default("retry_interval", 300)?
            .set_default("balance_check_interval", 3600)?
            .set_default("analysis_hour", 0)?
            .set_default("confirmation_timeout", 120)?
            .add_source(config::Environment::default())
            .build()?;

        let raw: RawConfig = settings.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> AppResult<Self> {
        require("RPC_URL", &raw.rpc_url)?;
        require("CONTRACT_ADDRESS", &raw.contract_address)?;
        require("PRIVATE_KEY", &raw.private_key)?;

        let low_balance_threshold = Decimal::from_str(raw.low_balance_threshold.trim())?;
        if low_balance_threshold.is_sign_negative() {
            return Err(AppError::Config(
                "LOW_BALANCE_THRESHOLD must not be negative".into(),
            ));
        }

        if raw.max_retry_attempts == 0 {
            return Err(AppError::Config("MAX_RETRY_ATTEMPTS must be at least 1".into()));
        }

        if raw.batch_processing_threshold == 0 {
            return Err(AppError::Config(
                "BATCH_PROCESSING_THRESHOLD must be at least 1".into(),
            ));
        }

        if !(raw.gas_limit_buffer >= 1.0) {
            return Err(AppError::Config("GAS_LIMIT_BUFFER must be at least 1.0".into()));
        }

        let intervals = [
            ("CHECK_INTERVAL", raw.check_interval),
            ("RETRY_INTERVAL", raw.retry_interval),
            ("BALANCE_CHECK_INTERVAL", raw.balance_check_interval),
            ("CONFIRMATION_TIMEOUT", raw.confirmation_timeout),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, secs)| *secs == 0) {
            return Err(AppError::Config(format!("{} must be greater than zero", name)));
        }

        if raw.analysis_hour > 23 {
            return Err(AppError::Config("ANALYSIS_HOUR must be between 0 and 23".into()));
        }

        Ok(Self {
            rpc_url: raw.rpc_url,
            contract_address: raw.contract_address,
            private_key: raw.private_key,
            webhook_url: raw.webhook_url.filter(|url| !url.trim().is_empty()),
            low_balance_threshold,
            schedule: ScheduleConfig {
                scan_interval: Duration::from_secs(raw.check_interval),
                retry_interval: Duration::from_secs(raw.retry_interval),
                balance_check_interval: Duration::from_secs(raw.balance_check_interval),
                analysis_hour: raw.analysis_hour,
            },
            max_retry_attempts: raw.max_retry_attempts,
            gas_limit_buffer: raw.gas_limit_buffer,
            batch_processing_threshold: raw.batch_processing_threshold,
            confirmation_timeout: Duration::from_secs(raw.confirmation_timeout),
        })
    }
}

/// Settings of the webhook receiver binary
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiverConfig {
    pub webhook_bind_address: String,
    pub webhook_rate_limit_requests: u32,
    pub webhook_rate_limit_period: u64,
}

impl ReceiverConfig {
    pub fn from_env() -> AppResult<Self> {
        let settings = config::Config::builder()
            .set_default("webhook_bind_address", "0.0.0.0:3001")?
            .set_default("webhook_rate_limit_requests", 100)?
            .set_default("webhook_rate_limit_period", 60)?
            .add_source(config::Environment::default())
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

fn require(name: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Config(format!("{} must be set", name)));
    }
    Ok(())
}

impl fmt::Debug for KeeperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeeperConfig")
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("private_key", &"<redacted>")
            .field("webhook_url", &self.webhook_url)
            .field("low_balance_threshold", &self.low_balance_threshold)
            .field("schedule", &self.schedule)
            .field("max_retry_attempts", &self.max_retry_attempts)
            .field("gas_limit_buffer", &self.gas_limit_buffer)
            .field("batch_processing_threshold", &self.batch_processing_threshold)
            .field("confirmation_timeout", &self.confirmation_timeout)
            .finish()
    }
}

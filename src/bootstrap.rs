use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

use crate::{
    config::KeeperConfig,
    error::{AppError, AppResult},
    keeper::{Keeper, KeeperSettings, SystemClock},
    ledger::{EvmConfig, EvmLedgerGateway},
    notifications::{LogNotifier, Notifier, WebhookNotifier},
};

/// Receipt polling cadence while waiting for confirmation
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub async fn initialize_keeper(config: &KeeperConfig) -> AppResult<Arc<Keeper>> {
    info!("Initializing keeper components ...");

    let gateway = initialize_gateway(config).await?;
    let notifier = initialize_notifier(config)?;

    let settings = KeeperSettings {
        max_retries: config.max_retry_attempts,
        batch_threshold: config.batch_processing_threshold,
        low_balance_threshold: config.low_balance_threshold,
    };

    let keeper = Keeper::new(gateway, notifier, Arc::new(SystemClock), settings);

    info!(
        "✅ Keeper ready: max_retries={} batch_threshold={} low_balance_threshold={}",
        config.max_retry_attempts, config.batch_processing_threshold, config.low_balance_threshold
    );

    Ok(Arc::new(keeper))
}

async fn initialize_gateway(config: &KeeperConfig) -> AppResult<Arc<EvmLedgerGateway>> {
    let gateway = EvmLedgerGateway::new(EvmConfig {
        rpc_url: config.rpc_url.clone(),
        contract_address: config.contract_address.clone(),
        private_key: config.private_key.clone(),
        gas_limit_buffer: config.gas_limit_buffer,
        confirmation_timeout: config.confirmation_timeout,
        poll_interval: RECEIPT_POLL_INTERVAL,
    })?;

    // Test connectivity
    let chain_id = gateway
        .chain_id()
        .await
        .map_err(|e| AppError::Startup(format!("Ledger node unreachable at {}: {}", config.rpc_url, e)))?;

    info!(
        "✅ Connected to chain {} as {}",
        chain_id,
        gateway.wallet_address()
    );

    Ok(Arc::new(gateway))
}

fn initialize_notifier(config: &KeeperConfig) -> AppResult<Arc<dyn Notifier>> {
    match &config.webhook_url {
        Some(url) => {
            let notifier = WebhookNotifier::new(url.clone())?;
            info!("✅ Webhook notifications enabled: {}", notifier.endpoint());
            Ok(Arc::new(notifier))
        }
        None => {
            warn!("⚠️  WEBHOOK_URL not set - notifications will only be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

use std::process::ExitCode;

use anyhow::Context;
use payment_keeper::{
    bootstrap,
    config::KeeperConfig,
    keeper::KeeperScheduler,
    notifications::NotificationEvent,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,payment_keeper=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    info!("🚀 Starting Payment Keeper");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ Keeper failed to start: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> anyhow::Result<KeeperConfig> {
    KeeperConfig::from_env().context("Failed to load keeper configuration")
}

async fn run() -> anyhow::Result<()> {
    let config = load_config()?;
    info!("Loaded configuration: {:?}", config);

    let keeper = bootstrap::initialize_keeper(&config)
        .await
        .context("Failed to initialize keeper")?;

    keeper
        .emitter
        .emit(NotificationEvent::info(
            "Payment Keeper Started",
            format!(
                "Monitoring contract {} every {}s",
                config.contract_address,
                config.schedule.scan_interval.as_secs()
            ),
        ))
        .await;

    let scheduler = KeeperScheduler::new(config.schedule.clone(), keeper);
    let handles = scheduler.start();

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    info!("🛑 Shutting down Payment Keeper");
    for handle in handles {
        handle.abort();
    }

    Ok(())
}

use anyhow::Context;
use payment_keeper::{
    config::ReceiverConfig,
    middleware::RateLimitLayer,
    server,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,payment_keeper=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("🚀 Starting keeper webhook receiver");

    let config = ReceiverConfig::from_env().context("Failed to load receiver configuration")?;
    let rate_limit = RateLimitLayer::new(
        config.webhook_rate_limit_requests,
        config.webhook_rate_limit_period,
    )
    .context("Invalid webhook rate limit")?;

    let app = server::create_app(rate_limit);
    server::run_server(app, &config.webhook_bind_address)
        .await
        .context("Webhook receiver stopped")?;

    Ok(())
}

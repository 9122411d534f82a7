use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::{
    error::{AppError, AppResult},
    middleware::{rate_limit_middleware, RateLimitLayer},
    notifications::{EventKind, NotificationEvent},
};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "payment-keeper-webhook-receiver".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Logs an incoming keeper notification at the level matching its type
pub async fn receive_notification(Json(event): Json<NotificationEvent>) -> Json<WebhookAck> {
    let payments = if event.payment_ids.is_empty() {
        String::new()
    } else {
        format!(" payments={:?}", event.payment_ids)
    };

    match event.kind {
        EventKind::Info => info!("ℹ️ {}: {}{}", event.title, event.message, payments),
        EventKind::Success => info!("✅ {}: {}{}", event.title, event.message, payments),
        EventKind::Warning => warn!("⚠️ {}: {}{}", event.title, event.message, payments),
        EventKind::Error => error!(
            "❌ {}: {}{} error={}",
            event.title,
            event.message,
            payments,
            event.error.as_deref().unwrap_or("-")
        ),
    }

    if let Some(hash) = &event.transaction_hash {
        info!("   transaction {}", hash);
    }

    Json(WebhookAck { received: true })
}

pub fn create_app(rate_limit: RateLimitLayer) -> Router {
    info!("⚙️ Setting up HTTP routes...");

    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/webhook",
            post(receive_notification)
                .layer(middleware::from_fn_with_state(rate_limit, rate_limit_middleware)),
        )
        // Add request tracing
        .layer(TraceLayer::new_for_http());

    info!("✓ HTTP routes configured");
    app
}

pub async fn run_server(app: Router, bind_address: &str) -> AppResult<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .map_err(|e| AppError::Startup(format!("Cannot bind {}: {}", bind_address, e)))?;
    info!("🌐 Webhook receiver listening on: {}", bind_address);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;
    Ok(())
}

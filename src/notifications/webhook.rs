// Notification transports
//
// Webhook: JSON POST of the event to the configured endpoint
// Log: fallback when no endpoint is configured

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::DeliveryError;
use crate::notifications::event::{EventKind, NotificationEvent};

/// Delivery capability for notification events
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, event: &NotificationEvent) -> Result<(), DeliveryError>;
}

/// Posts events to an HTTP webhook
pub struct WebhookNotifier {
    endpoint: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(endpoint: String) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(event)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected { status, body });
        }

        debug!("📨 Notification delivered: {} ({})", event.title, event.id);
        Ok(())
    }
}

/// Writes events to the log only
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<(), DeliveryError> {
        match event.kind {
            EventKind::Info | EventKind::Success => {
                info!("🔔 [{}] {}: {}", event.kind, event.title, event.message)
            }
            EventKind::Warning => warn!("🔔 [{}] {}: {}", event.kind, event.title, event.message),
            EventKind::Error => error!("🔔 [{}] {}: {}", event.kind, event.title, event.message),
        }
        Ok(())
    }
}

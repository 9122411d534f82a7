use std::sync::Arc;
use tracing::warn;

use crate::notifications::{event::NotificationEvent, webhook::Notifier};

/// Single "emit event" capability shared by every keeper component.
///
/// Delivery is best-effort: failures are logged here and never reach the
/// caller.
#[derive(Clone)]
pub struct EventEmitter {
    notifier: Arc<dyn Notifier>,
}

impl EventEmitter {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn emit(&self, event: NotificationEvent) {
        if let Err(e) = self.notifier.send(&event).await {
            warn!(
                "⚠️ Notification '{}' ({}) not delivered: {}",
                event.title, event.kind, e
            );
        }
    }
}

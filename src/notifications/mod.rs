// Operational notifications: event records, transports and the emitter
pub mod emitter;
pub mod event;
pub mod webhook;

pub use emitter::EventEmitter;
pub use event::{EventKind, NotificationEvent};
pub use webhook::{LogNotifier, Notifier, WebhookNotifier};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::ledger::models::{Amount, PaymentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Info,
    Success,
    Warning,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Info => "info",
            EventKind::Success => "success",
            EventKind::Warning => "warning",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable notification record delivered to the configured sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payment_ids: Vec<PaymentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_remaining: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(kind: EventKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            message: message.into(),
            payment_ids: Vec::new(),
            recipient: None,
            amount: None,
            transaction_hash: None,
            error: None,
            hours_remaining: None,
            timestamp: Utc::now(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventKind::Info, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventKind::Success, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventKind::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventKind::Error, title, message)
    }

    pub fn with_payment(mut self, id: PaymentId) -> Self {
        self.payment_ids = vec![id];
        self
    }

    pub fn with_payments(mut self, ids: &[PaymentId]) -> Self {
        self.payment_ids = ids.to_vec();
        self
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_transaction(mut self, hash: impl Into<String>) -> Self {
        self.transaction_hash = Some(hash.into());
        self
    }

    pub fn with_error(mut self, error: impl fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_hours_remaining(mut self, hours: u64) -> Self {
        self.hours_remaining = Some(hours);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = NotificationEvent::success("Payment Processed", "Payment 7 executed")
            .with_payment(7)
            .with_amount(dec!(0.25))
            .with_transaction("0xabc");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "success");
        assert_eq!(json["paymentIds"], serde_json::json!([7]));
        assert_eq!(json["amount"], "0.25");
        assert_eq!(json["transactionHash"], "0xabc");
        assert!(json.get("error").is_none());
        assert!(json.get("hoursRemaining").is_none());
    }

    #[test]
    fn test_event_roundtrips_through_receiver_shape() {
        let event = NotificationEvent::warning("Low Balance", "Wallet below threshold")
            .with_hours_remaining(5);

        let json = serde_json::to_string(&event).unwrap();
        let parsed: NotificationEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.kind, EventKind::Warning);
        assert_eq!(parsed.hours_remaining, Some(5));
        assert!(parsed.payment_ids.is_empty());
    }
}

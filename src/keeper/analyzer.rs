use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::LedgerResult;
use crate::ledger::{LedgerGateway, PaymentId};

/// Groups larger than this are worth batching
pub const BATCH_RECOMMENDATION_MIN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecommendation {
    pub interval: u64,
    pub payment_ids: Vec<PaymentId>,
}

/// Read-only aggregation of payment schedules. Logs only, no notifications.
pub struct PatternAnalyzer {
    gateway: Arc<dyn LedgerGateway>,
}

impl PatternAnalyzer {
    pub fn new(gateway: Arc<dyn LedgerGateway>) -> Self {
        Self { gateway }
    }

    #[instrument(skip(self))]
    pub async fn analyze(&self) -> LedgerResult<Vec<BatchRecommendation>> {
        let ids = self.gateway.list_active_payment_ids().await?;
        let mut groups: BTreeMap<u64, Vec<PaymentId>> = BTreeMap::new();

        for id in ids {
            match self.gateway.get_payment(id).await {
                Ok(record) if record.is_active => {
                    groups.entry(record.interval).or_default().push(id)
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping payment {} in pattern analysis: {}", id, e),
            }
        }

        info!("📊 Payment pattern analysis: {} interval groups", groups.len());

        let mut recommendations = Vec::new();
        for (interval, payment_ids) in groups {
            info!("   interval {}s: {} payments", interval, payment_ids.len());

            if payment_ids.len() > BATCH_RECOMMENDATION_MIN {
                info!(
                    "💡 {} payments share a {}s interval and could be batched: {:?}",
                    payment_ids.len(),
                    interval,
                    payment_ids
                );
                recommendations.push(BatchRecommendation {
                    interval,
                    payment_ids,
                });
            }
        }

        Ok(recommendations)
    }
}

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, governor::clock::DefaultClock>>,
}

impl RateLimitLayer {
    /// Allow `requests` per `per_seconds`, replenished evenly over the period
    pub fn new(requests: u32, per_seconds: u64) -> AppResult<Self> {
        let burst = NonZeroU32::new(requests)
            .ok_or_else(|| AppError::Config("Rate limit must allow at least one request".into()))?;

        let replenish = Duration::from_secs(per_seconds) / burst.get();
        let quota = Quota::with_period(replenish)
            .ok_or_else(|| AppError::Config("Rate limit period must be greater than zero".into()))?
            .allow_burst(burst);

        Ok(RateLimitLayer {
            limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    pub fn check(&self) -> Result<(), Response> {
        self.limiter.check().map_err(|_| {
            warn!("🚫 Rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded. Please try again later.",
            )
                .into_response()
        })
    }
}

/// Rejects with 429 once the shared limiter is exhausted
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitLayer>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, Response> {
    rate_limit.check()?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_is_enforced() {
        let layer = RateLimitLayer::new(2, 60).unwrap();
        assert!(layer.check().is_ok());
        assert!(layer.check().is_ok());

        let rejected = layer.check().unwrap_err();
        assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_zero_quota_is_rejected() {
        assert!(RateLimitLayer::new(0, 60).is_err());
        assert!(RateLimitLayer::new(10, 0).is_err());
    }
}

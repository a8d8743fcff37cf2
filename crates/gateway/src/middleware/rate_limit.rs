//! Rate limiting middleware using token bucket algorithm

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use sangat_common::errors::AppError;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Shared limiter plus the configured rate, for error reporting
#[derive(Clone)]
pub struct RateLimitState {
    limiter: Arc<DefaultDirectRateLimiter>,
    per_second: u32,
}

impl RateLimitState {
    /// Zero values fall back to one request per second with no extra burst
    pub fn new(requests_per_second: u32, burst: u32) -> Self {
        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(per_second);
        let quota = Quota::per_second(per_second).allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            per_second: per_second.get(),
        }
    }

    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

/// Rejects with 429 once the bucket is empty
pub async fn rate_limit(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.check() {
        tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
        return Err(AppError::RateLimited {
            limit: state.per_second,
        });
    }
    Ok(next.run(request).await)
}

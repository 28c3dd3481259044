//! Governor-based rate limiting for the login endpoint.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::context::AppContext;
use crate::error::AppError;

/// A shared rate limiter instance.
pub type SharedLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const FALLBACK_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => unreachable!(),
};

/// Create a rate limiter with the given requests-per-minute quota.
///
/// A quota of zero falls back to 10 per minute.
pub fn create_limiter(requests_per_minute: u32) -> SharedLimiter {
    let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(FALLBACK_PER_MINUTE);
    Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)))
}

/// Returns 429 Too Many Requests once the login quota is spent.
pub async fn login_rate_limit(
    State(ctx): State<AppContext>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if ctx.login_limiter.check().is_err() {
        tracing::warn!("Login rate limit exceeded");
        return AppError::from(rh_core::Error::RateLimited(
            "too many login attempts; try again later".into(),
        ))
        .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_allows_burst_then_rejects() {
        let limiter = create_limiter(3);
        for _ in 0..3 {
            assert!(limiter.check().is_ok());
        }
        assert!(limiter.check().is_err());
    }

    #[test]
    fn zero_quota_uses_fallback() {
        let limiter = create_limiter(0);
        for _ in 0..10 {
            assert!(limiter.check().is_ok());
        }
        assert!(limiter.check().is_err());
    }
}

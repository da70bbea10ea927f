//! Rate limiting middleware

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::InMemoryState};
use std::num::NonZeroU32;
use std::sync::Arc;

use clinical_core::{IssueType, OperationOutcome};

/// Rate limiter state (shared across requests)
pub type SharedRateLimiter =
    Arc<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>>;

/// Create a limiter allowing `requests_per_second`; zero means one.
pub fn create_rate_limiter(requests_per_second: u32) -> SharedRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

pub async fn rate_limit_middleware(request: Request<Body>, next: Next) -> Response {
    let limiter = request.extensions().get::<SharedRateLimiter>().cloned();

    if let Some(limiter) = limiter {
        if limiter.check().is_err() {
            metrics::counter!("rate_limited_requests_total").increment(1);
            let outcome = OperationOutcome::error(
                IssueType::Throttled,
                "Rate limit exceeded. Please try again later.",
            );
            return (StatusCode::TOO_MANY_REQUESTS, Json(outcome)).into_response();
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rps_still_admits_one_request() {
        let limiter = create_rate_limiter(0);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}

//! Rate limiting for the login endpoint.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password guessing.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};
use tracing::warn;

use crate::auth::{AuthError, extract_client_ip};

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

const LOGIN_PER_SEC: NonZeroU32 = NonZeroU32::new(5).unwrap();
const LOGIN_BURST: NonZeroU32 = NonZeroU32::new(10).unwrap();

/// Rate limiting configuration for authentication endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Per-IP limiter for login (5 requests per second, burst of 10)
    pub login: Arc<IpLimiter>,
}

impl RateLimitConfig {
    /// Create rate limiters with default configuration.
    pub fn new() -> Self {
        Self::with_login_quota(Quota::per_second(LOGIN_PER_SEC).allow_burst(LOGIN_BURST))
    }

    /// Create rate limiters with a custom login quota.
    pub fn with_login_quota(quota: Quota) -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(quota)),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware for rate limiting the login endpoint.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = match extract_client_ip(request.extensions()) {
        Ok(ip) => ip,
        Err(_) => {
            return AuthError::ClientIpUnavailable.into_response();
        }
    };

    match config.login.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            warn!(ip = %ip, "Login rate limit exceeded");
            AuthError::RateLimited.into_response()
        }
    }
}

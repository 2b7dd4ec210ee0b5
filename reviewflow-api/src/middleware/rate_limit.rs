/// Rate limiting middleware
///
/// A single in-process token bucket shared by every request. The bucket
/// holds `burst` tokens and refills at `requests_per_second`.
///
/// # Algorithm
///
/// - Tokens refill at constant rate
/// - Each request consumes 1 token
/// - Request blocked if bucket empty
///
/// # Headers
///
/// Every response includes:
/// - `X-RateLimit-Limit`: Bucket capacity
/// - `X-RateLimit-Remaining`: Tokens remaining
///
/// 429 responses also carry `Retry-After` (seconds).

use crate::app::AppState;
use crate::config::RateLimitConfig;
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tokio::sync::Mutex;

/// Token bucket state
#[derive(Debug, Clone)]
struct TokenBucket {
    /// Current number of tokens
    tokens: f64,

    /// Last refill instant
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a new full bucket
    fn new(capacity: u32) -> Self {
        TokenBucket {
            tokens: capacity as f64,
            last_refill: Instant::now(),
        }
    }

    /// Refills tokens based on time elapsed since `last_refill`
    fn refill(&mut self, now: Instant, rate: f64, capacity: u32) {
        let elapsed_secs = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed_secs * rate).min(capacity as f64);
        self.last_refill = now;
    }

    /// Attempts to consume N tokens
    fn try_consume(&mut self, count: f64) -> bool {
        if self.tokens >= count {
            self.tokens -= count;
            true
        } else {
            false
        }
    }

    /// Calculates seconds until N tokens available
    fn seconds_until_available(&self, count: f64, rate: f64) -> u64 {
        let deficit = count - self.tokens;
        if deficit <= 0.0 {
            0
        } else {
            (deficit / rate).ceil() as u64
        }
    }
}

/// Outcome of one admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Admitted; tokens left afterwards
    Allowed { remaining: u32 },

    /// Rejected; seconds until a token is available
    Limited { retry_after: u64 },
}

/// Global token-bucket limiter
#[derive(Debug)]
pub struct RateLimiter {
    rate: f64,
    capacity: u32,
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// Builds a limiter, or None when limiting is disabled
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        if !config.enabled() {
            return None;
        }

        Some(Self {
            rate: config.requests_per_second as f64,
            capacity: config.burst,
            bucket: Mutex::new(TokenBucket::new(config.burst)),
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Takes one token if available
    pub async fn check(&self) -> Decision {
        self.check_at(Instant::now()).await
    }

    async fn check_at(&self, now: Instant) -> Decision {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(now, self.rate, self.capacity);

        if bucket.try_consume(1.0) {
            Decision::Allowed {
                remaining: bucket.tokens.floor() as u32,
            }
        } else {
            Decision::Limited {
                retry_after: bucket.seconds_until_available(1.0, self.rate).max(1),
            }
        }
    }
}

/// Rate limiting middleware layer
///
/// Returns 429 when the shared bucket is empty; passes everything through
/// when limiting is disabled.
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(limiter) = state.rate_limiter.as_deref() else {
        return Ok(next.run(request).await);
    };

    match limiter.check().await {
        Decision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", HeaderValue::from(limiter.capacity()));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
            Ok(response)
        }
        Decision::Limited { retry_after } => {
            tracing::warn!(retry_after, "Rate limit exceeded");
            Err(ApiError::RateLimitExceeded { retry_after })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn limiter(requests_per_second: u32, burst: u32) -> RateLimiter {
        RateLimiter::from_config(&RateLimitConfig {
            requests_per_second,
            burst,
        })
        .unwrap()
    }

    #[test]
    fn test_disabled_when_rate_is_zero() {
        let config = RateLimitConfig {
            requests_per_second: 0,
            burst: 10,
        };
        assert!(RateLimiter::from_config(&config).is_none());
    }

    #[test]
    fn test_token_bucket_consume() {
        let mut bucket = TokenBucket::new(10);
        assert!(bucket.try_consume(1.0));
        assert_eq!(bucket.tokens, 9.0);
        assert!(bucket.try_consume(5.0));
        assert_eq!(bucket.tokens, 4.0);
        assert!(!bucket.try_consume(10.0));
        assert_eq!(bucket.tokens, 4.0); // Unchanged after failed attempt
    }

    #[test]
    fn test_token_bucket_refill_capped() {
        let start = Instant::now();
        let mut bucket = TokenBucket {
            tokens: 95.0,
            last_refill: start,
        };

        bucket.refill(start + Duration::from_secs(10), 1.0, 100);
        assert_eq!(bucket.tokens, 100.0);
    }

    #[test]
    fn test_token_bucket_seconds_until_available() {
        let bucket = TokenBucket {
            tokens: 2.0,
            last_refill: Instant::now(),
        };

        // Need 5 tokens, have 2, rate is 1/sec -> need 3 seconds
        assert_eq!(bucket.seconds_until_available(5.0, 1.0), 3);
        assert_eq!(bucket.seconds_until_available(1.0, 1.0), 0);
    }

    #[tokio::test]
    async fn test_burst_then_limited_then_refilled() {
        let limiter = limiter(1, 2);
        let start = Instant::now();

        assert_eq!(limiter.check_at(start).await, Decision::Allowed { remaining: 1 });
        assert_eq!(limiter.check_at(start).await, Decision::Allowed { remaining: 0 });
        assert_eq!(
            limiter.check_at(start).await,
            Decision::Limited { retry_after: 1 }
        );

        let later = start + Duration::from_millis(1500);
        assert_eq!(limiter.check_at(later).await, Decision::Allowed { remaining: 0 });
    }
}

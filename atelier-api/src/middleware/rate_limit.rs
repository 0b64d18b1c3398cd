/// Per-IP rate limiting for abuse-prone endpoints
///
/// Token bucket rate limiting keyed by client IP, held in process memory.
/// Two scopes exist with different budgets:
///
/// - **auth**: 10 requests per 15 minutes (login, register, password reset)
/// - **form**: 20 requests per hour (inquiries, applications, newsletter)
///
/// # Algorithm
///
/// Token bucket: tokens refill at a constant rate, each request consumes
/// one, and a request with an empty bucket gets a 429 with `Retry-After`.
///
/// The client IP is taken from `X-Forwarded-For` (first entry) or
/// `X-Real-IP`; requests without either share one bucket, which only
/// happens when no reverse proxy is configured.

use axum::{extract::Request, middleware::Next, response::Response};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ApiError;

/// One client's bucket state.
#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: u64,
}

impl TokenBucket {
    fn new(capacity: u32) -> Self {
        TokenBucket {
            tokens: capacity as f64,
            last_refill: now_secs(),
        }
    }

    fn refill(&mut self, rate: f64, capacity: u32) {
        let now = now_secs();
        let elapsed = now.saturating_sub(self.last_refill) as f64;
        self.tokens = (self.tokens + elapsed * rate).min(capacity as f64);
        self.last_refill = now;
    }

    fn try_consume(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn seconds_until_available(&self, rate: f64) -> u64 {
        let deficit = 1.0 - self.tokens;
        if deficit <= 0.0 {
            0
        } else {
            (deficit / rate).ceil() as u64
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// In-memory per-key rate limiter.
///
/// Stale buckets (full again after idling) are dropped opportunistically
/// whenever the map grows past a threshold, so the map stays bounded by
/// recent distinct clients.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    capacity: u32,
    refill_rate: f64,
    window_seconds: u64,
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub retry_after: u64,
}

impl RateLimiter {
    /// `capacity` requests per `window_seconds`, refilling evenly.
    pub fn new(capacity: u32, window_seconds: u64) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            capacity,
            refill_rate: capacity as f64 / window_seconds as f64,
            window_seconds,
        }
    }

    /// 10 requests per 15 minutes, for credential endpoints.
    pub fn for_auth() -> Self {
        Self::new(10, 15 * 60)
    }

    /// 20 requests per hour, for public form submissions.
    pub fn for_forms() -> Self {
        Self::new(20, 60 * 60)
    }

    /// Consumes one token for `key`, reporting whether the request may
    /// proceed.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

        if buckets.len() > 10_000 {
            let capacity = self.capacity;
            let rate = self.refill_rate;
            buckets.retain(|_, bucket| {
                let mut probe = bucket.clone();
                probe.refill(rate, capacity);
                probe.tokens < capacity as f64
            });
        }

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity));
        bucket.refill(self.refill_rate, self.capacity);

        if bucket.try_consume() {
            RateLimitDecision {
                allowed: true,
                retry_after: 0,
            }
        } else {
            RateLimitDecision {
                allowed: false,
                retry_after: bucket.seconds_until_available(self.refill_rate),
            }
        }
    }

    pub fn window_seconds(&self) -> u64 {
        self.window_seconds
    }
}

/// Extracts the client IP from proxy headers.
pub fn client_ip(headers: &axum::http::HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Applies one limiter scope to a request, producing 429 when exhausted.
pub async fn enforce(
    limiter: &RateLimiter,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = client_ip(request.headers());
    let decision = limiter.check(&ip);

    if !decision.allowed {
        tracing::warn!(ip = %ip, "Rate limit exceeded");
        return Err(ApiError::RateLimitExceeded {
            retry_after: decision.retry_after,
            message: format!(
                "Too many requests. Try again in {} seconds",
                decision.retry_after
            ),
        });
    }

    Ok(next.run(request).await)
}

/// Middleware for the auth limiter scope. The form limiter is checked
/// inside the submission handlers instead, since those routes mix public
/// and authenticated methods on one path.
pub async fn auth_rate_limit(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&state.auth_limiter, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_consume_and_deny() {
        let limiter = RateLimiter::new(3, 60);

        assert!(limiter.check("1.2.3.4").allowed);
        assert!(limiter.check("1.2.3.4").allowed);
        assert!(limiter.check("1.2.3.4").allowed);

        let denied = limiter.check("1.2.3.4");
        assert!(!denied.allowed);
        assert!(denied.retry_after > 0);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, 60);

        assert!(limiter.check("1.1.1.1").allowed);
        assert!(!limiter.check("1.1.1.1").allowed);
        assert!(limiter.check("2.2.2.2").allowed);
    }

    #[test]
    fn test_auth_and_form_budgets() {
        let auth = RateLimiter::for_auth();
        for _ in 0..10 {
            assert!(auth.check("ip").allowed);
        }
        assert!(!auth.check("ip").allowed);
        assert_eq!(auth.window_seconds(), 900);

        let forms = RateLimiter::for_forms();
        for _ in 0..20 {
            assert!(forms.check("ip").allowed);
        }
        assert!(!forms.check("ip").allowed);
        assert_eq!(forms.window_seconds(), 3600);
    }

    #[test]
    fn test_bucket_refill() {
        let mut bucket = TokenBucket {
            tokens: 0.0,
            last_refill: now_secs() - 30,
        };

        // 1 token/sec for 30 seconds, capped at capacity 10
        bucket.refill(1.0, 10);
        assert_eq!(bucket.tokens, 10.0);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers), "203.0.113.9");
    }

    #[test]
    fn test_client_ip_fallback() {
        assert_eq!(client_ip(&axum::http::HeaderMap::new()), "unknown");
    }
}

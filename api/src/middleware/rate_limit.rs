//! Rate limiting middleware

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use parking_lot::RwLock;
use platform_tenant::TenantId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::ResolvedTenant;
use crate::error::ApiError;
use crate::settings::RateLimitSettings;
use crate::ApiState;

/// Bucket label for requests that name no registered tenant
pub const ANONYMOUS: &str = "anonymous";

/// Remaining-tokens response header
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Idle buckets are swept at most this often
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Whose budget a request spends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitKey {
    Tenant(TenantId),
    Anonymous,
}

impl RateLimitKey {
    /// Key for a request, from the tenant its reference resolved to
    pub fn for_request(request: &Request) -> Self {
        request
            .extensions()
            .get::<ResolvedTenant>()
            .map_or(Self::Anonymous, |t| Self::Tenant(t.0))
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tenant(id) => write!(f, "{id}"),
            Self::Anonymous => f.write_str(ANONYMOUS),
        }
    }
}

/// Token-bucket rate limiter keyed by tenant
pub struct RateLimiter {
    buckets: RwLock<Buckets>,
    config: RateLimitConfig,
}

struct Buckets {
    by_key: HashMap<RateLimitKey, TokenBucket>,
    last_sweep: Instant,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: RwLock::new(Buckets {
                by_key: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            config,
        }
    }

    /// Check if request is allowed
    pub fn check(&self, key: RateLimitKey) -> RateLimitResult {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: RateLimitKey, now: Instant) -> RateLimitResult {
        let mut buckets = self.buckets.write();

        if now.saturating_duration_since(buckets.last_sweep) >= SWEEP_INTERVAL {
            // A bucket that has refilled completely is indistinguishable from a new one
            buckets.by_key.retain(|_, bucket| !bucket.is_full_at(now));
            buckets.last_sweep = now;
        }

        let bucket = buckets
            .by_key
            .entry(key)
            .or_insert_with(|| TokenBucket::new(self.config.refill_per_second(), self.config.burst, now));

        bucket.try_acquire(now)
    }

    /// Number of tracked buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.read().by_key.len()
    }
}

/// Rate limit config
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst: u32,
}

impl RateLimitConfig {
    fn refill_per_second(&self) -> f64 {
        f64::from(self.requests_per_minute) / 60.0
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self {
            requests_per_minute: settings.per_minute,
            burst: settings.burst,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst: 60,
        }
    }
}

/// Token bucket
struct TokenBucket {
    available: f64,
    max: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(rate: f64, burst: u32, now: Instant) -> Self {
        Self {
            available: f64::from(burst),
            max: f64::from(burst),
            refill_rate: rate,
            last_refill: now,
        }
    }

    fn try_acquire(&mut self, now: Instant) -> RateLimitResult {
        self.refill(now);
        if self.available >= 1.0 {
            self.available -= 1.0;
            RateLimitResult::Allowed {
                remaining: self.available.floor() as u32,
            }
        } else {
            let missing = 1.0 - self.available;
            RateLimitResult::Limited {
                retry_after: Duration::from_secs_f64(missing / self.refill_rate),
            }
        }
    }

    fn is_full_at(&self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.available + elapsed.as_secs_f64() * self.refill_rate >= self.max
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.available = (self.available + elapsed.as_secs_f64() * self.refill_rate).min(self.max);
        self.last_refill = now;
    }
}

/// Rate limit result
#[derive(Debug)]
pub enum RateLimitResult {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// Reject requests once the caller's bucket is empty
pub async fn rate_limit(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = RateLimitKey::for_request(&request);

    match state.rate_limiter.check(key) {
        RateLimitResult::Allowed { remaining } => {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert(REMAINING_HEADER, HeaderValue::from(remaining));
            Ok(response)
        }
        RateLimitResult::Limited { retry_after } => {
            tracing::warn!(key = %key, "rate limit exceeded");
            Err(ApiError::RateLimited {
                retry_after_secs: retry_after.as_secs_f64().ceil().max(1.0) as u64,
            })
        }
    }
}

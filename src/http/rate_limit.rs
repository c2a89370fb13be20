//! Rate limiting implementation
//!
//! Two independent mechanisms live here:
//!
//! - [`QuotaGovernor`] reads the quota the API reports on every response and
//!   pauses until the quota window resets once the configured share of it has
//!   been consumed.
//! - [`RateLimiter`] is an optional client-side token bucket (governor crate)
//!   that paces requests regardless of what the server reports.

use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use reqwest::header::HeaderMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Header carrying the number of requests left in the current window
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Header carrying the size of the window
pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
/// Header carrying the epoch second at which the window resets
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Default share of the quota (percent) the connector may consume
pub const DEFAULT_QUOTA_LIMIT: f64 = 50.0;

// ============================================================================
// Quota Governor
// ============================================================================

/// Quota usage reported by a single response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// Requests left in the window
    pub remaining: u64,
    /// Window size
    pub limit: u64,
    /// Unix timestamp (seconds) of the window reset
    pub reset_at: i64,
}

impl RateLimitSnapshot {
    /// Create a snapshot from raw values
    pub fn new(remaining: u64, limit: u64, reset_at: i64) -> Self {
        Self {
            remaining,
            limit,
            reset_at,
        }
    }

    /// Extract a snapshot from response headers.
    ///
    /// Returns `None` if any of the three headers is missing or unparsable,
    /// or if the reported limit is zero.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| headers.get(name)?.to_str().ok()?.trim().parse::<i64>().ok();

        let remaining = u64::try_from(read(REMAINING_HEADER)?).ok()?;
        let limit = u64::try_from(read(LIMIT_HEADER)?).ok()?;
        let reset_at = read(RESET_HEADER)?;

        if limit == 0 {
            return None;
        }

        Some(Self::new(remaining, limit, reset_at))
    }

    /// Percentage of the window already consumed
    pub fn consumed_percent(&self) -> f64 {
        100.0 - 100.0 * self.remaining as f64 / self.limit as f64
    }
}

/// Pauses extraction when API quota consumption reaches a ceiling
#[derive(Debug, Clone, Copy)]
pub struct QuotaGovernor {
    /// Ceiling as a percentage of the window (0, 100]
    quota_limit: f64,
}

impl QuotaGovernor {
    /// Create a governor with the given ceiling (percent consumed)
    pub fn new(quota_limit: f64) -> Self {
        Self { quota_limit }
    }

    /// Configured ceiling
    pub fn quota_limit(&self) -> f64 {
        self.quota_limit
    }

    /// Whether the snapshot is at or over the ceiling
    pub fn should_pause(&self, snapshot: &RateLimitSnapshot) -> bool {
        snapshot.consumed_percent() >= self.quota_limit
    }

    /// How long to pause before the next request, measured from `now`.
    ///
    /// `None` when under the ceiling or when the reset is already in the past.
    pub fn wait_duration(
        &self,
        snapshot: &RateLimitSnapshot,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        if !self.should_pause(snapshot) {
            return None;
        }

        let reset = DateTime::<Utc>::from_timestamp(snapshot.reset_at, 0)?;
        (reset - now).to_std().ok().filter(|d| !d.is_zero())
    }

    /// Observe a snapshot, sleeping until the window resets if required.
    ///
    /// Returns the duration slept, if any.
    pub async fn observe(&self, snapshot: &RateLimitSnapshot) -> Option<Duration> {
        let wait = self.wait_duration(snapshot, Utc::now())?;

        info!(
            consumed = format!("{:.1}%", snapshot.consumed_percent()),
            ceiling = format!("{:.1}%", self.quota_limit),
            "Quota ceiling reached, sleeping {} seconds until {}",
            wait.as_secs(),
            snapshot.reset_at
        );
        tokio::time::sleep(wait).await;

        Some(wait)
    }
}

impl Default for QuotaGovernor {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTA_LIMIT)
    }
}

// ============================================================================
// Client-side pacing
// ============================================================================

/// Configuration for client-side request pacing
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per second
    pub requests_per_second: u32,
    /// Burst size (max tokens in bucket)
    pub burst_size: u32,
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// Pace at `requests_per_second` with a burst of the same size
    pub fn per_second(requests_per_second: u32) -> Self {
        Self::new(requests_per_second, requests_per_second)
    }
}

/// Token bucket rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    pub fn new(config: &RateLimiterConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN));

        Self {
            limiter: Arc::new(Governor::direct(quota)),
        }
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish()
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::header::HeaderValue;

    fn headers(remaining: &str, limit: &str, reset: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(REMAINING_HEADER, HeaderValue::from_str(remaining).unwrap());
        map.insert(LIMIT_HEADER, HeaderValue::from_str(limit).unwrap());
        map.insert(RESET_HEADER, HeaderValue::from_str(reset).unwrap());
        map
    }

    #[test]
    fn test_snapshot_from_headers() {
        let snapshot = RateLimitSnapshot::from_headers(&headers("1990", "2000", "1551398400"));
        assert_eq!(snapshot, Some(RateLimitSnapshot::new(1990, 2000, 1_551_398_400)));
    }

    #[test]
    fn test_snapshot_missing_or_bad_headers() {
        assert!(RateLimitSnapshot::from_headers(&HeaderMap::new()).is_none());
        assert!(RateLimitSnapshot::from_headers(&headers("x", "2000", "1")).is_none());
        assert!(RateLimitSnapshot::from_headers(&headers("10", "0", "1")).is_none());
        assert!(RateLimitSnapshot::from_headers(&headers("-1", "2000", "1")).is_none());
    }

    #[test]
    fn test_consumed_percent() {
        assert!((RateLimitSnapshot::new(1, 100, 0).consumed_percent() - 99.0).abs() < f64::EPSILON);
        assert!((RateLimitSnapshot::new(100, 100, 0).consumed_percent()).abs() < f64::EPSILON);
        assert!((RateLimitSnapshot::new(50, 200, 0).consumed_percent() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pause_threshold_is_inclusive() {
        let governor = QuotaGovernor::new(50.0);
        assert!(governor.should_pause(&RateLimitSnapshot::new(50, 100, 0)));
        assert!(!governor.should_pause(&RateLimitSnapshot::new(51, 100, 0)));
    }

    #[test]
    fn test_default_ceiling_disabled_only_at_full_consumption() {
        let governor = QuotaGovernor::new(100.0);
        assert!(!governor.should_pause(&RateLimitSnapshot::new(1, 100, 0)));
        assert!(governor.should_pause(&RateLimitSnapshot::new(0, 100, 0)));
    }

    #[test]
    fn test_wait_duration_until_reset() {
        let now = Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap();
        let reset = now.timestamp() + 42;
        let governor = QuotaGovernor::new(90.0);

        let wait = governor.wait_duration(&RateLimitSnapshot::new(1, 100, reset), now);
        assert_eq!(wait, Some(Duration::from_secs(42)));
    }

    #[test]
    fn test_wait_duration_never_negative() {
        let now = Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap();
        let governor = QuotaGovernor::new(90.0);

        let past = RateLimitSnapshot::new(1, 100, now.timestamp() - 10);
        assert_eq!(governor.wait_duration(&past, now), None);

        let exact = RateLimitSnapshot::new(1, 100, now.timestamp());
        assert_eq!(governor.wait_duration(&exact, now), None);
    }

    #[test]
    fn test_wait_duration_under_ceiling() {
        let now = Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap();
        let governor = QuotaGovernor::new(90.0);

        let snapshot = RateLimitSnapshot::new(50, 100, now.timestamp() + 60);
        assert_eq!(governor.wait_duration(&snapshot, now), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_sleeps_until_reset() {
        let governor = QuotaGovernor::new(90.0);
        let reset = Utc::now().timestamp() + 30;
        let started = tokio::time::Instant::now();

        let slept = governor
            .observe(&RateLimitSnapshot::new(1, 100, reset))
            .await
            .expect("governor should pause");

        assert!(slept >= Duration::from_secs(29));
        assert!(started.elapsed() >= slept);
    }

    #[tokio::test]
    async fn test_observe_under_ceiling_returns_immediately() {
        let governor = QuotaGovernor::new(90.0);
        let reset = Utc::now().timestamp() + 3600;

        assert!(governor
            .observe(&RateLimitSnapshot::new(99, 100, reset))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_rate_limiter_wait_within_burst() {
        let limiter = RateLimiter::new(&RateLimiterConfig::per_second(100));
        limiter.wait().await;
    }
}

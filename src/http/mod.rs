//! HTTP client module
//!
//! Provides the HTTP transport and the quota handling around it.
//!
//! # Features
//!
//! - **Automatic Retries**: Exponential backoff for network-level failures
//! - **Quota Governor**: Pauses until the quota window resets once the
//!   configured share of it is consumed
//! - **Pacing**: Optional token bucket rate limiter using governor

mod client;
mod rate_limit;

pub use client::{
    BasicCredentials, FetchOutcome, HttpClient, HttpClientConfig, HttpClientConfigBuilder,
    ACCEPT_HEADER_VALUE, DEFAULT_BASE_URL,
};
pub use rate_limit::{
    QuotaGovernor, RateLimitSnapshot, RateLimiter, RateLimiterConfig, DEFAULT_QUOTA_LIMIT,
};

//! HTTP client with retry and pacing
//!
//! Provides the transport used by the pager:
//! - Automatic retries with exponential backoff for network-level failures
//! - Optional client-side pacing through a token bucket
//! - Basic authentication and the versioned `Accept` header
//! - Status classification into [`FetchOutcome`]

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Media type pinning the API version
pub const ACCEPT_HEADER_VALUE: &str = "application/vnd.recurly.v2018-08-09";

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://partner-api.recurly.com";

/// Basic auth credentials
#[derive(Clone)]
pub struct BasicCredentials {
    /// Username (the API key)
    pub username: String,
    /// Password (empty for API key auth)
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &"***")
            .finish_non_exhaustive()
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all relative requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Total attempts for a request that fails at the network level
    pub max_attempts: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Client-side pacing, disabled by default
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
    /// Basic auth applied to every request
    pub basic_auth: Option<BasicCredentials>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("Accept".to_string(), ACCEPT_HEADER_VALUE.to_string());

        Self {
            base_url: None,
            timeout: Duration::from_secs(300),
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            rate_limit: None,
            default_headers,
            user_agent: format!("recurly-extract/{}", env!("CARGO_PKG_VERSION")),
            basic_auth: None,
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the total number of attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts.max(1);
        self
    }

    /// Set backoff bounds
    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Enable client-side pacing
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Authenticate with HTTP Basic
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.basic_auth = Some(BasicCredentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Classified result of a single GET
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx response
    Page {
        /// Raw response body
        body: String,
        /// Response headers (quota headers live here)
        headers: HeaderMap,
    },
    /// 404, the path has no (more) data
    NotFound,
    /// Any other non-success status except 401
    Failed {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },
}

/// HTTP client with retry and pacing
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Check if client-side pacing is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Issue a GET, retrying network-level failures.
    ///
    /// A 401 is returned as `Error::Auth`. Other statuses are never retried;
    /// they are classified into a [`FetchOutcome`] for the caller to act on.
    pub async fn get(&self, path: &str) -> Result<FetchOutcome> {
        let url = self.build_url(path);
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.send_once(&url).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.calculate_backoff(attempt - 1);
                    warn!(
                        "Request error ({}), attempt {}/{}, retrying in {:?}",
                        e, attempt, max_attempts, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_retryable() => {
                    return Err(Error::MaxRetriesExceeded {
                        max_attempts,
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, url: &str) -> Result<FetchOutcome> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        info!("GET request to {}", url);

        let mut req = self.client.get(url);
        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if let Some(ref creds) = self.config.basic_auth {
            req = req.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = req.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        match status {
            s if s.is_success() => {
                debug!("Request succeeded: {} ({} bytes)", url, body.len());
                Ok(FetchOutcome::Page { body, headers })
            }
            StatusCode::UNAUTHORIZED => Err(Error::auth(format!(
                "{url} rejected the API key (401): {body}"
            ))),
            StatusCode::NOT_FOUND => {
                debug!("Not found: {}", url);
                Ok(FetchOutcome::NotFound)
            }
            s => Ok(FetchOutcome::Failed {
                status: s.as_u16(),
                body,
            }),
        }
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }

    /// Calculate backoff delay before retry number `attempt` (0-based)
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let delay = self.config.initial_backoff.saturating_mul(factor);
        std::cmp::min(delay, self.config.max_backoff)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

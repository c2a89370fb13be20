//! Connector configuration
//!
//! Loaded from a JSON or YAML file (chosen by extension) or inline JSON, then
//! validated once. Everything downstream receives the validated value.

use crate::error::{Error, Result};
use crate::http::{
    HttpClient, HttpClientConfig, QuotaGovernor, RateLimiterConfig, DEFAULT_BASE_URL,
    DEFAULT_QUOTA_LIMIT,
};
use crate::resource::ResourceClient;
use crate::types::{parse_timestamp, JsonValue};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

fn default_quota_limit() -> f64 {
    DEFAULT_QUOTA_LIMIT
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    300
}

fn default_checkpoint_interval() -> usize {
    1000
}

/// `quota_limit` arrives either as a number or as a numeric string
fn deserialize_quota_limit<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("quota_limit '{s}' is not a number"))),
    }
}

// ============================================================================
// Config
// ============================================================================

/// Connector configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct RecurlyConfig {
    /// Floor for the first sync of every bookmark
    #[serde(default)]
    pub start_date: String,

    /// Site subdomain
    #[serde(default)]
    pub subdomain: String,

    /// API key, sent as the Basic auth username
    #[serde(default)]
    pub api_key: String,

    /// Percentage of the rate-limit window that may be consumed before pausing
    #[serde(
        default = "default_quota_limit",
        deserialize_with = "deserialize_quota_limit"
    )]
    pub quota_limit: f64,

    /// User agent override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// API host
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Optional client-side pacing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_requests_per_second: Option<u32>,

    /// Records between state checkpoints on root streams
    #[serde(default = "default_checkpoint_interval")]
    pub state_checkpoint_interval: usize,
}

impl std::fmt::Debug for RecurlyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecurlyConfig")
            .field("start_date", &self.start_date)
            .field("subdomain", &self.subdomain)
            .field("api_key", &"***")
            .field("quota_limit", &self.quota_limit)
            .field("user_agent", &self.user_agent)
            .field("base_url", &self.base_url)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("max_requests_per_second", &self.max_requests_per_second)
            .field("state_checkpoint_interval", &self.state_checkpoint_interval)
            .finish()
    }
}

impl RecurlyConfig {
    /// Create a config with the required keys and defaults for the rest
    pub fn new(
        start_date: impl Into<String>,
        subdomain: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            start_date: start_date.into(),
            subdomain: subdomain.into(),
            api_key: api_key.into(),
            quota_limit: default_quota_limit(),
            user_agent: None,
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
            max_requests_per_second: None,
            state_checkpoint_interval: default_checkpoint_interval(),
        }
    }

    /// Point requests at another host
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the quota ceiling
    #[must_use]
    pub fn with_quota_limit(mut self, quota_limit: f64) -> Self {
        self.quota_limit = quota_limit;
        self
    }

    /// Set the checkpoint interval
    #[must_use]
    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.state_checkpoint_interval = interval;
        self
    }

    /// Load and validate a config file (`.yaml`/`.yml` as YAML, anything else as JSON)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config {}: {e}", path.display()))
        })?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        let config: Self = if is_yaml {
            serde_yaml::from_str(&contents)?
        } else {
            serde_json::from_str(&contents)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate inline JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON value
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required keys and value ranges
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("start_date", &self.start_date),
            ("subdomain", &self.subdomain),
            ("api_key", &self.api_key),
        ] {
            if value.trim().is_empty() {
                return Err(Error::missing_field(field));
            }
        }

        parse_timestamp(&self.start_date)
            .map_err(|e| Error::invalid_value("start_date", e.to_string()))?;

        if !(self.quota_limit > 0.0 && self.quota_limit <= 100.0) {
            return Err(Error::invalid_value(
                "quota_limit",
                format!("{} is outside (0, 100]", self.quota_limit),
            ));
        }

        if self.request_timeout_seconds == 0 {
            return Err(Error::invalid_value(
                "request_timeout_seconds",
                "must be positive",
            ));
        }

        if self.state_checkpoint_interval == 0 {
            return Err(Error::invalid_value(
                "state_checkpoint_interval",
                "must be positive",
            ));
        }

        if self.max_requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "max_requests_per_second",
                "must be positive",
            ));
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;

        Ok(())
    }

    /// HTTP settings derived from this config
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.request_timeout_seconds))
            .basic_auth(&self.api_key, "");

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(rps) = self.max_requests_per_second {
            builder = builder.rate_limit(RateLimiterConfig::per_second(rps));
        }

        builder.build()
    }

    /// Quota governor with the configured ceiling
    pub fn governor(&self) -> QuotaGovernor {
        QuotaGovernor::new(self.quota_limit)
    }

    /// Resource client for the configured site
    pub fn resource_client(&self) -> Result<ResourceClient> {
        let http = HttpClient::with_config(self.http_config())?;
        Ok(ResourceClient::new(http, self.governor(), &self.subdomain))
    }
}

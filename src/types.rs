//! Common types used throughout the extractor
//!
//! Shared type aliases, the replication method enum and timestamp parsing
//! used for replication-key comparison.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Replication Method
// ============================================================================

/// How a stream tracks progress between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMethod {
    /// Only fetch rows newer than the stored bookmark
    #[default]
    Incremental,
    /// Fetch everything from the start date, never bookmark
    FullTable,
}

impl ReplicationMethod {
    /// Wire name as used in catalog metadata
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incremental => "INCREMENTAL",
            Self::FullTable => "FULL_TABLE",
        }
    }
}

impl fmt::Display for ReplicationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplicationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INCREMENTAL" => Ok(Self::Incremental),
            "FULL_TABLE" => Ok(Self::FullTable),
            other => Err(Error::config(format!(
                "Unknown replication method '{other}'"
            ))),
        }
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Parse an ISO-8601 timestamp as returned by the API or stored in state.
///
/// Accepts RFC 3339 with any offset, naive date-times (taken as UTC) and
/// bare dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(Error::invalid_timestamp(value, "not an ISO-8601 timestamp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    #[test]
    fn test_replication_method_serde() {
        let method: ReplicationMethod = serde_json::from_str("\"INCREMENTAL\"").unwrap();
        assert_eq!(method, ReplicationMethod::Incremental);

        let json = serde_json::to_string(&ReplicationMethod::FullTable).unwrap();
        assert_eq!(json, "\"FULL_TABLE\"");
    }

    #[test]
    fn test_replication_method_unknown_is_config_error() {
        let err = "LOG_BASED".parse::<ReplicationMethod>().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("LOG_BASED"));
    }

    #[test_case("2019-03-01T10:00:00Z" ; "utc suffix")]
    #[test_case("2019-03-01T10:00:00.000000Z" ; "fractional seconds")]
    #[test_case("2019-03-01T12:00:00+02:00" ; "positive offset")]
    #[test_case("2019-03-01T10:00:00" ; "naive datetime")]
    fn test_parse_timestamp_equivalent_forms(input: &str) {
        let expected = Utc.with_ymd_and_hms(2019, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp(input).unwrap(), expected);
    }

    #[test]
    fn test_parse_bare_date() {
        let expected = Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2019-03-01").unwrap(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("yesterday" ; "word")]
    #[test_case("2019-13-01T00:00:00Z" ; "month out of range")]
    fn test_parse_timestamp_rejects(input: &str) {
        assert!(matches!(
            parse_timestamp(input),
            Err(Error::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_timestamp_comparison_is_not_lexical() {
        // Lexically "+01:00" sorts after "Z", chronologically it is earlier.
        let a = parse_timestamp("2019-03-01T10:30:00+01:00").unwrap();
        let b = parse_timestamp("2019-03-01T10:00:00Z").unwrap();
        assert!(a < b);
    }
}

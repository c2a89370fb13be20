//! Protocol messages
//!
//! One JSON object per line, discriminated by `type`:
//!
//! ```json
//! {"type": "SCHEMA", "stream": "accounts", "schema": {...}, "key_properties": ["id"], "bookmark_properties": ["updated_at"]}
//! {"type": "RECORD", "stream": "accounts", "record": {...}, "time_extracted": "2019-06-01T00:00:00Z"}
//! {"type": "STATE", "value": {"bookmarks": {...}, "currently_syncing": null}}
//! ```

use crate::state::State;
use crate::types::JsonValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message emitted during sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Stream declaration, sent before the stream's first record
    Schema {
        /// Stream name
        stream: String,
        /// JSON schema of the records
        schema: JsonValue,
        /// Primary key fields
        key_properties: Vec<String>,
        /// Replication key fields
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One upserted record
    Record {
        /// Stream name
        stream: String,
        /// The record, untouched
        record: JsonValue,
        /// When the record was read
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_extracted: Option<DateTime<Utc>>,
    },
    /// Full state snapshot
    State {
        /// Bookmarks and `currently_syncing`
        value: JsonValue,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(
        stream: impl Into<String>,
        schema: JsonValue,
        key_properties: &[&str],
        bookmark_properties: &[&str],
    ) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties: key_properties.iter().map(ToString::to_string).collect(),
            bookmark_properties: bookmark_properties.iter().map(ToString::to_string).collect(),
        }
    }

    /// Create a record message stamped with the current time
    pub fn record(stream: impl Into<String>, record: JsonValue) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: Some(Utc::now()),
        }
    }

    /// Create a state message from a snapshot
    pub fn state(state: &State) -> Self {
        Self::State {
            value: serde_json::to_value(state).unwrap_or(JsonValue::Null),
        }
    }

    /// Stream the message belongs to, if any
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }
}

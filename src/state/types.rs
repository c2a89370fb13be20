//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs. The layout
//! is `{"bookmarks": {<key>: {<field>: <timestamp>}}, "currently_syncing": ...}`.

use crate::error::{Error, Result};
use crate::types::{parse_timestamp, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete state for a connector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-key bookmarks. Keys are stream names, or `{parent}_{stream}` for
    /// streams read through several parents.
    #[serde(default)]
    pub bookmarks: BTreeMap<String, JsonObject>,

    /// Stream in flight when the state was written, `None` between streams
    #[serde(default)]
    pub currently_syncing: Option<String>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the stored bookmark value for a key and replication field
    pub fn bookmark(&self, key: &str, field: &str) -> Option<&str> {
        self.bookmarks.get(key)?.get(field)?.as_str()
    }

    /// Stored bookmark, or `floor` when nothing has been stored yet
    pub fn resolve_bookmark(&self, key: &str, field: &str, floor: &str) -> String {
        self.bookmark(key, field).unwrap_or(floor).to_string()
    }

    /// Unconditionally write a bookmark value
    pub fn set_bookmark(&mut self, key: &str, field: &str, value: impl Into<String>) {
        self.bookmarks
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), JsonValue::String(value.into()));
    }

    /// Move a bookmark forward to `candidate` if it is strictly later than the
    /// stored value (or `floor` when nothing is stored).
    ///
    /// Returns whether the bookmark changed. A candidate that is not a
    /// timestamp yields `Error::InvalidTimestamp` and leaves state untouched.
    pub fn advance_bookmark(
        &mut self,
        key: &str,
        field: &str,
        candidate: &str,
        floor: &str,
    ) -> Result<bool> {
        let candidate_ts = parse_timestamp(candidate)?;

        let current = self.bookmark(key, field).unwrap_or(floor);
        let current_ts = parse_timestamp(current).map_err(|e| {
            Error::state(format!("Bookmark '{key}.{field}' is unusable: {e}"))
        })?;

        if candidate_ts > current_ts {
            self.set_bookmark(key, field, candidate);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Remove a bookmark entirely so the next run falls back to the start date
    pub fn clear_bookmark(&mut self, key: &str) -> bool {
        self.bookmarks.remove(key).is_some()
    }

    /// Set the stream currently in flight
    pub fn set_currently_syncing(&mut self, stream: Option<&str>) {
        self.currently_syncing = stream.map(ToString::to_string);
    }
}

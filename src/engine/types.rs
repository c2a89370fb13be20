//! Engine types
//!
//! Configuration, running totals and the per-run summary.

use crate::config::RecurlyConfig;
use serde::Serialize;
use tracing::{error, info};

/// Configuration for sync operation
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Floor for absent bookmarks
    pub start_date: String,
    /// Records between checkpoints on root streams
    pub checkpoint_interval: usize,
}

impl SyncConfig {
    /// Create a sync config
    pub fn new(start_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            checkpoint_interval: 1000,
        }
    }

    /// Set the checkpoint interval
    #[must_use]
    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval;
        self
    }
}

impl From<&RecurlyConfig> for SyncConfig {
    fn from(config: &RecurlyConfig) -> Self {
        Self::new(&config.start_date).with_checkpoint_interval(config.state_checkpoint_interval)
    }
}

/// Statistics from sync operations
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Total records synced
    pub records_synced: u64,
    /// Streams that completed
    pub streams_synced: usize,
    /// Streams that failed or aborted
    pub errors: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: u64) {
        self.records_synced += count;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Add an error
    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// How a stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    /// Ran to exhaustion
    Succeeded,
    /// Failed; later streams still ran
    Failed,
    /// Failed fatally; the run stopped here
    Aborted,
}

/// Outcome of one stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    /// Stream name
    pub stream: String,
    /// Final status
    pub status: StreamStatus,
    /// Records emitted, including those before a failure
    pub records: u64,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Error text for failed streams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Per-stream outcomes in run order
    pub streams: Vec<StreamSummary>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl SyncSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stream outcome
    pub fn push(&mut self, summary: StreamSummary) {
        self.streams.push(summary);
    }

    /// Records emitted across all streams
    pub fn total_records(&self) -> u64 {
        self.streams.iter().map(|s| s.records).sum()
    }

    /// Streams that did not succeed
    pub fn failures(&self) -> Vec<&StreamSummary> {
        self.streams
            .iter()
            .filter(|s| s.status != StreamStatus::Succeeded)
            .collect()
    }

    /// Whether every stream succeeded
    pub fn is_success(&self) -> bool {
        self.failures().is_empty()
    }

    /// Outcome for one stream
    pub fn stream(&self, name: &str) -> Option<&StreamSummary> {
        self.streams.iter().find(|s| s.stream == name)
    }

    /// Log one line per stream plus totals
    pub fn log(&self) {
        for s in &self.streams {
            match &s.error {
                None => info!(
                    "{}: {} records in {}ms",
                    s.stream, s.records, s.duration_ms
                ),
                Some(e) => error!(
                    "{}: {:?} after {} records: {}",
                    s.stream, s.status, s.records, e
                ),
            }
        }
        info!(
            "Sync finished: {} streams, {} records, {} failed, {}ms",
            self.streams.len(),
            self.total_records(),
            self.failures().len(),
            self.duration_ms
        );
    }
}

//! Execution engine module
//!
//! Stream orchestration for a sync run.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Runs the selected streams one after another
//! - `SyncContext` - State plus sink handed to each stream controller
//! - `SyncConfig`, `SyncStats`, `SyncSummary` - Settings, totals and outcome

mod context;
mod types;

pub use context::SyncContext;
pub use types::{StreamStatus, StreamSummary, SyncConfig, SyncStats, SyncSummary};

use crate::catalog::SelectedStream;
use crate::config::RecurlyConfig;
use crate::error::Result;
use crate::output::MessageSink;
use crate::resource::ResourceClient;
use crate::state::StateManager;
use crate::streams::StreamController;
use std::time::Instant;
use tracing::{error, info, warn};

/// Sync engine for orchestrating data extraction
#[derive(Debug)]
pub struct SyncEngine {
    /// Resource client
    client: ResourceClient,
    /// State manager
    state: StateManager,
    /// Sync configuration
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(client: ResourceClient, state: StateManager, config: SyncConfig) -> Self {
        Self {
            client,
            state,
            config,
            stats: SyncStats::default(),
        }
    }

    /// Build an engine from a validated connector config
    pub fn from_config(config: &RecurlyConfig, state: StateManager) -> Result<Self> {
        Ok(Self::new(
            config.resource_client()?,
            state,
            SyncConfig::from(config),
        ))
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Sync `streams` in order.
    ///
    /// A stream that fails is logged and the run moves on. A fatal error
    /// (authentication, configuration) checkpoints state and stops the run.
    pub async fn run(
        &mut self,
        streams: &[SelectedStream],
        sink: &mut dyn MessageSink,
    ) -> Result<SyncSummary> {
        let started = Instant::now();
        let mut summary = SyncSummary::new();
        let mut ctx = SyncContext::new(&self.state, sink);

        for selected in streams {
            let def = selected.definition();
            let stream_started = Instant::now();
            let records_before = ctx.records_emitted();

            info!(
                "Syncing stream: {} ({})",
                def.name, selected.replication_method
            );

            let controller = StreamController::new(
                selected.resource,
                selected.replication_method,
                &self.client,
                &self.config.start_date,
            )
            .with_checkpoint_interval(self.config.checkpoint_interval);

            let result = sync_stream(&controller, &mut ctx).await;
            let records = ctx.records_emitted() - records_before;
            let duration_ms = stream_started.elapsed().as_millis() as u64;
            self.stats.add_records(records);

            match result {
                Ok(_) => {
                    info!("Finished {}: {} records", def.name, records);
                    self.stats.add_stream();
                    summary.push(StreamSummary {
                        stream: def.name.to_string(),
                        status: StreamStatus::Succeeded,
                        records,
                        duration_ms,
                        error: None,
                    });
                }
                Err(e) if e.is_fatal() => {
                    error!("Stream {} aborted the sync: {}", def.name, e);
                    self.stats.add_error();
                    summary.push(StreamSummary {
                        stream: def.name.to_string(),
                        status: StreamStatus::Aborted,
                        records,
                        duration_ms,
                        error: Some(e.to_string()),
                    });

                    if let Err(save_err) = ctx.checkpoint().await {
                        warn!("Failed to persist state after abort: {}", save_err);
                    }
                    if let Err(flush_err) = ctx.flush() {
                        warn!("Failed to flush output after abort: {}", flush_err);
                    }

                    summary.duration_ms = started.elapsed().as_millis() as u64;
                    self.stats.set_duration(summary.duration_ms);
                    summary.log();
                    return Err(e);
                }
                Err(e) => {
                    error!("Stream {} failed: {}", def.name, e);
                    self.stats.add_error();
                    summary.push(StreamSummary {
                        stream: def.name.to_string(),
                        status: StreamStatus::Failed,
                        records,
                        duration_ms,
                        error: Some(e.to_string()),
                    });
                }
            }

            let state = ctx.state();
            state.set_currently_syncing(None).await;
            ctx.checkpoint().await?;
        }

        ctx.checkpoint().await?;
        ctx.flush()?;

        summary.duration_ms = started.elapsed().as_millis() as u64;
        self.stats.set_duration(summary.duration_ms);
        summary.log();

        Ok(summary)
    }
}

async fn sync_stream(controller: &StreamController<'_>, ctx: &mut SyncContext<'_>) -> Result<u64> {
    let def = controller.definition();
    ctx.emit_schema(def)?;
    let state = ctx.state();
    state.set_currently_syncing(Some(def.name)).await;
    controller.sync(ctx).await
}

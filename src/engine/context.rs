//! Per-run sync context
//!
//! Couples the shared state with the message sink so controllers can emit
//! records and checkpoints without knowing where either goes.

use crate::catalog::schema_for;
use crate::error::Result;
use crate::output::{Message, MessageSink};
use crate::state::StateManager;
use crate::streams::StreamDefinition;
use crate::types::JsonValue;

/// State and sink for one sync run
pub struct SyncContext<'a> {
    state: &'a StateManager,
    sink: &'a mut dyn MessageSink,
    records_emitted: u64,
}

impl<'a> SyncContext<'a> {
    /// Create a context
    pub fn new(state: &'a StateManager, sink: &'a mut dyn MessageSink) -> Self {
        Self {
            state,
            sink,
            records_emitted: 0,
        }
    }

    /// Shared state
    pub fn state(&self) -> &'a StateManager {
        self.state
    }

    /// Declare a stream
    pub fn emit_schema(&mut self, def: &StreamDefinition) -> Result<()> {
        self.sink.write(&Message::schema(
            def.name,
            schema_for(def),
            def.primary_key,
            &[def.replication_key],
        ))
    }

    /// Emit one record
    pub fn emit_record(&mut self, stream: &str, record: JsonValue) -> Result<()> {
        self.sink.write(&Message::record(stream, record))?;
        self.records_emitted += 1;
        Ok(())
    }

    /// Persist state and emit it as a state message
    pub async fn checkpoint(&mut self) -> Result<()> {
        self.state.save().await?;
        let snapshot = self.state.snapshot().await;
        self.sink.write(&Message::state(&snapshot))
    }

    /// Flush the sink
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    /// Records emitted over the whole run
    pub fn records_emitted(&self) -> u64 {
        self.records_emitted
    }
}

impl std::fmt::Debug for SyncContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("records_emitted", &self.records_emitted)
            .finish_non_exhaustive()
    }
}

//! Stream controller
//!
//! Drives one stream through its bookmark protocol: resolve the starting
//! bookmark, fetch, advance the bookmark as records pass, emit, checkpoint.
//! The behavior is chosen by the stream's [`StreamKind`].

use super::registry::{Resource, StreamDefinition, StreamKind};
use crate::engine::SyncContext;
use crate::error::{Error, Result};
use crate::resource::ResourceClient;
use crate::state::StateManager;
use crate::types::{JsonValue, ReplicationMethod};
use tracing::{debug, info, warn};

/// Runs one selected stream to exhaustion
#[derive(Debug)]
pub struct StreamController<'a> {
    definition: &'static StreamDefinition,
    method: ReplicationMethod,
    client: &'a ResourceClient,
    start_date: &'a str,
    checkpoint_interval: u64,
}

impl<'a> StreamController<'a> {
    /// Create a controller
    pub fn new(
        resource: Resource,
        method: ReplicationMethod,
        client: &'a ResourceClient,
        start_date: &'a str,
    ) -> Self {
        Self {
            definition: resource.definition(),
            method,
            client,
            start_date,
            checkpoint_interval: 1000,
        }
    }

    /// Records between checkpoints on root streams
    #[must_use]
    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval.max(1) as u64;
        self
    }

    /// Stream descriptor
    pub fn definition(&self) -> &'static StreamDefinition {
        self.definition
    }

    fn incremental(&self) -> bool {
        self.method == ReplicationMethod::Incremental
    }

    /// Sync the stream, returning the number of records emitted
    pub async fn sync(&self, ctx: &mut SyncContext<'_>) -> Result<u64> {
        match self.definition.kind {
            StreamKind::Root => self.sync_root(ctx).await,
            StreamKind::Child { parent } => self.sync_child(ctx, parent).await,
            StreamKind::MultiParent { parents } => {
                let mut total = 0;
                for parent in parents {
                    total += self.sync_parent_pass(ctx, *parent).await?;
                }
                Ok(total)
            }
        }
    }

    /// Starting point: stored bookmark for `key`, else the start date
    async fn begin(&self, state: &StateManager, key: &str, field: &str) -> String {
        if self.incremental() {
            state.resolve_bookmark(key, field, self.start_date).await
        } else {
            self.start_date.to_string()
        }
    }

    /// Advance `key.field` to the record's `field` value if it is later.
    ///
    /// Records whose value is missing or not a timestamp leave the bookmark
    /// alone and are logged.
    async fn track(
        &self,
        state: &StateManager,
        key: &str,
        field: &str,
        record: &JsonValue,
    ) -> Result<()> {
        if !self.incremental() {
            return Ok(());
        }

        let Some(value) = record.get(field).and_then(JsonValue::as_str) else {
            warn!(
                "{} record has no string '{}', bookmark not advanced",
                self.definition.name, field
            );
            return Ok(());
        };

        match state
            .advance_bookmark(key, field, value, self.start_date)
            .await
        {
            Ok(_) => Ok(()),
            Err(Error::InvalidTimestamp { value, message }) => {
                warn!(
                    "{} record has unparsable '{}' ({}: {}), bookmark not advanced",
                    self.definition.name, field, value, message
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn sync_root(&self, ctx: &mut SyncContext<'_>) -> Result<u64> {
        let def = self.definition;
        let key = def.bookmark_key(None);
        let field = def.bookmark_field();
        let state = ctx.state();
        let begin = self.begin(state, &key, field).await;

        debug!("{}: starting from {}", def.name, begin);

        let mut pager = self.client.records(def.resource, def.replication_key, &begin)?;
        let mut count = 0u64;

        while let Some(record) = pager.next().await? {
            self.track(state, &key, field, &record).await?;
            ctx.emit_record(def.name, record)?;
            count += 1;

            if self.incremental() && count % self.checkpoint_interval == 0 {
                ctx.checkpoint().await?;
            }
        }

        Ok(count)
    }

    /// Single parent: the bookmark follows the parent's replication key and
    /// is persisted after every parent.
    async fn sync_child(&self, ctx: &mut SyncContext<'_>, parent: Resource) -> Result<u64> {
        let key = self.definition.bookmark_key(None);
        self.walk_parents(ctx, parent, &key).await
    }

    /// One parent type of a multi-parent stream. The composite bookmark
    /// tracks the stream's own replication key on the parents and is cleared
    /// once every parent of this type has been read.
    async fn sync_parent_pass(&self, ctx: &mut SyncContext<'_>, parent: Resource) -> Result<u64> {
        let key = self.definition.bookmark_key(Some(parent));
        let count = self.walk_parents(ctx, parent, &key).await?;

        if self.incremental() {
            let state = ctx.state();
            state.clear_bookmark(&key).await;
            ctx.checkpoint().await?;
        }

        Ok(count)
    }

    async fn walk_parents(
        &self,
        ctx: &mut SyncContext<'_>,
        parent: Resource,
        key: &str,
    ) -> Result<u64> {
        let def = self.definition;
        let field = def.bookmark_field();
        let state = ctx.state();
        let begin = self.begin(state, key, field).await;

        info!("{}: reading through {} from {}", def.name, parent, begin);

        let mut parents = self.client.substream(def.resource, parent, field, &begin)?;
        let mut count = 0u64;

        while let Some((parent_record, mut children)) = parents.next_parent().await? {
            self.track(state, key, field, &parent_record).await?;

            while let Some(child) = children.next().await? {
                ctx.emit_record(def.name, child)?;
                count += 1;
            }

            if self.incremental() {
                ctx.checkpoint().await?;
            }
        }

        Ok(count)
    }
}

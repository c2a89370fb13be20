//! State manager implementation
//!
//! Provides file-based state persistence with atomic writes. Mutations only
//! touch the in-memory copy; callers decide when a checkpoint is durable by
//! calling [`StateManager::save`].

use super::types::State;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// State manager for persisting and loading state
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Path to the state file (empty for in-memory mode)
    path: PathBuf,
    /// Current state (cached)
    state: Arc<RwLock<State>>,
}

impl StateManager {
    /// Create a new state manager backed by the given path, starting empty
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Arc::new(RwLock::new(State::new())),
        }
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::with_state(State::new())
    }

    /// Create an in-memory state manager seeded with a state
    pub fn with_state(state: State) -> Self {
        Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Create a state manager from a file, loading existing state if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            if contents.trim().is_empty() {
                State::new()
            } else {
                serde_json::from_str(&contents)
                    .map_err(|e| Error::state(format!("Failed to parse state file: {e}")))?
            }
        } else {
            State::new()
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Create a state manager from inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let state: State = serde_json::from_str(json)
            .map_err(|e| Error::state(format!("Failed to parse state JSON: {e}")))?;
        Ok(Self::with_state(state))
    }

    /// Persist to `path` from now on, keeping the current state
    #[must_use]
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    /// Save current state to file (no-op in memory mode)
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)
                .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?
        };

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        Ok(())
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Get the stored bookmark for a key and replication field
    pub async fn bookmark(&self, key: &str, field: &str) -> Option<String> {
        let state = self.state.read().await;
        state.bookmark(key, field).map(ToString::to_string)
    }

    /// Stored bookmark, or `floor` when absent
    pub async fn resolve_bookmark(&self, key: &str, field: &str, floor: &str) -> String {
        let state = self.state.read().await;
        state.resolve_bookmark(key, field, floor)
    }

    /// Advance a bookmark if `candidate` is strictly later; see [`State::advance_bookmark`]
    pub async fn advance_bookmark(
        &self,
        key: &str,
        field: &str,
        candidate: &str,
        floor: &str,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        state.advance_bookmark(key, field, candidate, floor)
    }

    /// Reset a bookmark to absent
    pub async fn clear_bookmark(&self, key: &str) -> bool {
        let mut state = self.state.write().await;
        state.clear_bookmark(key)
    }

    /// Record which stream is in flight
    pub async fn set_currently_syncing(&self, stream: Option<&str>) {
        let mut state = self.state.write().await;
        state.set_currently_syncing(stream);
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

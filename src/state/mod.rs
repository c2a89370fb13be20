//! State management module
//!
//! Handles bookmark tracking, checkpointing, and resumability.
//! State is persisted between sync runs to enable incremental syncs.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Bookmark map plus the `currently_syncing` marker
//! - `StateManager` - Shared handle with file-based persistence

mod manager;
mod types;

pub use manager::StateManager;
pub use types::State;

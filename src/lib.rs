// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Recurly Extract
//!
//! Incremental extraction of Recurly v2018 site data as Singer-style JSON
//! lines: schema, record and state messages on stdout.
//!
//! ## Features
//!
//! - **Ten streams**: accounts, billing info, adjustments, coupon redemptions,
//!   coupons, invoices, plans, plan add-ons, subscriptions, transactions
//! - **Bookmarks**: per-stream replication keys, advanced only forward
//! - **Parent/child reads**: nested collections fetched one parent at a time
//! - **Quota governor**: pauses until the rate-limit window resets
//! - **Retries**: exponential backoff on network failures
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recurly_extract::catalog::all_streams;
//! use recurly_extract::config::RecurlyConfig;
//! use recurly_extract::connector::{Connector, RecurlyConnector};
//! use recurly_extract::output::JsonLinesSink;
//! use recurly_extract::state::StateManager;
//!
//! #[tokio::main]
//! async fn main() -> recurly_extract::Result<()> {
//!     let config = RecurlyConfig::from_file("config.json")?;
//!     let connector = RecurlyConnector::new(config);
//!
//!     let status = connector.check().await?;
//!     assert!(status.success);
//!
//!     let state = StateManager::from_file("state.json")?;
//!     let mut sink = JsonLinesSink::stdout();
//!     let summary = connector.sync(&all_streams(None)?, state, &mut sink).await?;
//!     println!("{} records", summary.total_records());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  SyncEngine: selected streams in order, state flushes     │
//! └───────────────────────────┬──────────────────────────────┘
//!                             │
//! ┌───────────────────────────┴──────────────────────────────┐
//! │  StreamController: root / child / multi-parent bookmarks  │
//! └───────────────────────────┬──────────────────────────────┘
//!                             │
//! ┌───────────────────────────┴──────────────────────────────┐
//! │  ResourceClient: endpoint paths, substream pairing        │
//! └───────────────────────────┬──────────────────────────────┘
//!                             │
//! ┌──────────────┬────────────┴────────────┬─────────────────┐
//! │ RecordPager  │ HttpClient              │ QuotaGovernor   │
//! │ next links   │ auth, retry, backoff    │ pause on quota  │
//! └──────────────┴─────────────────────────┴─────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the extractor
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with retry, rate limiting and the quota governor
pub mod http;

/// Page envelopes and the lazy record pager
pub mod pagination;

/// Endpoint paths and parent/child fetches
pub mod resource;

/// Stream registry and bookmark protocol
pub mod streams;

/// State management and checkpointing
pub mod state;

/// Protocol messages and sinks
pub mod output;

/// Sync orchestration
pub mod engine;

/// Catalog discovery and stream selection
pub mod catalog;

/// Connector configuration
pub mod config;

/// Connector trait
pub mod connector;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use connector::{CheckResult, Connector, RecurlyConnector};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

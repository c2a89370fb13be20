//! CLI module
//!
//! Command-line interface for running the extractor.
//!
//! # Commands
//!
//! - `check` - Test connection to the API
//! - `discover` - Print the stream catalog
//! - `sync` - Extract data from streams as JSON lines on stdout

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;

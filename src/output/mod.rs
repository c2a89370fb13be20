//! Output module
//!
//! Protocol messages and the sinks that carry them downstream.
//!
//! # Overview
//!
//! This module provides:
//! - `Message` - Schema, record and state messages in their JSON line form
//! - `MessageSink` - Destination trait
//! - `JsonLinesSink` - Line-delimited JSON to any writer (stdout in the binary)
//! - `MemorySink` - In-memory collector

mod message;
mod sink;

pub use message::Message;
pub use sink::{JsonLinesSink, MemorySink, MessageSink};

#[cfg(test)]
mod tests;

//! Streams module
//!
//! # Overview
//!
//! - `registry` - Static descriptor for each of the ten streams
//! - `controller` - Bookmark protocol for root, child and multi-parent streams

mod controller;
mod registry;

pub use controller::StreamController;
pub use registry::{
    Resource, StreamDefinition, StreamKind, COUPON_REDEMPTION_PARENTS, STREAMS,
};

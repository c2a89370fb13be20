//! Resource access
//!
//! Builds request paths for each resource and composes parent/child fetches.

mod client;

pub use client::{ResourceClient, SubstreamPager, PAGE_SIZE};

#[cfg(test)]
mod tests;

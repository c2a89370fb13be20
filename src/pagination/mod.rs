//! Pagination module
//!
//! # Overview
//!
//! The API paginates with an opaque cursor: every list page carries a
//! `has_more` flag and the `next` path to request. [`RecordPager`] follows
//! that chain lazily and yields records one at a time in server order.

mod pager;
mod types;

pub use pager::RecordPager;
pub use types::{NextPage, Page, PageShape};

//! Pull-based record pager
//!
//! Walks a collection page by page, buffering one page at a time. Requests
//! are issued lazily: nothing is fetched until the first call to
//! [`RecordPager::next`], and each further page only when the buffer drains.

use super::types::{NextPage, Page, PageShape};
use crate::error::Result;
use crate::http::{FetchOutcome, HttpClient, QuotaGovernor, RateLimitSnapshot};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, error, warn};

/// Lazy sequence of records from one collection path
pub struct RecordPager<'a> {
    client: &'a HttpClient,
    governor: &'a QuotaGovernor,
    shape: PageShape,
    next_path: Option<String>,
    buffer: VecDeque<Value>,
    pages_fetched: usize,
}

impl<'a> RecordPager<'a> {
    /// Create a pager starting at `path`
    pub fn new(
        client: &'a HttpClient,
        governor: &'a QuotaGovernor,
        path: impl Into<String>,
        shape: PageShape,
    ) -> Self {
        Self {
            client,
            governor,
            shape,
            next_path: Some(path.into()),
            buffer: VecDeque::new(),
            pages_fetched: 0,
        }
    }

    /// Next record, fetching the next page when the buffer is empty.
    ///
    /// `Ok(None)` once the collection is exhausted, or when the path answered
    /// 404, a failed status, or a malformed body. Only authentication failures
    /// and exhausted network retries surface as errors.
    pub async fn next(&mut self) -> Result<Option<Value>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }

            let Some(path) = self.next_path.take() else {
                return Ok(None);
            };

            self.fetch_page(&path).await?;
        }
    }

    /// Drain the pager into a vector
    pub async fn collect_all(mut self) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Number of pages decoded so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    async fn fetch_page(&mut self, path: &str) -> Result<()> {
        match self.client.get(path).await? {
            FetchOutcome::Page { body, headers } => {
                if let Some(snapshot) = RateLimitSnapshot::from_headers(&headers) {
                    self.governor.observe(&snapshot).await;
                }

                let page = Page::from_body(&body, self.shape);
                self.pages_fetched += 1;

                if let Some(reason) = &page.malformed {
                    warn!(
                        "Malformed page from {}: {}; keeping {} record(s) and stopping",
                        path,
                        reason,
                        page.records.len()
                    );
                }

                self.buffer.extend(page.records);
                if let NextPage::Continue { path: next } = page.next {
                    self.next_path = Some(next);
                }
            }
            FetchOutcome::NotFound => {
                debug!("No data at {} (404)", path);
            }
            FetchOutcome::Failed { status, body } => {
                error!(
                    "GET {} failed with HTTP {}: {}; stopping pagination for this path",
                    path, status, body
                );
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for RecordPager<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordPager")
            .field("shape", &self.shape)
            .field("next_path", &self.next_path)
            .field("buffered", &self.buffer.len())
            .field("pages_fetched", &self.pages_fetched)
            .finish_non_exhaustive()
    }
}

//! Pagination types
//!
//! A list endpoint answers with a page envelope:
//!
//! ```json
//! {"has_more": true, "next": "/sites/subdomain-acme/accounts?cursor=...", "data": [...]}
//! ```
//!
//! The `next` path is opaque and is followed verbatim.

use serde_json::Value;

/// How an endpoint lays out its response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageShape {
    /// Paginated envelope with `has_more`, `next` and `data`
    #[default]
    List,
    /// A single object which is itself the only record
    Single,
}

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available at this path
    Continue {
        /// Path or absolute URL supplied by the server
        path: String,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// One decoded response body
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Records in server order
    pub records: Vec<Value>,
    /// Where to go next
    pub next: NextPage,
    /// Set when the body did not match the expected shape. Records that could
    /// be recovered are still present; `next` is always `Done`.
    pub malformed: Option<String>,
}

impl Page {
    fn truncated(records: Vec<Value>, reason: impl Into<String>) -> Self {
        Self {
            records,
            next: NextPage::Done,
            malformed: Some(reason.into()),
        }
    }

    /// Decode a response body according to its shape
    pub fn from_body(body: &str, shape: PageShape) -> Self {
        let value: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) => return Self::truncated(Vec::new(), format!("body is not JSON: {e}")),
        };

        match shape {
            PageShape::List => Self::from_envelope(value),
            PageShape::Single => match value {
                Value::Object(_) => Self {
                    records: vec![value],
                    next: NextPage::Done,
                    malformed: None,
                },
                _ => Self::truncated(Vec::new(), "expected a JSON object"),
            },
        }
    }

    fn from_envelope(mut value: Value) -> Self {
        let Some(obj) = value.as_object_mut() else {
            return Self::truncated(Vec::new(), "expected a JSON object envelope");
        };

        let records = match obj.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return Self::truncated(Vec::new(), "missing 'data' array"),
        };

        let Some(has_more) = obj.get("has_more").and_then(Value::as_bool) else {
            return Self::truncated(records, "missing 'has_more' flag");
        };

        if !has_more {
            return Self {
                records,
                next: NextPage::Done,
                malformed: None,
            };
        }

        match obj.get("next").and_then(Value::as_str) {
            Some(path) if !path.is_empty() => Self {
                records,
                next: NextPage::Continue {
                    path: path.to_string(),
                },
                malformed: None,
            },
            _ => Self::truncated(records, "'has_more' is true but 'next' is missing"),
        }
    }
}

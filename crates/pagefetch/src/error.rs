//! Error types for paginated fetching.
//!
//! `FetchError` is what a whole listing can fail with. `PageError` is what a
//! single page can fail with; page errors only escalate to a `FetchError` when
//! they hit discovery or every page.

use std::time::Duration;

use thiserror::Error;

/// A failure reported by a [`crate::PageSource`] for one request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SourceError {
    pub message: String,
    /// HTTP status, when the request got as far as a response.
    pub status: Option<u16>,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

/// Why one page contributed no items.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("request failed: {0}")]
    Source(#[from] SourceError),

    #[error("malformed page body: {0}")]
    Decode(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("cancelled before the page was fetched")]
    Cancelled,

    #[error("short page: expected {expected} items, received {received}")]
    Short { expected: u64, received: u64 },
}

/// A page that was expected but not collected in full. A short page keeps
/// the items it did return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub page: usize,
    pub offset: u64,
    pub error: PageError,
}

impl std::fmt::Display for PageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page {} (offset {}): {}", self.page, self.offset, self.error)
    }
}

/// Errors for a whole listing.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid fetch configuration: {0}")]
    InvalidConfig(String),

    #[error("discovery request failed: {0}")]
    Discovery(PageError),

    #[error("no results")]
    NoResults,

    #[error("listing of {total} items needs {page_count} pages, more than the limit of {max_pages}")]
    TooManyPages {
        total: u64,
        page_count: u64,
        max_pages: u64,
    },

    #[error("deadline exceeded after {completed} of {page_count} pages")]
    DeadlineExceeded { completed: usize, page_count: usize },

    #[error("all {page_count} pages failed; first failure: {first}")]
    AllPagesFailed {
        page_count: usize,
        first: PageFailure,
    },

    #[error("{} of {page_count} pages failed (pages {:?})", .failures.len(), failed_page_numbers(.failures))]
    Partial {
        page_count: usize,
        failures: Vec<PageFailure>,
    },
}

fn failed_page_numbers(failures: &[PageFailure]) -> Vec<usize> {
    failures.iter().map(|f| f.page).collect()
}

//! Bounded concurrent fetching of offset-paginated REST listings.
//!
//! A listing is fetched in three steps:
//!
//! 1. A small discovery request learns the total item count.
//! 2. The page count is derived from the vendor's maximum page size.
//! 3. A fixed pool of workers pulls page indices and issues one GET per page,
//!    with a semaphore capping how many requests are in flight at once.
//!
//! Failed pages are never retried. They are reported next to the collected
//! items in a [`FetchOutcome`], so callers can tell a complete listing from a
//! partial one.
//!
//! ```ignore
//! let fetcher = Fetcher::new(Arc::new(source), FetchConfig::default())?;
//! let outcome = fetcher.fetch_all::<ContactsPage>(&PageRequest::new(url)).await?;
//! if !outcome.is_complete() {
//!     tracing::warn!(pages = ?outcome.failed_pages(), "partial listing");
//! }
//! ```

pub mod config;
pub mod error;
pub mod fetcher;
pub mod request;

pub use config::FetchConfig;
pub use error::{FetchError, PageError, PageFailure, SourceError};
pub use fetcher::{FetchOutcome, Fetcher};
pub use request::{PageRequest, PageSource, Paginated};

use std::time::Duration;

use crate::error::FetchError;

/// Tuning knobs for a paginated fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Largest page the vendor will serve in one response.
    pub max_page_size: u64,
    /// Page size of the discovery request that learns the total count.
    pub discovery_page_size: u64,
    /// Maximum requests in flight at once.
    pub concurrency: usize,
    /// Deadline for a single page request.
    pub request_timeout: Duration,
    /// Deadline for the whole listing, discovery included.
    pub overall_timeout: Duration,
    /// Stop claiming new pages after the first page failure.
    pub fail_fast: bool,
    /// Largest listing, in pages, that will be fetched. Guards against a
    /// corrupt or absurd total from discovery.
    pub max_pages: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_page_size: 100,
            discovery_page_size: 5,
            concurrency: 4,
            request_timeout: Duration::from_secs(30),
            overall_timeout: Duration::from_secs(300),
            fail_fast: false,
            max_pages: 10_000,
        }
    }
}

impl FetchConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_max_page_size(mut self, size: u64) -> Self {
        self.max_page_size = size;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u64) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Number of pages needed to cover `total` items.
    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(self.max_page_size)
    }

    /// Reject settings that would make a fetch hang or divide by zero.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.max_page_size == 0 {
            return Err(FetchError::InvalidConfig(
                "max_page_size must be at least 1".to_string(),
            ));
        }
        if self.discovery_page_size == 0 {
            return Err(FetchError::InvalidConfig(
                "discovery_page_size must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(FetchError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_pages == 0 {
            return Err(FetchError::InvalidConfig(
                "max_pages must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() || self.overall_timeout.is_zero() {
            return Err(FetchError::InvalidConfig(
                "timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::SourceError;

/// A decoded page of a listing.
///
/// Every page reports the listing's total item count alongside its own items.
pub trait Paginated: DeserializeOwned + Send + 'static {
    type Item: Send + 'static;

    /// Total items in the listing, as reported by the vendor.
    fn total(&self) -> u64;

    fn into_items(self) -> Vec<Self::Item>;
}

/// Anything that can perform a GET for one page and hand back the raw body.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get(&self, request: &PageRequest) -> Result<Vec<u8>, SourceError>;
}

/// One request against a paginated endpoint.
///
/// Requests are plain values. Each page is built as its own copy of the base
/// request, so no two in-flight requests share query state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
    params: Vec<(String, String)>,
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: Vec::new(),
            offset: 0,
            limit: 0,
        }
    }

    /// Add a query parameter. `offset` and `limit` are owned by the fetcher
    /// and are ignored here.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if key != "offset" && key != "limit" {
            self.params.push((key, value.into()));
        }
        self
    }

    /// A copy of this request positioned at `offset`.
    pub fn page(&self, offset: u64, limit: u64) -> Self {
        Self {
            url: self.url.clone(),
            params: self.params.clone(),
            offset,
            limit,
        }
    }

    /// Full query string pairs, caller parameters first.
    pub fn query(&self) -> Vec<(String, String)> {
        let mut pairs = self.params.clone();
        pairs.push(("offset".to_string(), self.offset.to_string()));
        pairs.push(("limit".to_string(), self.limit.to_string()));
        pairs
    }
}

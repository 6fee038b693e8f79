//! Shared reqwest plumbing for the vendor clients.

use async_trait::async_trait;
use pagefetch::{PageRequest, PageSource, SourceError};
use serde::de::DeserializeOwned;

use crate::errors::ClientError;

pub const USER_AGENT: &str = concat!("enrollkit/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY: usize = 200;

/// Serves listing pages over HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    http: reqwest::Client,
}

impl HttpPageSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn get(&self, request: &PageRequest) -> Result<Vec<u8>, SourceError> {
        let resp = self
            .http
            .get(&request.url)
            .query(&request.query())
            .send()
            .await
            .map_err(|e| SourceError::new(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::with_status(
                status.as_u16(),
                format!("{status}: {}", truncate(&body)),
            ));
        }

        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| SourceError::new(e.to_string()))
    }
}

/// Check the status and decode a JSON body.
pub async fn read_json<T: DeserializeOwned>(
    vendor: &'static str,
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .map_err(|source| ClientError::Http { vendor, source })?;

    if !status.is_success() {
        return Err(ClientError::Status {
            vendor,
            status: status.as_u16(),
            body: truncate(&String::from_utf8_lossy(&body)).to_string(),
        });
    }

    serde_json::from_slice(&body).map_err(|source| ClientError::Decode { vendor, source })
}

/// Check the status and discard the body.
pub async fn ensure_success(
    vendor: &'static str,
    resp: reqwest::Response,
) -> Result<(), ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status {
        vendor,
        status: status.as_u16(),
        body: truncate(&body).to_string(),
    })
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

//! Typed errors for the vendor clients and the secrets loader.
//!
//! - `ClientError` — HTTP, status and decode failures talking to a vendor
//! - `SecretsError` — missing or malformed per-vendor YAML secrets

use std::path::PathBuf;

use pagefetch::FetchError;
use thiserror::Error;

/// Errors from a vendor REST client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request to {vendor} failed: {source}")]
    Http {
        vendor: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{vendor} returned {status}: {body}")]
    Status {
        vendor: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {vendor} response: {source}")]
    Decode {
        vendor: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{vendor} API key contains characters not allowed in an HTTP header")]
    InvalidApiKey { vendor: &'static str },

    #[error("{what} '{name}' not found")]
    NotFound { what: &'static str, name: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Errors loading a vendor secrets file.
#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("Secrets file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read secrets file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse secrets file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Secrets file {path} is missing required field '{field}'")]
    MissingField { path: PathBuf, field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_vendor_and_code() {
        let err = ClientError::Status {
            vendor: "ActiveCampaign",
            status: 403,
            body: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "ActiveCampaign returned 403: forbidden");
    }

    #[test]
    fn fetch_error_converts_into_client_error() {
        let err: ClientError = FetchError::NoResults.into();
        assert!(matches!(err, ClientError::Fetch(FetchError::NoResults)));
        assert_eq!(err.to_string(), "no results");
    }

    #[test]
    fn missing_field_carries_path() {
        let err = SecretsError::MissingField {
            path: PathBuf::from("/secrets/slack.yaml"),
            field: "webhook_url",
        };
        let text = err.to_string();
        assert!(text.contains("/secrets/slack.yaml"));
        assert!(text.contains("webhook_url"));
    }

    #[test]
    fn not_found_is_matchable() {
        let err = ClientError::NotFound {
            what: "Tag",
            name: "vip".into(),
        };
        assert!(matches!(err, ClientError::NotFound { what: "Tag", .. }));
        assert_eq!(err.to_string(), "Tag 'vip' not found");
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ClientError::InvalidApiKey { vendor: "Slack" });
        assert_std_error(&SecretsError::NotFound {
            path: PathBuf::from("x"),
        });
    }
}

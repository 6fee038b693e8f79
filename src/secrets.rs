//! Per-vendor API credentials, one YAML file per vendor.
//!
//! ```yaml
//! # activecampaign.yaml
//! url: https://youraccount.api-us1.com
//! api_key: 0123456789abcdef
//! ```
//!
//! ```yaml
//! # slack.yaml
//! webhook_url: https://hooks.slack.com/services/T000/B000/XXXX
//! channel: "#enrollments"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::errors::SecretsError;

/// Environment variable that overrides the secrets directory.
pub const SECRETS_DIR_ENV: &str = "ENROLLKIT_SECRETS_DIR";

/// Credentials for the ActiveCampaign v3 API.
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveCampaignSecrets {
    /// Account URL, e.g. `https://acct.api-us1.com`.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
}

/// Incoming-webhook settings for forwarding errors to Slack.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackSecrets {
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub channel: Option<String>,
}

/// A secrets file whose required fields can be checked after parsing.
trait RequiredFields {
    fn missing_field(&self) -> Option<&'static str>;
}

impl RequiredFields for ActiveCampaignSecrets {
    fn missing_field(&self) -> Option<&'static str> {
        if self.url.trim().is_empty() {
            Some("url")
        } else if self.api_key.trim().is_empty() {
            Some("api_key")
        } else {
            None
        }
    }
}

impl RequiredFields for SlackSecrets {
    fn missing_field(&self) -> Option<&'static str> {
        self.webhook_url.trim().is_empty().then_some("webhook_url")
    }
}

/// The directory holding vendor secrets files.
#[derive(Debug, Clone)]
pub struct SecretsDir {
    root: PathBuf,
}

impl SecretsDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Pick the secrets directory: explicit path, then `ENROLLKIT_SECRETS_DIR`,
    /// then the configured path, then `<config dir>/enrollkit/secrets`.
    pub fn resolve(explicit: Option<&Path>, configured: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::new(path);
        }
        if let Ok(path) = std::env::var(SECRETS_DIR_ENV) {
            if !path.is_empty() {
                return Self::new(path);
            }
        }
        if let Some(path) = configured {
            return Self::new(path);
        }
        Self::new(default_secrets_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn activecampaign(&self) -> Result<ActiveCampaignSecrets, SecretsError> {
        self.load("activecampaign.yaml")
    }

    pub fn slack(&self) -> Result<SlackSecrets, SecretsError> {
        self.load("slack.yaml")
    }

    fn load<T: DeserializeOwned + RequiredFields>(&self, file: &str) -> Result<T, SecretsError> {
        let path = self.root.join(file);
        if !path.exists() {
            return Err(SecretsError::NotFound { path });
        }
        let content = std::fs::read_to_string(&path).map_err(|source| SecretsError::Read {
            path: path.clone(),
            source,
        })?;
        let secrets: T = serde_yaml::from_str(&content).map_err(|source| SecretsError::Parse {
            path: path.clone(),
            source,
        })?;
        if let Some(field) = secrets.missing_field() {
            return Err(SecretsError::MissingField { path, field });
        }
        tracing::debug!(path = %path.display(), "loaded secrets");
        Ok(secrets)
    }
}

fn default_secrets_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("enrollkit")
        .join("secrets")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, file: &str, content: &str) {
        std::fs::write(dir.path().join(file), content).unwrap();
    }

    #[test]
    fn loads_activecampaign_secrets() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "activecampaign.yaml",
            "url: https://acct.api-us1.com\napi_key: abc123\n",
        );

        let secrets = SecretsDir::new(dir.path()).activecampaign().unwrap();
        assert_eq!(secrets.url, "https://acct.api-us1.com");
        assert_eq!(secrets.api_key, "abc123");
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let err = SecretsDir::new(dir.path()).activecampaign().unwrap_err();
        match err {
            SecretsError::NotFound { path } => {
                assert_eq!(path, dir.path().join("activecampaign.yaml"));
            }
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn empty_api_key_is_missing_field() {
        let dir = TempDir::new().unwrap();
        write(&dir, "activecampaign.yaml", "url: https://x\napi_key: ''\n");
        let err = SecretsDir::new(dir.path()).activecampaign().unwrap_err();
        assert!(matches!(
            err,
            SecretsError::MissingField {
                field: "api_key",
                ..
            }
        ));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "slack.yaml", "webhook_url: [unclosed\n");
        let err = SecretsDir::new(dir.path()).slack().unwrap_err();
        assert!(matches!(err, SecretsError::Parse { .. }));
    }

    #[test]
    fn slack_channel_is_optional() {
        let dir = TempDir::new().unwrap();
        write(&dir, "slack.yaml", "webhook_url: https://hooks.slack.com/x\n");
        let secrets = SecretsDir::new(dir.path()).slack().unwrap();
        assert!(secrets.channel.is_none());
    }

    #[test]
    fn explicit_dir_wins() {
        let dir = SecretsDir::resolve(Some(Path::new("/tmp/explicit")), Some(Path::new("/cfg")));
        assert_eq!(dir.root(), Path::new("/tmp/explicit"));
    }
}

//! Configuration for enrollkit, read from `enrollkit.toml`.
//!
//! Settings are layered file → environment → CLI. Every key is optional.
//!
//! ```toml
//! [fetch]
//! concurrency = 4
//! max_page_size = 100
//! discovery_page_size = 5
//! request_timeout_secs = 30
//! overall_timeout_secs = 300
//! fail_fast = false
//! max_pages = 10000
//!
//! [paths]
//! secrets_dir = "/etc/enrollkit/secrets"
//!
//! [notify]
//! on_error = true
//! ```

use anyhow::{Context, Result};
use pagefetch::FetchConfig;

use crate::activecampaign::MAX_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment override for `fetch.concurrency`.
pub const CONCURRENCY_ENV: &str = "ENROLLKIT_CONCURRENCY";
/// Environment override for `fetch.request_timeout_secs`.
pub const REQUEST_TIMEOUT_ENV: &str = "ENROLLKIT_REQUEST_TIMEOUT_SECS";

/// Paginated listing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSection {
    /// Maximum page requests in flight per vendor
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Vendor cap on items per page
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    /// Items requested by the total-count probe
    #[serde(default = "default_discovery_page_size")]
    pub discovery_page_size: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_overall_timeout_secs")]
    pub overall_timeout_secs: u64,
    /// Abandon remaining pages after the first failed page
    #[serde(default)]
    pub fail_fast: bool,
    /// Refuse listings that would need more pages than this
    #[serde(default = "default_max_pages")]
    pub max_pages: u64,
}

fn default_concurrency() -> usize {
    4
}

fn default_max_page_size() -> u64 {
    100
}

fn default_discovery_page_size() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_overall_timeout_secs() -> u64 {
    300
}

fn default_max_pages() -> u64 {
    10_000
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_page_size: default_max_page_size(),
            discovery_page_size: default_discovery_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            overall_timeout_secs: default_overall_timeout_secs(),
            fail_fast: false,
            max_pages: default_max_pages(),
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsSection {
    /// Directory of per-vendor secrets YAML files
    #[serde(default)]
    pub secrets_dir: Option<PathBuf>,
}

/// Error forwarding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifySection {
    /// Forward command failures to the Slack webhook
    #[serde(default)]
    pub on_error: bool,
}

/// The parsed `enrollkit.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollToml {
    #[serde(default)]
    pub fetch: FetchSection,
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub notify: NotifySection,
}

impl EnrollToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse enrollkit.toml")
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize enrollkit.toml")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(CONCURRENCY_ENV).and_then(|v| v.trim().parse().ok()) {
            self.fetch.concurrency = value;
        }
        if let Some(value) = lookup(REQUEST_TIMEOUT_ENV).and_then(|v| v.trim().parse().ok()) {
            self.fetch.request_timeout_secs = value;
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Settings handed to the listing fetcher.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            max_page_size: self.fetch.max_page_size,
            discovery_page_size: self.fetch.discovery_page_size,
            concurrency: self.fetch.concurrency,
            request_timeout: Duration::from_secs(self.fetch.request_timeout_secs),
            overall_timeout: Duration::from_secs(self.fetch.overall_timeout_secs),
            fail_fast: self.fetch.fail_fast,
            max_pages: self.fetch.max_pages,
        }
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Err(e) = self.fetch_config().validate() {
            warnings.push(e.to_string());
        }
        if self.fetch.max_page_size > MAX_PAGE_SIZE {
            warnings.push(format!(
                "fetch.max_page_size = {} exceeds ActiveCampaign's cap of {MAX_PAGE_SIZE}; ActiveCampaign commands will refuse to run",
                self.fetch.max_page_size
            ));
        }
        if self.fetch.concurrency > 10 {
            warnings.push(format!(
                "fetch.concurrency = {} is likely to hit vendor rate limits",
                self.fetch.concurrency
            ));
        }
        if self.fetch.overall_timeout_secs < self.fetch.request_timeout_secs {
            warnings.push(
                "fetch.overall_timeout_secs is shorter than a single request timeout".to_string(),
            );
        }
        warnings
    }
}

/// Default location of `enrollkit.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("enrollkit")
        .join("enrollkit.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_matches_fetch_defaults() {
        let toml = EnrollToml::default();
        assert_eq!(toml.fetch_config(), FetchConfig::default());
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let toml = EnrollToml::parse(
            r#"
[fetch]
concurrency = 2
fail_fast = true
"#,
        )
        .unwrap();
        assert_eq!(toml.fetch.concurrency, 2);
        assert!(toml.fetch.fail_fast);
        assert_eq!(toml.fetch.max_page_size, 100);
        assert_eq!(toml.fetch.request_timeout_secs, 30);
        assert!(!toml.notify.on_error);
    }

    #[test]
    fn test_parse_paths_and_notify() {
        let toml = EnrollToml::parse(
            r#"
[paths]
secrets_dir = "/etc/enrollkit/secrets"

[notify]
on_error = true
"#,
        )
        .unwrap();
        assert_eq!(
            toml.paths.secrets_dir.as_deref(),
            Some(Path::new("/etc/enrollkit/secrets"))
        );
        assert!(toml.notify.on_error);
    }

    #[test]
    fn test_parse_invalid_toml() {
        assert!(EnrollToml::parse("[fetch\nconcurrency = ").is_err());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut toml = EnrollToml::parse("[fetch]\nconcurrency = 2\n").unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            (CONCURRENCY_ENV, "8"),
            (REQUEST_TIMEOUT_ENV, " 5 "),
        ]);
        toml.apply_env_with(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(toml.fetch.concurrency, 8);
        assert_eq!(toml.fetch_config().request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_unparseable_env_value_is_ignored() {
        let mut toml = EnrollToml::default();
        toml.apply_env_with(|key| (key == CONCURRENCY_ENV).then(|| "lots".to_string()));
        assert_eq!(toml.fetch.concurrency, 4);
    }

    #[test]
    fn test_validate_warns_on_zero_concurrency() {
        let toml = EnrollToml::parse("[fetch]\nconcurrency = 0\n").unwrap();
        let warnings = toml.validate();
        assert!(warnings.iter().any(|w| w.contains("concurrency")));
    }

    #[test]
    fn test_validate_warns_on_oversized_pages() {
        let toml = EnrollToml::parse("[fetch]\nmax_page_size = 500\n").unwrap();
        assert!(toml.validate().iter().any(|w| w.contains("max_page_size")));
    }

    #[test]
    fn test_max_pages_reaches_fetch_config() {
        let toml = EnrollToml::parse("[fetch]\nmax_pages = 50\n").unwrap();
        assert_eq!(toml.fetch_config().max_pages, 50);
        assert_eq!(EnrollToml::default().fetch.max_pages, 10_000);
    }

    #[test]
    fn test_save_and_load_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("enrollkit.toml");
        let mut toml = EnrollToml::default();
        toml.fetch.concurrency = 3;
        toml.notify.on_error = true;
        toml.save(&path).unwrap();

        let loaded = EnrollToml::load(&path).unwrap();
        assert_eq!(loaded, toml);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = TempDir::new().unwrap();
        let toml = EnrollToml::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(toml, EnrollToml::default());
    }
}

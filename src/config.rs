//! config.rs
//!
//! Configuration for provisioning languages and for the reference cache.
//!
//! The versions file keeps the shape used by existing installations:
//!
//! ```json
//! {
//!     "versions": {
//!         "en": { "source": "https://github.com/BibleJS/bible-english", "version": "master", "language": "en" },
//!         "ro": { "source": "https://github.com/BibleJS/bible-romanian", "version": "master", "language": "ro" }
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where one edition comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConfig {
    /// Git URL of the edition's data repository.
    pub source: String,
    /// Tag or branch to check out.
    pub version: String,
    /// Language tag the edition is registered under.
    pub language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibleConfig {
    #[serde(default)]
    pub versions: BTreeMap<String, VersionConfig>,
}

impl BibleConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(content.trim_start_matches('\u{FEFF}'))
    }
}

/// Options for opening one [`crate::bible::Bible`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibleOptions {
    language: String,
}

impl BibleOptions {
    /// The language is matched case-insensitively.
    pub fn new(language: &str) -> Self {
        BibleOptions {
            language: language.to_lowercase(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl Default for BibleOptions {
    fn default() -> Self {
        BibleOptions::new("en")
    }
}

/// What happens to a reference whose resolution failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The error is stored and replayed to later callers.
    #[default]
    CacheErrors,
    /// The error is delivered to current waiters only; the next request
    /// for the same reference resolves again.
    RetryErrors,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    pub failure_policy: FailurePolicy,
    /// Completed entries older than this are resolved again. `None` keeps
    /// them for the lifetime of the cache.
    pub ttl: Option<Duration>,
    /// Largest edit distance accepted when correcting a book name. `None`
    /// always takes the closest book.
    pub max_book_distance: Option<usize>,
}

impl CacheConfig {
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_max_book_distance(mut self, distance: usize) -> Self {
        self.max_book_distance = Some(distance);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_from_json() {
        let config = BibleConfig::from_json_str(
            r#"{"versions": {"ro": {"source": "https://github.com/BibleJS/bible-romanian", "version": "master", "language": "ro"}}}"#,
        )
        .unwrap();
        let ro = &config.versions["ro"];
        assert_eq!(ro.language, "ro");
        assert_eq!(ro.version, "master");
    }

    #[test]
    fn test_missing_versions_is_empty() {
        let config = BibleConfig::from_json_str("{}").unwrap();
        assert!(config.versions.is_empty());
        assert!(BibleConfig::from_json_str("{\"versions\": 3}").is_err());
    }

    #[test]
    fn test_options_lowercase_language() {
        assert_eq!(BibleOptions::new("RO").language(), "ro");
        assert_eq!(BibleOptions::default().language(), "en");
    }

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.failure_policy, FailurePolicy::CacheErrors);
        assert_eq!(config.ttl, None);
        assert_eq!(config.max_book_distance, None);

        let tuned = CacheConfig::default()
            .with_failure_policy(FailurePolicy::RetryErrors)
            .with_ttl(Duration::from_secs(60))
            .with_max_book_distance(3);
        assert_eq!(tuned.ttl, Some(Duration::from_secs(60)));
        assert_eq!(tuned.max_book_distance, Some(3));
    }
}

//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Course block selectors
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Content cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Blob store settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Input file locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Section schedule data service
    #[serde(default)]
    pub sections: SectionsConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.storage.upload_concurrency == 0 {
            return Err(AppError::validation(
                "storage.upload_concurrency must be > 0",
            ));
        }
        if self.storage.aggregate_key.trim().is_empty() {
            return Err(AppError::validation("storage.aggregate_key is empty"));
        }
        let raw_dir = self.storage.raw_prefix.trim_end_matches('/');
        if !raw_dir.is_empty()
            && self
                .storage
                .aggregate_key
                .strip_prefix(raw_dir)
                .is_some_and(|rest| rest.starts_with('/'))
        {
            return Err(AppError::validation(
                "storage.aggregate_key must not live under storage.raw_prefix",
            ));
        }
        for (name, selector) in [
            ("extractor.block_selector", &self.extractor.block_selector),
            ("extractor.title_selector", &self.extractor.title_selector),
            (
                "extractor.description_selector",
                &self.extractor.description_selector,
            ),
        ] {
            if selector.trim().is_empty() {
                return Err(AppError::validation(format!("{name} is empty")));
            }
        }
        Ok(())
    }
}

/// Which discovered links a seed page may hand to the crawl queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPolicy {
    /// Follow every absolute http(s) link found on a seed page.
    #[default]
    All,
    /// Follow only links sharing the seed page's origin.
    SameOrigin,
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Size of the fetch/parse worker pool
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Delay before each new unit is scheduled, in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,

    /// Link-following policy for depth-1 discovery
    #[serde(default)]
    pub link_policy: LinkPolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            request_delay_ms: 0,
            link_policy: LinkPolicy::default(),
        }
    }
}

/// CSS selectors locating course blocks inside a catalog page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// One element per catalog course entry
    #[serde(default = "defaults::block_selector")]
    pub block_selector: String,

    /// Title element within a block
    #[serde(default = "defaults::title_selector")]
    pub title_selector: String,

    /// Description element within a block
    #[serde(default = "defaults::description_selector")]
    pub description_selector: String,

    /// Pages lacking this element yield no records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_selector: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            block_selector: defaults::block_selector(),
            title_selector: defaults::title_selector(),
            description_selector: defaults::description_selector(),
            container_selector: None,
        }
    }
}

/// Durable content cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Disable to always re-extract
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Directory holding one entry per fingerprint
    #[serde(default = "defaults::cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: defaults::cache_dir(),
        }
    }
}

/// Blob store backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Local filesystem directory
    #[default]
    Local,
    /// S3-compatible object storage (requires the `s3` feature)
    S3,
}

/// Blob store keys and backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Root directory for the local backend
    #[serde(default = "defaults::local_dir")]
    pub local_dir: PathBuf,

    /// Key prefix for raw HTML pages
    #[serde(default = "defaults::raw_prefix")]
    pub raw_prefix: String,

    /// Fixed key of the aggregated course dataset
    #[serde(default = "defaults::aggregate_key")]
    pub aggregate_key: String,

    /// Maximum concurrent uploads
    #[serde(default = "defaults::upload_concurrency")]
    pub upload_concurrency: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            local_dir: defaults::local_dir(),
            raw_prefix: defaults::raw_prefix(),
            aggregate_key: defaults::aggregate_key(),
            upload_concurrency: defaults::upload_concurrency(),
        }
    }
}

/// Input file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Seed URL list, one URL per line
    #[serde(default = "defaults::seeds_file")]
    pub seeds_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            seeds_file: defaults::seeds_file(),
        }
    }
}

/// Section schedule data service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionsConfig {
    #[serde(default = "defaults::sections_url")]
    pub url: String,

    #[serde(default = "defaults::sections_key")]
    pub output_key: String,
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            url: defaults::sections_url(),
            output_key: defaults::sections_key(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; catalog-crawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        5
    }

    // Extractor defaults
    pub fn block_selector() -> String {
        "div.courseblock".into()
    }
    pub fn title_selector() -> String {
        "p.courseblocktitle".into()
    }
    pub fn description_selector() -> String {
        "p.courseblockdesc".into()
    }

    // Cache defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn cache_dir() -> PathBuf {
        PathBuf::from("cache")
    }

    // Storage defaults
    pub fn local_dir() -> PathBuf {
        PathBuf::from("output")
    }
    pub fn raw_prefix() -> String {
        "course_data/pages".into()
    }
    pub fn aggregate_key() -> String {
        "course_data/all_courses.json".into()
    }
    pub fn upload_concurrency() -> usize {
        5
    }

    pub fn seeds_file() -> PathBuf {
        PathBuf::from("data/seeds.txt")
    }

    pub fn sections_url() -> String {
        "https://myhub.njit.edu/scbldr/include/datasvc.php?p=/".into()
    }
    pub fn sections_key() -> String {
        "course_data/sections.json".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_aggregate_under_raw_prefix() {
        let mut config = Config::default();
        config.storage.aggregate_key = "course_data/pages/all.json".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_aggregate_beside_raw_prefix() {
        let mut config = Config::default();
        config.storage.raw_prefix = "course_data/pages".to_string();
        config.storage.aggregate_key = "course_data/pages_all.json".to_string();
        assert!(config.validate().is_ok());

        config.storage.raw_prefix = "course_data/pages/".to_string();
        config.storage.aggregate_key = "course_data/pages/all.json".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            max_concurrent = 8
            link_policy = "same_origin"

            [storage]
            backend = "s3"
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.max_concurrent, 8);
        assert_eq!(config.crawler.timeout_secs, 30);
        assert_eq!(config.crawler.link_policy, LinkPolicy::SameOrigin);
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.storage.aggregate_key, "course_data/all_courses.json");
        assert_eq!(config.extractor.block_selector, "div.courseblock");
        assert!(config.cache.enabled);
    }
}

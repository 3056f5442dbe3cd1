use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

use crate::crawler::error::CrawlError;
use crate::crawler::task::{Role, Task};

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CrawlerConfig {
    /// URL of the first page to visit; required to start a crawl
    pub start_url: Option<String>,

    /// Role label of the first page, `LISTING` unless debugging a single article
    pub start_role: String,

    pub selectors: SelectorSettings,
    pub crawler: CrawlerSettings,
    pub fetcher: FetcherSettings,
    pub storage: StorageSettings,
}

/// Site-specific CSS selectors
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SelectorSettings {
    /// Anchors on the listing page that point at articles
    pub listing_link: String,
    /// The article headline
    pub article_title: String,
    /// The element wrapping the article body
    pub article_body: String,
}

/// Crawl loop settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CrawlerSettings {
    pub page_timeout_secs: u64,
    /// Extra attempts after a failed fetch
    pub max_request_retries: u32,
}

/// Page fetcher settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FetcherSettings {
    pub kind: String, // "http", "webdriver"
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub webdriver_url: String,
    pub headless: bool,
}

/// Output locations
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    /// JSON Lines file receiving one record per article
    pub dataset_path: PathBuf,
    /// Directory receiving diagnostic HTML snapshots
    pub key_value_dir: PathBuf,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: None,
            start_role: Role::Listing.to_string(),
            selectors: SelectorSettings::default(),
            crawler: CrawlerSettings::default(),
            fetcher: FetcherSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            listing_link: "a.card__title-link".to_string(),
            article_title: "h1#article-heading_1-0".to_string(),
            article_body: "div#article-body_1-0".to_string(),
        }
    }
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            page_timeout_secs: 180,
            max_request_retries: 1,
        }
    }
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            kind: "http".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            request_timeout_secs: 120,
            webdriver_url: "http://localhost:4444".to_string(),
            headless: true,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("./storage/datasets/default.jsonl"),
            key_value_dir: PathBuf::from("./storage/key_value_stores/default"),
        }
    }
}

impl CrawlerSettings {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

impl CrawlerConfig {
    /// Get the path to the config directory
    fn config_dir() -> PathBuf {
        if let Some(proj_dirs) =
            directories::ProjectDirs::from("com", "article-crawler", "article-crawler")
        {
            proj_dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from("./config")
        }
    }

    /// Path of the default configuration file
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("default.yaml")
    }

    /// Load the default configuration, or built-in defaults if none was saved
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_path();

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            debug!("No configuration at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read configuration file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .context(format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save the configuration as the default
    pub fn save_as_default(&self) -> Result<PathBuf> {
        let config_path = Self::default_path();
        self.save_to_file(&config_path)?;
        info!("Saved configuration to {}", config_path.display());
        Ok(config_path)
    }

    /// Save the configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        debug!("Saving configuration to: {}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .context(format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let contents = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        fs::write(path, contents)
            .context(format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Build the first task of the crawl
    ///
    /// Fails with [`CrawlError::MissingStartUrl`] when no start URL is set.
    pub fn seed_task(&self) -> Result<Task, CrawlError> {
        let start_url = self
            .start_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                error!("No start URL configured; nothing to crawl");
                CrawlError::MissingStartUrl
            })?;

        let url = Url::parse(start_url).map_err(|source| CrawlError::InvalidUrl {
            url: start_url.to_string(),
            source,
        })?;
        let role: Role = self.start_role.parse()?;

        Ok(Task::new(url.to_string(), role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlerConfig::default();
        assert_eq!(config.crawler.page_timeout(), Duration::from_secs(180));
        assert_eq!(config.crawler.max_request_retries, 1);
        assert_eq!(config.selectors.listing_link, "a.card__title-link");
        assert!(config.start_url.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
start_url: https://site.example/list
selectors:
  listing_link: "ul.posts a"
crawler:
  page_timeout_secs: 30
"#;
        let config: CrawlerConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.start_url.as_deref(), Some("https://site.example/list"));
        assert_eq!(config.selectors.listing_link, "ul.posts a");
        assert_eq!(config.selectors.article_title, "h1#article-heading_1-0");
        assert_eq!(config.crawler.page_timeout_secs, 30);
        assert_eq!(config.crawler.max_request_retries, 1);
        assert_eq!(config.fetcher.kind, "http");
    }

    #[test]
    fn test_seed_task_requires_start_url() {
        let mut config = CrawlerConfig::default();
        assert!(matches!(config.seed_task(), Err(CrawlError::MissingStartUrl)));

        config.start_url = Some("   ".to_string());
        assert!(matches!(config.seed_task(), Err(CrawlError::MissingStartUrl)));

        config.start_url = Some("https://site.example/list".to_string());
        let task = config.seed_task().unwrap();
        assert_eq!(task.role, Role::Listing);
        assert_eq!(task.url, "https://site.example/list");
    }

    #[test]
    fn test_seed_task_rejects_unknown_role() {
        let config = CrawlerConfig {
            start_url: Some("https://site.example/list".to_string()),
            start_role: "DETAIL".to_string(),
            ..CrawlerConfig::default()
        };
        assert!(matches!(config.seed_task(), Err(CrawlError::UnknownRole(_))));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("site.yaml");

        let config = CrawlerConfig {
            start_url: Some("https://site.example/list".to_string()),
            ..CrawlerConfig::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = CrawlerConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}

use std::time::Duration;
use thiserror::Error;

/// Errors raised while fetching a single page
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server responded with status {status} for {url}")]
    Status { url: String, status: u16 },

    /// The WebDriver session failed to load or read the page
    #[error("webdriver error: {0}")]
    WebDriver(String),
}

/// Errors produced by the crawl pipeline
#[derive(Debug, Error)]
pub enum CrawlError {
    /// No start URL was configured; the crawl cannot begin
    #[error("no start URL configured (set `start_url` in the config file or pass --start-url)")]
    MissingStartUrl,

    /// The frontier has no pending tasks left
    #[error("frontier is empty")]
    EmptyFrontier,

    /// A role label that no handler understands
    #[error("unknown page role '{0}' (expected LISTING or ARTICLE)")]
    UnknownRole(String),

    /// A URL that could not be parsed or resolved
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A CSS selector from the configuration failed to parse
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// Fetching the page failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Fetching the page took longer than the per-page timeout
    #[error("fetch of {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// Writing a record or snapshot failed
    #[error("storage error: {0}")]
    Storage(String),
}

impl CrawlError {
    /// Whether the driver may retry the task after this error
    pub fn is_transient(&self) -> bool {
        matches!(self, CrawlError::Fetch(_) | CrawlError::Timeout { .. })
    }
}

impl From<std::io::Error> for CrawlError {
    fn from(e: std::io::Error) -> Self {
        CrawlError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for CrawlError {
    fn from(e: serde_json::Error) -> Self {
        CrawlError::Storage(e.to_string())
    }
}

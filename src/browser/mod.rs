pub mod http;
pub mod page;
pub mod session;

use async_trait::async_trait;
use std::sync::Arc;

use crate::cli::config::FetcherSettings;
use crate::crawler::error::FetchError;

// Re-export common types
pub use http::HttpFetcher;
pub use page::Page;
pub use session::WebDriverFetcher;

/// Loads a page for the crawler
///
/// Implementations may fail or hang; the crawl driver bounds every call with
/// its own timeout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its content
    async fn fetch(&self, url: &str) -> Result<Page, FetchError>;

    /// Release any session held by the fetcher
    async fn close(&self) {}
}

/// Create the fetcher selected in the settings
pub async fn create_fetcher(settings: &FetcherSettings) -> anyhow::Result<Arc<dyn PageFetcher>> {
    match settings.kind.as_str() {
        "http" => Ok(Arc::new(HttpFetcher::new(settings)?)),
        "webdriver" => Ok(Arc::new(WebDriverFetcher::connect(settings).await?)),
        other => anyhow::bail!("Unsupported fetcher kind: {}", other),
    }
}

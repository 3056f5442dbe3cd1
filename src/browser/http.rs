use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::browser::{Page, PageFetcher};
use crate::cli::config::FetcherSettings;
use crate::crawler::error::FetchError;

/// Fetches raw HTML over plain HTTP
///
/// No JavaScript runs, so pages that build their content client-side need the
/// WebDriver fetcher instead.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &FetcherSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .cookie_store(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        debug!("Sending HTTP request: {}", url);

        let response = self.client.get(url).send().await?;
        let final_url = response.url().to_string();
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status {
                url: final_url,
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        debug!("Fetched {} bytes from {}", html.len(), final_url);

        Ok(Page::new(final_url, html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings() -> FetcherSettings {
        FetcherSettings {
            request_timeout_secs: 5,
            ..FetcherSettings::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_page_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"/a1\">A1</a>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&settings()).unwrap();
        let url = format!("{}/list", server.uri());
        let page = fetcher.fetch(&url).await.unwrap();

        assert_eq!(page.url(), url);
        assert!(page.html().contains("/a1"));
    }

    #[tokio::test]
    async fn test_error_status_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&settings()).unwrap();
        let result = fetcher.fetch(&format!("{}/down", server.uri())).await;

        assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
    }
}

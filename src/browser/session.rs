use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use thirtyfour::prelude::*;
use tracing::{debug, error};

use crate::browser::{Page, PageFetcher};
use crate::cli::config::FetcherSettings;
use crate::crawler::error::FetchError;

/// Fetches rendered pages through an already-running WebDriver server
///
/// The browser process itself is managed outside the crawler; this only opens
/// a session on the configured endpoint.
pub struct WebDriverFetcher {
    driver: WebDriver,
}

impl WebDriverFetcher {
    /// Open a browser session on the configured WebDriver endpoint
    pub async fn connect(settings: &FetcherSettings) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();

        caps.add_chrome_arg(&format!("--user-agent={}", settings.user_agent))?;
        caps.add_chrome_arg("--disable-dev-shm-usage")?;
        caps.add_chrome_arg("--no-sandbox")?;

        if settings.headless {
            caps.set_headless()?;
        }

        let driver = WebDriver::new(&settings.webdriver_url, caps)
            .await
            .context(format!(
                "Failed to connect to WebDriver at {}",
                settings.webdriver_url
            ))?;

        driver
            .set_page_load_timeout(Duration::from_secs(settings.request_timeout_secs))
            .await
            .context("Failed to set page load timeout")?;

        debug!("Browser session opened on {}", settings.webdriver_url);

        Ok(Self { driver })
    }
}

#[async_trait]
impl PageFetcher for WebDriverFetcher {
    async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        self.driver
            .goto(url)
            .await
            .map_err(|e| FetchError::WebDriver(format!("failed to navigate to {}: {}", url, e)))?;

        let final_url = self
            .driver
            .current_url()
            .await
            .map_err(|e| FetchError::WebDriver(format!("failed to read current URL: {}", e)))?;

        let html = self
            .driver
            .source()
            .await
            .map_err(|e| FetchError::WebDriver(format!("failed to read page source: {}", e)))?;

        debug!("Rendered {} bytes from {}", html.len(), final_url);

        Ok(Page::new(final_url.to_string(), html))
    }

    async fn close(&self) {
        if let Err(e) = self.driver.clone().quit().await {
            error!("Error closing browser session: {}", e);
        }
        debug!("Browser session closed");
    }
}

use tracing::{debug, error, info, warn};
use url::Url;

use crate::browser::Page;
use crate::crawler::diagnostics::DiagnosticCapture;
use crate::crawler::error::CrawlError;
use crate::crawler::task::Task;
use crate::storage::queue::Frontier;

/// What a listing page contributed to the crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingOutcome {
    /// Links that resolved to a navigable article URL
    pub links_found: usize,
    /// Article tasks newly added to the frontier
    pub enqueued: usize,
    /// Links whose task was already known
    pub duplicates: usize,
    /// Links discarded for their scheme or because they could not be resolved
    pub rejected: usize,
    /// Key of the diagnostic snapshot, when one was captured
    pub snapshot_key: Option<String>,
}

/// Harvests article links from listing pages
pub struct ListingHandler {
    link_selector: String,
    capture: DiagnosticCapture,
}

impl ListingHandler {
    pub fn new(link_selector: impl Into<String>, capture: DiagnosticCapture) -> Self {
        Self {
            link_selector: link_selector.into(),
            capture,
        }
    }

    /// Enqueue an article task for every link matched on the page
    ///
    /// Finding no links is not an error: the page is captured for inspection
    /// and the task still succeeds.
    pub async fn handle(
        &self,
        task: &Task,
        page: &Page,
        frontier: &mut Frontier,
    ) -> Result<ListingOutcome, CrawlError> {
        info!(selector = %self.link_selector, "Harvesting article links from listing page");

        let hrefs = page.link_targets(&self.link_selector)?;
        let base = page.base_url()?;

        let mut outcome = ListingOutcome::default();
        let mut article_urls = Vec::with_capacity(hrefs.len());

        for href in &hrefs {
            match resolve_link(&base, href) {
                Ok(Some(url)) => article_urls.push(url),
                Ok(None) => {
                    debug!("Discarding non-navigational link: {}", href);
                    outcome.rejected += 1;
                }
                Err(e) => {
                    error!(base = %base, "Failed to resolve link '{}': {}", href, e);
                    outcome.rejected += 1;
                }
            }
        }

        outcome.links_found = article_urls.len();
        info!("Found {} article links", article_urls.len());

        if article_urls.is_empty() {
            warn!(
                url = %task.url,
                selector = %self.link_selector,
                "No article links found on listing page; check the link selector"
            );
            outcome.snapshot_key = self.capture.capture(task, page.html()).await;
            return Ok(outcome);
        }

        let samples: Vec<&str> = article_urls.iter().take(3).map(String::as_str).collect();
        info!("Sample links (max 3): {}", samples.join(" | "));

        for url in article_urls {
            if frontier.enqueue(Task::article(url.clone())) {
                info!("Enqueued article: {}", url);
                outcome.enqueued += 1;
            } else {
                outcome.duplicates += 1;
            }
        }

        Ok(outcome)
    }
}

/// Resolve a harvested link against the page's base URL
///
/// Returns `None` for links that do not lead to an HTTP(S) page, such as
/// `javascript:`, `mailto:` or `tel:` links.
pub fn resolve_link(base: &Url, href: &str) -> Result<Option<String>, url::ParseError> {
    let resolved = base.join(href.trim())?;

    match resolved.scheme() {
        "http" | "https" => Ok(Some(resolved.to_string())),
        _ => Ok(None),
    }
}

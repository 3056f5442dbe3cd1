use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::browser::{Page, PageFetcher};
use crate::cli::config::CrawlerSettings;
use crate::crawler::article::ArticleOutcome;
use crate::crawler::dispatcher::{Dispatcher, HandlerOutcome};
use crate::crawler::error::CrawlError;
use crate::crawler::task::Task;
use crate::storage::queue::Frontier;
use crate::utils::metrics::{CrawlStats, RequestTimer};

/// Sequential crawl driver
///
/// Pulls one task at a time from the frontier, fetches it with a per-page
/// timeout and a bounded number of retries, and hands the page to the
/// dispatcher. The next fetch starts only after the previous task has been
/// fully handled.
pub struct CrawlerController {
    fetcher: Arc<dyn PageFetcher>,
    dispatcher: Dispatcher,
    frontier: Frontier,
    page_timeout: Duration,
    max_request_retries: u32,
}

impl CrawlerController {
    pub fn new(fetcher: Arc<dyn PageFetcher>, dispatcher: Dispatcher) -> Self {
        let defaults = CrawlerSettings::default();
        Self {
            fetcher,
            dispatcher,
            frontier: Frontier::new(),
            page_timeout: defaults.page_timeout(),
            max_request_retries: defaults.max_request_retries,
        }
    }

    /// Apply the timeout and retry settings from the configuration
    pub fn with_settings(self, settings: &CrawlerSettings) -> Self {
        self.page_timeout(settings.page_timeout())
            .max_request_retries(settings.max_request_retries)
    }

    pub fn page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    /// Extra attempts allowed after a failed fetch
    pub fn max_request_retries(mut self, retries: u32) -> Self {
        self.max_request_retries = retries;
        self
    }

    /// Add a task to the frontier, returning whether it was new
    pub fn enqueue(&mut self, task: Task) -> bool {
        self.frontier.enqueue(task)
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Crawl until the frontier is exhausted
    pub async fn run(&mut self) -> CrawlStats {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("crawl", run_id = %run_id);
        let mut stats = CrawlStats::new(run_id);

        async {
            if self.frontier.is_empty() {
                warn!("Crawl started with an empty frontier");
            } else {
                info!("Crawl started with {} pending tasks", self.frontier.len());
            }

            loop {
                let task = match self.frontier.dequeue() {
                    Ok(task) => task,
                    Err(CrawlError::EmptyFrontier) => break,
                    Err(e) => {
                        error!("Failed to take next task: {}", e);
                        break;
                    }
                };

                let task_span = info_span!(
                    "task",
                    url = %task.url,
                    role = %task.role,
                    unique_key = %task.unique_key
                );
                self.process(task, &mut stats).instrument(task_span).await;
            }

            stats.finish();
            info!(
                handled = stats.tasks_handled,
                failed = stats.tasks_failed,
                records = stats.records_emitted,
                snapshots = stats.snapshots_captured,
                unique_tasks = self.frontier.seen_count(),
                "Crawl finished: frontier exhausted"
            );
        }
        .instrument(span)
        .await;

        stats
    }

    /// Fetch and handle a single task; failures stay contained here
    async fn process(&mut self, task: Task, stats: &mut CrawlStats) {
        info!("Processing {} page: {}", task.role, task.url);

        let page = match self.fetch_with_retry(&task, stats).await {
            Ok(page) => page,
            Err((e, attempts)) => {
                error!(
                    url = %task.url,
                    role = %task.role,
                    attempts,
                    "Request failed after {} attempts, dropping task: {}",
                    attempts,
                    e
                );
                stats.tasks_failed += 1;
                return;
            }
        };

        match self.dispatcher.route(&task, &page, &mut self.frontier).await {
            Ok(outcome) => {
                stats.tasks_handled += 1;
                record_outcome(stats, &outcome);
                info!("Finished {} page: {}", task.role, task.url);
            }
            Err(e) => {
                error!(
                    url = %task.url,
                    role = %task.role,
                    "Handling failed, dropping task: {}",
                    e
                );
                stats.tasks_failed += 1;
            }
        }
    }

    /// Fetch the task's page, retrying transient failures
    ///
    /// On failure returns the last error and the number of attempts made.
    async fn fetch_with_retry(
        &self,
        task: &Task,
        stats: &mut CrawlStats,
    ) -> Result<Page, (CrawlError, u32)> {
        let max_attempts = self.max_request_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            info!(attempt, "Fetching page (attempt {}/{})", attempt, max_attempts);

            let timer = RequestTimer::start();
            let result = self.fetch_once(&task.url).await;
            stats.record_attempt(attempt, timer.end());

            match result {
                Ok(page) => {
                    info!(final_url = %page.url(), "Fetched page");
                    return Ok(page);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    warn!(attempt, "Fetch failed, retrying: {}", e);
                }
                Err(e) => return Err((e, attempt)),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<Page, CrawlError> {
        match tokio::time::timeout(self.page_timeout, self.fetcher.fetch(url)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CrawlError::Timeout {
                url: url.to_string(),
                timeout: self.page_timeout,
            }),
        }
    }
}

fn record_outcome(stats: &mut CrawlStats, outcome: &HandlerOutcome) {
    match outcome {
        HandlerOutcome::Listing(listing) => {
            stats.links_enqueued += listing.enqueued;
            stats.duplicate_links += listing.duplicates;
            if listing.snapshot_key.is_some() {
                stats.snapshots_captured += 1;
            }
        }
        HandlerOutcome::Article(ArticleOutcome::Emitted) => stats.records_emitted += 1,
        HandlerOutcome::Article(ArticleOutcome::Empty { snapshot_key }) => {
            if snapshot_key.is_some() {
                stats.snapshots_captured += 1;
            }
        }
    }
}

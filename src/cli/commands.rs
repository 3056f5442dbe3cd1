use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::browser::create_fetcher;
use crate::cli::config::CrawlerConfig;
use crate::cli::CrawlArgs;
use crate::crawler::{
    ArticleHandler, CrawlerController, DiagnosticCapture, Dispatcher, ListingHandler,
};
use crate::storage::{FileSystemStore, JsonLinesDataset};
use crate::utils::CrawlStats;

/// Load the configuration file, or the saved default when none is given
fn load_config(path: Option<&PathBuf>) -> Result<CrawlerConfig> {
    match path {
        Some(path) => CrawlerConfig::load_from_file(path)
            .context(format!("Failed to load configuration: {}", path.display())),
        None => CrawlerConfig::load_default(),
    }
}

/// Overlay command line options on the loaded configuration
pub fn apply_overrides(config: &mut CrawlerConfig, args: &CrawlArgs) {
    if let Some(url) = &args.start_url {
        config.start_url = Some(url.clone());
    }
    if let Some(role) = &args.role {
        config.start_role = role.clone();
    }
    if let Some(selector) = &args.listing_selector {
        config.selectors.listing_link = selector.clone();
    }
    if let Some(selector) = &args.title_selector {
        config.selectors.article_title = selector.clone();
    }
    if let Some(selector) = &args.body_selector {
        config.selectors.article_body = selector.clone();
    }
    if let Some(timeout) = args.timeout {
        config.crawler.page_timeout_secs = timeout;
    }
    if let Some(retries) = args.retries {
        config.crawler.max_request_retries = retries;
    }
    if let Some(fetcher) = &args.fetcher {
        config.fetcher.kind = fetcher.clone();
    }
    if let Some(output) = &args.output {
        config.storage.dataset_path = output.clone();
    }
    if let Some(dir) = &args.diagnostics_dir {
        config.storage.key_value_dir = dir.clone();
    }
}

/// Run a crawl from the seed URL until the frontier is exhausted
pub async fn crawl(args: CrawlArgs) -> Result<CrawlStats> {
    let mut config = load_config(args.config.as_ref())?;
    apply_overrides(&mut config, &args);

    // Nothing is created before the seed is known to be valid
    let seed = config.seed_task()?;
    info!("Starting with {} page: {}", seed.role, seed.url);

    let fetcher = create_fetcher(&config.fetcher).await?;
    let dataset = JsonLinesDataset::open(&config.storage.dataset_path)
        .await
        .context("Failed to open dataset")?;
    let capture = DiagnosticCapture::new(Arc::new(FileSystemStore::new(
        config.storage.key_value_dir.clone(),
    )));

    let dispatcher = Dispatcher::new(
        ListingHandler::new(config.selectors.listing_link.clone(), capture.clone()),
        ArticleHandler::new(
            config.selectors.article_title.clone(),
            config.selectors.article_body.clone(),
            Arc::new(dataset),
            capture,
        ),
    );

    let mut crawler =
        CrawlerController::new(fetcher.clone(), dispatcher).with_settings(&config.crawler);
    crawler.enqueue(seed);

    let stats = crawler.run().await;
    fetcher.close().await;

    info!(
        "Crawl complete in {}s: {} pages handled, {} failed, {} records saved to {}",
        stats.elapsed_secs().unwrap_or(0),
        stats.tasks_handled,
        stats.tasks_failed,
        stats.records_emitted,
        config.storage.dataset_path.display()
    );
    if stats.snapshots_captured > 0 {
        info!(
            "{} diagnostic snapshots saved in {}",
            stats.snapshots_captured,
            config.storage.key_value_dir.display()
        );
    }

    Ok(stats)
}

/// Show the current configuration
pub fn show_config(path: Option<PathBuf>) -> Result<()> {
    let config = load_config(path.as_ref())?;
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;

    println!("Current configuration:");
    println!("{}", yaml);

    Ok(())
}

/// Write the built-in defaults as the default configuration
pub fn init_config() -> Result<()> {
    let path = CrawlerConfig::default().save_as_default()?;
    println!("Wrote default configuration to {}", path.display());
    println!("Set `start_url` and the selectors for your site before crawling.");

    Ok(())
}

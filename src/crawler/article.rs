use std::sync::Arc;
use tracing::{info, warn};

use crate::browser::page::{ContainerText, Page};
use crate::crawler::diagnostics::DiagnosticCapture;
use crate::crawler::error::CrawlError;
use crate::crawler::task::{ExtractedRecord, Task};
use crate::storage::processed::RecordSink;

/// Elements inside the body container that make up the article text
pub const BODY_BLOCK_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, li";

const BODY_PREVIEW_CHARS: usize = 100;

/// What an article page produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleOutcome {
    /// A record was handed to the sink
    Emitted,
    /// Neither title nor body was found
    Empty { snapshot_key: Option<String> },
}

/// Extracts title and body text from article pages
pub struct ArticleHandler {
    title_selector: String,
    body_selector: String,
    sink: Arc<dyn RecordSink>,
    capture: DiagnosticCapture,
}

impl ArticleHandler {
    pub fn new(
        title_selector: impl Into<String>,
        body_selector: impl Into<String>,
        sink: Arc<dyn RecordSink>,
        capture: DiagnosticCapture,
    ) -> Self {
        Self {
            title_selector: title_selector.into(),
            body_selector: body_selector.into(),
            sink,
            capture,
        }
    }

    /// Title and body text of the page, each `None` when not found
    pub fn extract(&self, page: &Page) -> Result<(Option<String>, Option<String>), CrawlError> {
        let title = page.first_text(&self.title_selector)?;
        let body = page
            .container_text(&self.body_selector, BODY_BLOCK_SELECTOR)?
            .and_then(assemble_body);

        Ok((title, body))
    }

    /// Emit one record for the page, or capture it when nothing was extracted
    pub async fn handle(&self, task: &Task, page: &Page) -> Result<ArticleOutcome, CrawlError> {
        info!(
            title_selector = %self.title_selector,
            body_selector = %self.body_selector,
            "Extracting article"
        );

        let (title, body) = self.extract(page)?;

        info!("Title found: {}", title.as_deref().unwrap_or("<none>"));
        if let Some(body) = &body {
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            info!("Body found (first {} chars): {}...", BODY_PREVIEW_CHARS, preview);
        }

        let Some(record) = ExtractedRecord::new(task.url.clone(), title, body) else {
            warn!(url = %task.url, "Could not extract title or body from article page");
            let snapshot_key = self.capture.capture(task, page.html()).await;
            return Ok(ArticleOutcome::Empty { snapshot_key });
        };

        let label = record.title().unwrap_or(record.source_url()).to_string();
        self.sink.emit(record).await?;
        info!("Saved article: {}", label);

        Ok(ArticleOutcome::Emitted)
    }
}

/// Join the container's text blocks with blank lines
///
/// Falls back to the container's whole text when it has no text blocks.
pub fn assemble_body(container: ContainerText) -> Option<String> {
    let blocks: Vec<String> = container
        .blocks
        .into_iter()
        .map(|block| block.trim().to_string())
        .filter(|block| !block.is_empty())
        .collect();

    let body = if blocks.is_empty() {
        container.full_text.trim().to_string()
    } else {
        blocks.join("\n\n")
    };

    let body = body.trim_end().to_string();
    (!body.is_empty()).then_some(body)
}

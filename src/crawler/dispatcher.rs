use tracing::debug;

use crate::browser::Page;
use crate::crawler::article::{ArticleHandler, ArticleOutcome};
use crate::crawler::error::CrawlError;
use crate::crawler::listing::{ListingHandler, ListingOutcome};
use crate::crawler::task::{Role, Task};
use crate::storage::queue::Frontier;

/// Result of handling one fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Listing(ListingOutcome),
    Article(ArticleOutcome),
}

/// Routes a fetched page to the handler for its task's role
pub struct Dispatcher {
    listing: ListingHandler,
    article: ArticleHandler,
}

impl Dispatcher {
    pub fn new(listing: ListingHandler, article: ArticleHandler) -> Self {
        Self { listing, article }
    }

    pub async fn route(
        &self,
        task: &Task,
        page: &Page,
        frontier: &mut Frontier,
    ) -> Result<HandlerOutcome, CrawlError> {
        debug!("Dispatching {} page: {}", task.role, task.url);

        match task.role {
            Role::Listing => self
                .listing
                .handle(task, page, frontier)
                .await
                .map(HandlerOutcome::Listing),
            Role::Article => self
                .article
                .handle(task, page)
                .await
                .map(HandlerOutcome::Article),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::diagnostics::DiagnosticCapture;
    use crate::storage::processed::MemoryDataset;
    use crate::storage::raw::MemoryStore;
    use std::sync::Arc;

    const PAGE: &str = r#"<a class="card" href="/articles/a1">A1</a>
                          <h1>Title</h1><div id="body"><p>Text</p></div>"#;

    fn dispatcher(sink: Arc<MemoryDataset>) -> Dispatcher {
        let capture = DiagnosticCapture::new(Arc::new(MemoryStore::default()));
        Dispatcher::new(
            ListingHandler::new("a.card", capture.clone()),
            ArticleHandler::new("h1", "div#body", sink, capture),
        )
    }

    #[tokio::test]
    async fn test_listing_role_harvests_links_only() {
        let sink = Arc::new(MemoryDataset::default());
        let mut frontier = Frontier::new();
        let page = Page::new("https://site.example/list", PAGE);

        let outcome = dispatcher(sink.clone())
            .route(&Task::listing(page.url()), &page, &mut frontier)
            .await
            .unwrap();

        assert!(matches!(outcome, HandlerOutcome::Listing(ref o) if o.enqueued == 1));
        assert_eq!(frontier.len(), 1);
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn test_article_role_emits_record_only() {
        let sink = Arc::new(MemoryDataset::default());
        let mut frontier = Frontier::new();
        let page = Page::new("https://site.example/a1", PAGE);

        let outcome = dispatcher(sink.clone())
            .route(&Task::article(page.url()), &page, &mut frontier)
            .await
            .unwrap();

        assert_eq!(outcome, HandlerOutcome::Article(ArticleOutcome::Emitted));
        assert!(frontier.is_empty());
        assert_eq!(sink.records().len(), 1);
    }
}

use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{error, info};
use uuid::Uuid;

use crate::crawler::task::{Role, Task};
use crate::storage::raw::{KeyValueStore, MAX_KEY_LENGTH};

const LISTING_KEY_PREFIX: &str = "DEBUG_LISTING_HTML_";
const ARTICLE_KEY_PREFIX: &str = "DEBUG_ARTICLE_HTML_";
const SNAPSHOT_CONTENT_TYPE: &str = "text/html";

/// Raw page content kept for someone debugging the selectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticSnapshot {
    pub key: String,
    pub raw_content: String,
}

impl DiagnosticSnapshot {
    pub fn for_task(task: &Task, raw_content: impl Into<String>) -> Self {
        Self {
            key: snapshot_key(task),
            raw_content: raw_content.into(),
        }
    }
}

fn unsafe_key_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    // Path separators, colons and dots, plus anything else a store key rejects
    UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9!\-_'()]").expect("valid pattern"))
}

/// Storage key for a task's snapshot: a role prefix plus the sanitized unique key
///
/// Keys that would exceed [`MAX_KEY_LENGTH`] keep their head and end in a
/// digest of the full unique key, so distinct tasks never share a key.
pub fn snapshot_key(task: &Task) -> String {
    let prefix = match task.role {
        Role::Listing => LISTING_KEY_PREFIX,
        Role::Article => ARTICLE_KEY_PREFIX,
    };
    let mut key = format!(
        "{}{}",
        prefix,
        unsafe_key_chars().replace_all(&task.unique_key, "_")
    );

    if key.len() > MAX_KEY_LENGTH {
        let digest = Uuid::new_v5(&Uuid::NAMESPACE_URL, task.unique_key.as_bytes())
            .simple()
            .to_string();
        // Every character is ASCII after sanitizing
        key.truncate(MAX_KEY_LENGTH - digest.len() - 1);
        key.push('_');
        key.push_str(&digest);
    }

    key
}

/// Persists raw page content when extraction comes back empty
///
/// Capturing never fails the owning task; storage errors are only logged.
#[derive(Clone)]
pub struct DiagnosticCapture {
    store: Arc<dyn KeyValueStore>,
}

impl DiagnosticCapture {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Store the page content under the task's snapshot key
    ///
    /// Returns the key when the snapshot was written.
    pub async fn capture(&self, task: &Task, raw_content: &str) -> Option<String> {
        let snapshot = DiagnosticSnapshot::for_task(task, raw_content);

        match self
            .store
            .set_value(&snapshot.key, &snapshot.raw_content, SNAPSHOT_CONTENT_TYPE)
            .await
        {
            Ok(()) => {
                info!(key = %snapshot.key, "Saved page HTML for inspection");
                Some(snapshot.key)
            }
            Err(e) => {
                error!(key = %snapshot.key, url = %task.url, "Failed to save diagnostic snapshot: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::error::CrawlError;
    use crate::storage::raw::MemoryStore;
    use crate::utils::logging::testing::LogRecorder;
    use async_trait::async_trait;
    use tracing::Level;

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn set_value(&self, _: &str, _: &str, _: &str) -> Result<(), CrawlError> {
            Err(CrawlError::Storage("disk full".to_string()))
        }
    }

    #[test]
    fn test_snapshot_key_replaces_unsafe_characters() {
        let task = Task::article("https://site.example/articles/a1.html");
        assert_eq!(
            snapshot_key(&task),
            "DEBUG_ARTICLE_HTML_https___site_example_articles_a1_html"
        );

        let listing = Task::listing("https://site.example/list?page=2");
        assert_eq!(
            snapshot_key(&listing),
            "DEBUG_LISTING_HTML_https___site_example_list_page_2"
        );
    }

    #[test]
    fn test_snapshot_key_is_bounded() {
        let long = format!("https://site.example/{}", "x".repeat(400));
        let key = snapshot_key(&Task::article(long.clone()));

        assert_eq!(key.len(), MAX_KEY_LENGTH);
        assert!(key.starts_with("DEBUG_ARTICLE_HTML_https___site_example_xxx"));
        assert_eq!(key, snapshot_key(&Task::article(long)));
    }

    #[test]
    fn test_long_keys_with_shared_prefix_stay_distinct() {
        let common = format!("https://site.example/{}", "section/".repeat(30));
        let one = Task::article(format!("{}article-one", common));
        let two = Task::article(format!("{}article-two", common));
        assert_ne!(one.unique_key, two.unique_key);

        let (key_one, key_two) = (snapshot_key(&one), snapshot_key(&two));
        assert_ne!(key_one, key_two);
        assert!(key_one.len() <= MAX_KEY_LENGTH);
        assert!(key_two.len() <= MAX_KEY_LENGTH);
        assert!(crate::storage::raw::validate_key(&key_one).is_ok());
    }

    #[test]
    fn test_short_keys_carry_no_digest() {
        let task = Task::listing("https://site.example/list");
        assert_eq!(snapshot_key(&task), "DEBUG_LISTING_HTML_https___site_example_list");
    }

    #[tokio::test]
    async fn test_capture_writes_html_snapshot() {
        let store = Arc::new(MemoryStore::default());
        let capture = DiagnosticCapture::new(store.clone());
        let task = Task::article("https://site.example/a1");

        let key = capture.capture(&task, "<html>raw</html>").await;

        assert_eq!(key.as_deref(), Some("DEBUG_ARTICLE_HTML_https___site_example_a1"));
        assert_eq!(
            store.entries(),
            vec![(
                "DEBUG_ARTICLE_HTML_https___site_example_a1".to_string(),
                "<html>raw</html>".to_string(),
                "text/html".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_capture_failure_is_logged_not_raised() {
        let recorder = LogRecorder::default();
        let _guard = recorder.install();

        let capture = DiagnosticCapture::new(Arc::new(BrokenStore));
        let key = capture.capture(&Task::listing("https://site.example/list"), "x").await;

        assert!(key.is_none());
        let errors = recorder.at_level(Level::ERROR);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("disk full"));
    }
}

use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use tokio::fs;
use tracing::debug;

use crate::crawler::error::CrawlError;

/// Longest key a store accepts
pub const MAX_KEY_LENGTH: usize = 250;

/// Key/value destination for raw page content
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value
    async fn set_value(&self, key: &str, value: &str, content_type: &str)
        -> Result<(), CrawlError>;
}

fn valid_key() -> &'static Regex {
    static VALID_KEY: OnceLock<Regex> = OnceLock::new();
    VALID_KEY.get_or_init(|| Regex::new(r"^[A-Za-z0-9!\-_.'()]+$").expect("valid key pattern"))
}

/// Check that a key is safe to use as a file name
pub fn validate_key(key: &str) -> Result<(), CrawlError> {
    if key.len() > MAX_KEY_LENGTH || !valid_key().is_match(key) || key.starts_with('.') {
        return Err(CrawlError::Storage(format!("invalid store key '{}'", key)));
    }
    Ok(())
}

/// File extension used for a content type
fn extension_for(content_type: &str) -> &'static str {
    match content_type.split(';').next().unwrap_or("").trim() {
        "text/html" => "html",
        "application/json" => "json",
        "text/plain" => "txt",
        _ => "bin",
    }
}

/// Key/value store backed by a directory, one file per key
pub struct FileSystemStore {
    dir: PathBuf,
}

impl FileSystemStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path a value with this key and content type is written to
    pub fn path_for(&self, key: &str, content_type: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, extension_for(content_type)))
    }
}

#[async_trait]
impl KeyValueStore for FileSystemStore {
    async fn set_value(
        &self,
        key: &str,
        value: &str,
        content_type: &str,
    ) -> Result<(), CrawlError> {
        validate_key(key)?;

        fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key, content_type);
        fs::write(&path, value).await?;

        debug!("Stored {} bytes under key {} at {}", value.len(), key, path.display());

        Ok(())
    }
}

/// Store that keeps values in memory
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    values: std::sync::Mutex<Vec<(String, String, String)>>,
}

#[cfg(test)]
impl MemoryStore {
    /// Stored `(key, value, content_type)` entries in write order
    pub fn entries(&self) -> Vec<(String, String, String)> {
        self.values.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_value(
        &self,
        key: &str,
        value: &str,
        content_type: &str,
    ) -> Result<(), CrawlError> {
        validate_key(key)?;
        self.values.lock().unwrap().push((
            key.to_string(),
            value.to_string(),
            content_type.to_string(),
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_validation() {
        assert!(validate_key("DEBUG_ARTICLE_HTML_https___site_example_a1").is_ok());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH + 1)).is_err());
    }

    #[tokio::test]
    async fn test_values_are_written_with_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemStore::new(dir.path().join("kv"));

        store
            .set_value("DEBUG_LISTING_HTML_x", "<html></html>", "text/html")
            .await
            .unwrap();

        let path = store.path_for("DEBUG_LISTING_HTML_x", "text/html");
        assert!(path.ends_with("DEBUG_LISTING_HTML_x.html"));
        assert_eq!(tokio::fs::read_to_string(path).await.unwrap(), "<html></html>");
    }

    #[tokio::test]
    async fn test_invalid_key_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemStore::new(dir.path());

        let result = store.set_value("a:b", "x", "text/html").await;
        assert!(matches!(result, Err(CrawlError::Storage(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

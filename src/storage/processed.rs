use async_trait::async_trait;
use std::path::Path;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::crawler::error::CrawlError;
use crate::crawler::task::ExtractedRecord;

/// Append-only destination for extracted records
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Store one record; ownership passes to the sink
    async fn emit(&self, record: ExtractedRecord) -> Result<(), CrawlError>;
}

/// Dataset written as JSON Lines, one record per line
pub struct JsonLinesDataset {
    file: Mutex<File>,
}

impl JsonLinesDataset {
    /// Open (or create) the dataset file for appending
    pub async fn open(path: &Path) -> Result<Self, CrawlError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        debug!("Opened dataset: {}", path.display());

        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl RecordSink for JsonLinesDataset {
    async fn emit(&self, record: ExtractedRecord) -> Result<(), CrawlError> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;

        debug!("Stored record for URL: {}", record.source_url());

        Ok(())
    }
}

/// Sink that keeps records in memory
#[cfg(test)]
#[derive(Default)]
pub struct MemoryDataset {
    records: std::sync::Mutex<Vec<ExtractedRecord>>,
}

#[cfg(test)]
impl MemoryDataset {
    pub fn records(&self) -> Vec<ExtractedRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl RecordSink for MemoryDataset {
    async fn emit(&self, record: ExtractedRecord) -> Result<(), CrawlError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

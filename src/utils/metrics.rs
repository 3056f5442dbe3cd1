use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Counters collected over one crawl run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrawlStats {
    /// Identifier of the run, also attached to the crawl span
    pub run_id: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Tasks whose page was fetched and handled
    pub tasks_handled: usize,

    /// Tasks dropped after exhausting their attempts or failing in a handler
    pub tasks_failed: usize,

    /// Fetch attempts, including retries
    pub fetch_attempts: usize,

    /// Attempts beyond the first one for a task
    pub retries: usize,

    /// Total time spent fetching, in milliseconds
    pub fetch_time_ms: u64,

    pub records_emitted: usize,
    pub snapshots_captured: usize,

    /// Article tasks added by listing pages
    pub links_enqueued: usize,

    /// Harvested links dropped because their task was already known
    pub duplicate_links: usize,
}

impl CrawlStats {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
            finished_at: None,
            tasks_handled: 0,
            tasks_failed: 0,
            fetch_attempts: 0,
            retries: 0,
            fetch_time_ms: 0,
            records_emitted: 0,
            snapshots_captured: 0,
            links_enqueued: 0,
            duplicate_links: 0,
        }
    }

    /// Record one fetch attempt and how long it took
    pub fn record_attempt(&mut self, attempt: u32, duration_ms: u64) {
        self.fetch_attempts += 1;
        if attempt > 1 {
            self.retries += 1;
        }
        self.fetch_time_ms += duration_ms;
    }

    /// Mark the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration of the run in seconds, if finished
    pub fn elapsed_secs(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Request timer for measuring fetch durations
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// End timing and get the duration in milliseconds
    pub fn end(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempts_and_retries() {
        let mut stats = CrawlStats::new("run");
        stats.record_attempt(1, 10);
        stats.record_attempt(2, 15);
        stats.record_attempt(1, 5);

        assert_eq!(stats.fetch_attempts, 3);
        assert_eq!(stats.retries, 1);
        assert_eq!(stats.fetch_time_ms, 30);

        assert!(stats.elapsed_secs().is_none());
        stats.finish();
        assert!(stats.elapsed_secs().unwrap() >= 0);
    }
}

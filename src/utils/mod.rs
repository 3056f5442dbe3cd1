pub mod logging;
pub mod metrics;

// Re-export common functions and types
pub use logging::init_logging;
pub use metrics::CrawlStats;

pub mod processed;
pub mod queue;
pub mod raw;

// Re-export common types
pub use processed::JsonLinesDataset;
pub use raw::FileSystemStore;

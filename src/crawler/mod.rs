pub mod article;
pub mod controller;
pub mod diagnostics;
pub mod dispatcher;
pub mod error;
pub mod listing;
pub mod task;

// Re-export common types
pub use article::ArticleHandler;
pub use controller::CrawlerController;
pub use diagnostics::DiagnosticCapture;
pub use dispatcher::Dispatcher;
pub use listing::ListingHandler;

// Public modules
pub mod config;
pub mod error;
pub mod local_files;
pub mod rewrite;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
pub use rewrite::{BatchReporter, BatchSummary, FileOutcome, FileProcessor, PatternCatalog};

//! Pattern-driven source rewriting.
//!
//! `PatternCatalog` holds the rules, `engine::apply` runs them over one
//! text, `FileProcessor` applies them to files on disk and `BatchReporter`
//! aggregates the outcomes.

mod builtin;
pub mod catalog;
pub mod engine;
pub mod pattern;
pub mod processor;
pub mod report;
pub mod template;
pub mod walk;

pub use catalog::PatternCatalog;
pub use engine::{apply, PatternHit, RewriteResult};
pub use pattern::{MatchExpression, Pattern, PatternDef, Scope};
pub use processor::{FileOutcome, FileProcessor};
pub use report::{BatchItem, BatchReporter, BatchSummary, ItemStatus};
pub use template::{GroupRef, ReplacementTemplate};
pub use walk::{collect_files, default_globs, DEFAULT_GLOBS};

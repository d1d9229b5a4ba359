use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use super::catalog::PatternCatalog;
use super::engine::PatternHit;
use super::processor::FileOutcome;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Changed,
    Failed,
}

/// One changed or failed file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub path: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hits: Vec<PatternHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Totals for one run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub files_unchanged: usize,
    pub files_failed: usize,
    pub occurrences: usize,
    pub dry_run: bool,
    /// Catalog order, zero totals included.
    pub pattern_totals: Vec<PatternHit>,
    pub items: Vec<BatchItem>,
}

impl BatchSummary {
    pub fn new(catalog: &PatternCatalog, dry_run: bool) -> Self {
        Self {
            dry_run,
            pattern_totals: catalog
                .ids()
                .into_iter()
                .map(|id| PatternHit {
                    pattern_id: id.to_string(),
                    occurrences: 0,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn record_unchanged(&mut self) {
        self.files_scanned += 1;
        self.files_unchanged += 1;
    }

    pub fn record_changed(&mut self, path: String, hits: Vec<PatternHit>) {
        self.files_scanned += 1;
        self.files_changed += 1;

        for hit in &hits {
            self.occurrences += hit.occurrences;
            if let Some(total) = self
                .pattern_totals
                .iter_mut()
                .find(|t| t.pattern_id == hit.pattern_id)
            {
                total.occurrences += hit.occurrences;
            }
        }

        self.items.push(BatchItem {
            path,
            status: ItemStatus::Changed,
            hits,
            error_code: None,
            error: None,
        });
    }

    pub fn record_failed(&mut self, path: String, error: &Error) {
        self.files_scanned += 1;
        self.files_failed += 1;
        self.items.push(BatchItem {
            path,
            status: ItemStatus::Failed,
            hits: Vec::new(),
            error_code: Some(error.code.as_str().to_string()),
            error: Some(format!("{} ({})", error.message, error.cause())),
        });
    }

    pub fn has_failures(&self) -> bool {
        self.files_failed > 0
    }

    /// Human-readable report: one line per changed or failed file, then totals.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let changed_label = if self.dry_run { "would change" } else { "changed" };

        for item in &self.items {
            match item.status {
                ItemStatus::Changed => {
                    let hits = item
                        .hits
                        .iter()
                        .map(|h| format!("{} x{}", h.pattern_id, h.occurrences))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let _ = writeln!(out, "{}: {} ({})", changed_label, item.path, hits);
                }
                ItemStatus::Failed => {
                    let _ = writeln!(
                        out,
                        "failed: {} [{}] {}",
                        item.path,
                        item.error_code.as_deref().unwrap_or("unknown"),
                        item.error.as_deref().unwrap_or("")
                    );
                }
            }
        }

        let _ = write!(
            out,
            "{} files scanned, {} {}, {} unchanged, {} failed, {} occurrences",
            self.files_scanned,
            self.files_changed,
            changed_label,
            self.files_unchanged,
            self.files_failed,
            self.occurrences
        );
        out
    }
}

/// Collects outcomes as the processor produces them.
#[derive(Debug)]
pub struct BatchReporter {
    summary: BatchSummary,
}

impl BatchReporter {
    pub fn new(catalog: &PatternCatalog, dry_run: bool) -> Self {
        Self {
            summary: BatchSummary::new(catalog, dry_run),
        }
    }

    pub fn record(&mut self, path: &Path, outcome: FileOutcome) {
        let display = path.to_string_lossy().to_string();
        match outcome {
            FileOutcome::Unchanged => self.summary.record_unchanged(),
            FileOutcome::Changed { hits, written } => {
                let count: usize = hits.iter().map(|h| h.occurrences).sum();
                if written {
                    log_status!("fix", "{} ({} occurrences)", display, count);
                } else {
                    log_status!("dry-run", "{} ({} occurrences)", display, count);
                }
                self.summary.record_changed(display, hits);
            }
            FileOutcome::Failed(err) => {
                log_status!("fix", "{} failed: {}", display, err.message);
                self.summary.record_failed(display, &err);
            }
        }
    }

    pub fn summary(&self) -> &BatchSummary {
        &self.summary
    }

    pub fn finish(self) -> BatchSummary {
        self.summary
    }
}

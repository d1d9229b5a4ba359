use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use super::catalog::PatternCatalog;
use super::engine::{self, PatternHit, RewriteResult};
use super::report::BatchReporter;
use crate::error::Error;
use crate::local_files::{self, FileSystem, LocalFs};

/// What happened to one file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Unchanged,
    /// `written` is false in dry-run mode.
    Changed { hits: Vec<PatternHit>, written: bool },
    Failed(Error),
}

/// Runs the catalog against files, one at a time.
///
/// Every failure is captured in the returned outcome; nothing escapes a
/// single file.
pub struct FileProcessor<'a, F: FileSystem = LocalFs> {
    catalog: &'a PatternCatalog,
    fs: F,
    dry_run: bool,
    /// Scopes are matched against paths relative to this directory.
    root: Option<PathBuf>,
}

impl<'a> FileProcessor<'a, LocalFs> {
    pub fn new(catalog: &'a PatternCatalog) -> Self {
        Self::with_fs(catalog, local_files::local())
    }
}

impl<'a, F: FileSystem> FileProcessor<'a, F> {
    pub fn with_fs(catalog: &'a PatternCatalog, fs: F) -> Self {
        Self {
            catalog,
            fs,
            dry_run: false,
            root: None,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn relative_to(mut self, root: &Path) -> Self {
        self.root = Some(root.to_path_buf());
        self
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Rewrite one file in place.
    pub fn process(&self, path: &Path) -> FileOutcome {
        let result = match self.evaluate(path) {
            Ok(result) => result,
            Err(err) => return FileOutcome::Failed(err),
        };
        if !result.changed {
            return FileOutcome::Unchanged;
        }

        let hits = result.hits();
        if self.dry_run {
            return FileOutcome::Changed {
                hits,
                written: false,
            };
        }
        match self.fs.write(path, &result.final_text) {
            Ok(()) => FileOutcome::Changed {
                hits,
                written: true,
            },
            Err(err) => FileOutcome::Failed(err),
        }
    }

    /// Read `path` and run the patterns in scope for it. Never writes.
    pub fn evaluate(&self, path: &Path) -> crate::error::Result<RewriteResult> {
        let text = self.fs.read(path)?;

        let patterns = self.catalog.patterns_for(self.scoped_path(path));
        if patterns.is_empty() {
            tracing::debug!(path = %path.display(), "no applicable patterns");
        }

        panic::catch_unwind(AssertUnwindSafe(|| engine::apply(&text, &patterns)))
            .map_err(|payload| Error::engine_failed(path.to_string_lossy(), panic_message(&*payload)))
    }

    fn scoped_path<'p>(&self, path: &'p Path) -> &'p Path {
        self.root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path)
    }

    /// Process every path once, in order, recording each outcome.
    pub fn run_batch<I, P>(&self, paths: I, reporter: &mut BatchReporter)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            let path = path.into();
            let outcome = self.process(&path);
            if let FileOutcome::Failed(err) = &outcome {
                tracing::warn!(path = %path.display(), code = err.code.as_str(), "file failed");
            }
            reporter.record(&path, outcome);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during rewrite".to_string()
    }
}

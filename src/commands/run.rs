use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use fixsweep::log_status;
use fixsweep::rewrite::{collect_files, BatchReporter, BatchSummary, FileProcessor};

use crate::commands::{CatalogArgs, CmdResult, GlobalArgs, TextOutput};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Project root (default: current directory)
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// File globs relative to the root (repeatable; default: src/**/*.ts, src/**/*.tsx)
    #[arg(long = "glob", value_name = "GLOB")]
    pub globs: Vec<String>,

    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub catalog: CatalogArgs,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum RunOutput {
    #[serde(rename = "run")]
    Run {
        root: String,
        patterns: usize,
        #[serde(flatten)]
        summary: BatchSummary,
    },
}

impl TextOutput for RunOutput {
    fn render(&self) -> String {
        match self {
            RunOutput::Run { summary, .. } => summary.render(),
        }
    }
}

pub fn run(args: RunArgs, _global: &GlobalArgs) -> CmdResult<RunOutput> {
    let (mut config, base_dir) = args.catalog.resolve_config(&args.root)?;
    if !args.globs.is_empty() {
        config.globs = args.globs.clone();
    }

    // Catalog problems abort before any file is touched.
    let catalog = config.build_catalog(&base_dir)?;
    let files = collect_files(&args.root, &config.globs_or_default(), &config.exclude_dirs)?;

    log_status!(
        "run",
        "Scanning {} files with {} patterns{}",
        files.len(),
        catalog.len(),
        if args.dry_run { " (dry run)" } else { "" }
    );

    let processor = FileProcessor::new(&catalog)
        .dry_run(args.dry_run)
        .relative_to(&args.root);
    let mut reporter = BatchReporter::new(&catalog, args.dry_run);
    processor.run_batch(files, &mut reporter);
    let summary = reporter.finish();

    let exit_code = if summary.has_failures() { 1 } else { 0 };

    Ok((
        RunOutput::Run {
            root: args.root.to_string_lossy().to_string(),
            patterns: catalog.len(),
            summary,
        },
        exit_code,
    ))
}

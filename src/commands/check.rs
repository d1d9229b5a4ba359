use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use fixsweep::rewrite::{FileProcessor, PatternHit};

use crate::commands::{CatalogArgs, CmdResult, GlobalArgs, TextOutput};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// File to rewrite (nothing is written)
    pub file: PathBuf,

    /// Project root used to find fixsweep.json and to match pattern scopes
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[command(flatten)]
    pub catalog: CatalogArgs,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum CheckOutput {
    #[serde(rename = "check")]
    Check {
        path: String,
        changed: bool,
        hits: Vec<PatternHit>,
        text: String,
    },
}

impl TextOutput for CheckOutput {
    fn render(&self) -> String {
        let CheckOutput::Check { text, .. } = self;
        text.strip_suffix('\n').unwrap_or(text).to_string()
    }
}

pub fn run(args: CheckArgs, _global: &GlobalArgs) -> CmdResult<CheckOutput> {
    let (config, base_dir) = args.catalog.resolve_config(&args.root)?;
    let catalog = config.build_catalog(&base_dir)?;

    let result = FileProcessor::new(&catalog)
        .relative_to(&args.root)
        .evaluate(&args.file)?;

    Ok((
        CheckOutput::Check {
            path: args.file.to_string_lossy().to_string(),
            changed: result.changed,
            hits: result.hits(),
            text: result.final_text,
        },
        0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn check_prints_rewrite_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.ts");
        let original = "import { logger } from '@/lib/logger';\nconsole.info('x');\n";
        fs::write(&file, original).unwrap();

        let args = CheckArgs {
            file: file.clone(),
            root: dir.path().to_path_buf(),
            catalog: CatalogArgs::default(),
        };
        let (output, _) = run(args, &GlobalArgs { json: false }).unwrap();

        assert_eq!(
            output.render(),
            "import { logger } from '@/lib/logger';\nlogger.info('x');"
        );
        assert_eq!(fs::read_to_string(&file).unwrap(), original);
    }
}

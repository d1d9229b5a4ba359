use std::path::{Path, PathBuf};

use clap::Args;

use fixsweep::config::RunConfig;

pub mod check;
pub mod rules;
pub mod run;

pub type CmdResult<T> = fixsweep::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    pub json: bool,
}

/// Text rendering for commands in non-JSON mode.
pub(crate) trait TextOutput {
    fn render(&self) -> String;
}

/// Options that decide which patterns are loaded.
#[derive(Args, Default, Debug)]
pub struct CatalogArgs {
    /// Config file (default: fixsweep.json in the root, if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Extra pattern file (JSON list or {"patterns": [...]})
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Leave out the built-in patterns
    #[arg(long)]
    pub no_builtin: bool,

    /// Run only these pattern ids (repeatable)
    #[arg(long, value_name = "ID")]
    pub only: Vec<String>,

    /// Skip these pattern ids (repeatable)
    #[arg(long, value_name = "ID")]
    pub skip: Vec<String>,
}

impl CatalogArgs {
    /// Load the config for `root` and apply flag overrides. Returns the
    /// config and the directory its relative paths resolve against.
    pub fn resolve_config(&self, root: &Path) -> fixsweep::Result<(RunConfig, PathBuf)> {
        let (mut config, base_dir) = match &self.config {
            Some(path) => {
                let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
                (RunConfig::load(path)?, base)
            }
            None => (RunConfig::discover(root)?, root.to_path_buf()),
        };

        if let Some(catalog) = &self.catalog {
            let cwd = std::env::current_dir().map_err(|e| {
                fixsweep::Error::internal_io(e.to_string(), Some("resolve catalog path".to_string()))
            })?;
            config.catalog = Some(cwd.join(catalog));
        }
        if self.no_builtin {
            config.builtin = Some(false);
        }
        config.only.extend(self.only.iter().cloned());
        config.skip.extend(self.skip.iter().cloned());

        Ok((config, base_dir))
    }
}

macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::respond($module::run($args, $global), $global)
    };
}

/// Run a command and print its output. Returns the process exit code.
pub(crate) fn run(command: crate::Commands, global: &GlobalArgs) -> i32 {
    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Rules(args) => dispatch!(args, global, rules),
        crate::Commands::Check(args) => dispatch!(args, global, check),
    }
}

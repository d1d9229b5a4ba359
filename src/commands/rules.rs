use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use fixsweep::rewrite::Scope;

use crate::commands::{CatalogArgs, CmdResult, GlobalArgs, TextOutput};

#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Project root used to find fixsweep.json
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[command(flatten)]
    pub catalog: CatalogArgs,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum RulesOutput {
    #[serde(rename = "rules")]
    List { rules: Vec<RuleSummary> },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSummary {
    pub id: String,
    pub description: String,
    pub scope: Scope,
    pub guarded: bool,
}

impl TextOutput for RulesOutput {
    fn render(&self) -> String {
        let RulesOutput::List { rules } = self;
        let width = rules.iter().map(|r| r.id.len()).max().unwrap_or(0);
        rules
            .iter()
            .map(|r| format!("{:width$}  {}", r.id, r.description, width = width))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn run(args: RulesArgs, _global: &GlobalArgs) -> CmdResult<RulesOutput> {
    let (config, base_dir) = args.catalog.resolve_config(&args.root)?;
    let catalog = config.build_catalog(&base_dir)?;

    let rules = catalog
        .patterns()
        .iter()
        .map(|p| {
            let def = p.definition();
            RuleSummary {
                id: def.id.clone(),
                description: def.description.clone(),
                scope: def.scope.clone(),
                guarded: def.only_if.is_some() || def.skip_if.is_some(),
            }
        })
        .collect();

    Ok((RulesOutput::List { rules }, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_builtin_rules_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let args = RulesArgs {
            root: dir.path().to_path_buf(),
            catalog: CatalogArgs::default(),
        };

        let (output, code) = run(args, &GlobalArgs { json: false }).unwrap();
        assert_eq!(code, 0);

        let RulesOutput::List { rules } = &output;
        assert_eq!(rules[0].id, "logger-ternary-double-close");
        assert!(rules.last().unwrap().guarded);
        assert!(output.render().lines().count() == rules.len());
    }
}

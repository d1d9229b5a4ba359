//! Run configuration (`fixsweep.json`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rewrite::{walk, PatternCatalog, PatternDef};
use crate::utils::io;

pub const CONFIG_FILE: &str = "fixsweep.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Globs relative to the root. Empty means the defaults.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub globs: Vec<String>,
    /// Directory names skipped in addition to the built-in list.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_dirs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub only: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skip: Vec<String>,
    /// Include the built-in catalog. Defaults to true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builtin: Option<bool>,
    /// Extra pattern file, relative to the config's directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<PatternDef>,
}

impl RunConfig {
    pub fn from_str(raw: &str, source: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::config_invalid_json(source, e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        io::read_json(path, "read config")
    }

    /// Load `fixsweep.json` from `root` when present.
    pub fn discover(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        tracing::debug!(path = %path.display(), "loading config");
        Self::load(&path)
    }

    pub fn globs_or_default(&self) -> Vec<String> {
        if self.globs.is_empty() {
            walk::default_globs()
        } else {
            self.globs.clone()
        }
    }

    pub fn use_builtin(&self) -> bool {
        self.builtin.unwrap_or(true)
    }

    /// Built-in rules, then the catalog file, then inline patterns,
    /// restricted by `only` / `skip`.
    pub fn build_catalog(&self, base_dir: &Path) -> Result<PatternCatalog> {
        let mut defs = if self.use_builtin() {
            PatternCatalog::builtin()?
                .patterns()
                .iter()
                .map(|p| p.definition().clone())
                .collect()
        } else {
            Vec::new()
        };

        if let Some(catalog) = &self.catalog {
            let path = if catalog.is_absolute() {
                catalog.clone()
            } else {
                base_dir.join(catalog)
            };
            defs.extend(PatternCatalog::load_defs(&path)?);
        }

        defs.extend(self.patterns.iter().cloned());

        PatternCatalog::new(defs)?.select(&self.only, &self.skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_config_is_default() {
        let dir = tempdir().unwrap();
        let config = RunConfig::discover(dir.path()).unwrap();
        assert_eq!(config, RunConfig::default());
        assert!(config.use_builtin());
        assert_eq!(config.globs_or_default(), vec!["src/**/*.ts", "src/**/*.tsx"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RunConfig::from_str(r#"{"globz": []}"#, "inline").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidJson);
    }

    #[test]
    fn catalog_combines_sources_in_order() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("extra.json"),
            r#"[{"id":"from-file","match":"a","replace":"b"}]"#,
        )
        .unwrap();

        let config = RunConfig::from_str(
            r#"{
                "builtin": false,
                "catalog": "extra.json",
                "patterns": [{"id": "inline", "match": "c", "replace": "d"}]
            }"#,
            "inline",
        )
        .unwrap();

        let catalog = config.build_catalog(dir.path()).unwrap();
        assert_eq!(catalog.ids(), vec!["from-file", "inline"]);
    }

    #[test]
    fn builtin_catalog_can_be_narrowed() {
        let config = RunConfig {
            only: vec!["console-to-logger".to_string()],
            ..RunConfig::default()
        };
        let catalog = config.build_catalog(Path::new(".")).unwrap();
        assert_eq!(catalog.ids(), vec!["console-to-logger"]);
    }

    #[test]
    fn inline_pattern_clashing_with_builtin_is_rejected() {
        let config = RunConfig {
            patterns: vec![PatternDef::new("console-to-logger", "x", "y")],
            ..RunConfig::default()
        };
        let err = config.build_catalog(Path::new(".")).unwrap_err();
        assert_eq!(err.code, ErrorCode::CatalogDuplicateId);
    }

    #[test]
    fn discover_reads_root_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), r#"{"globs": ["lib/**/*.ts"]}"#).unwrap();
        let config = RunConfig::discover(dir.path()).unwrap();
        assert_eq!(config.globs_or_default(), vec!["lib/**/*.ts"]);
    }
}

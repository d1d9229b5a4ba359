use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::builtin;
use super::pattern::{Pattern, PatternDef};
use crate::error::{Error, Result};
use crate::utils::io;

/// Ordered, validated set of rewrite rules. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    patterns: Vec<Pattern>,
}

/// Pattern files hold either a bare list or a `{"patterns": [...]}` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<PatternDef>),
    Wrapped { patterns: Vec<PatternDef> },
}

impl CatalogFile {
    fn into_defs(self) -> Vec<PatternDef> {
        match self {
            CatalogFile::List(defs) | CatalogFile::Wrapped { patterns: defs } => defs,
        }
    }
}

impl PatternCatalog {
    /// Compile and validate `defs`, keeping their order.
    pub fn new(defs: Vec<PatternDef>) -> Result<Self> {
        let patterns = defs
            .into_iter()
            .map(Pattern::compile)
            .collect::<Result<Vec<_>>>()?;

        let catalog = Self { patterns };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The built-in logger and error-handling fixes.
    pub fn builtin() -> Result<Self> {
        Self::new(builtin::definitions())
    }

    /// Parse pattern definitions from JSON text. `source` names the origin
    /// in error details.
    pub fn parse_defs(raw: &str, source: &str) -> Result<Vec<PatternDef>> {
        serde_json::from_str::<CatalogFile>(raw)
            .map(CatalogFile::into_defs)
            .map_err(|e| Error::config_invalid_json(source, e))
    }

    pub fn from_json(raw: &str, source: &str) -> Result<Self> {
        Self::new(Self::parse_defs(raw, source)?)
    }

    pub fn load_defs(path: &Path) -> Result<Vec<PatternDef>> {
        let raw = io::read_file(path, "read pattern catalog")?;
        Self::parse_defs(&raw, &path.to_string_lossy())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::new(Self::load_defs(path)?)
    }

    /// Re-check the invariants `new` establishes.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for pattern in &self.patterns {
            if !seen.insert(pattern.id()) {
                return Err(Error::catalog_duplicate_id(pattern.id()));
            }
            pattern.check_template()?;
        }
        Ok(())
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.patterns.iter().map(Pattern::id).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.id() == id)
    }

    /// Patterns whose scope matches `path`, in catalog order.
    pub fn patterns_for(&self, path: &Path) -> Vec<&Pattern> {
        self.patterns.iter().filter(|p| p.applies_to(path)).collect()
    }

    /// Restrict to `only` (all patterns when empty) minus `skip`.
    pub fn select(&self, only: &[String], skip: &[String]) -> Result<Self> {
        for id in only.iter().chain(skip) {
            if self.get(id).is_none() {
                return Err(Error::validation_invalid_argument(
                    "pattern",
                    format!("Unknown pattern id '{}'", id),
                    Some(id.clone()),
                    Some(self.ids().into_iter().map(String::from).collect()),
                ));
            }
        }

        let patterns = self
            .patterns
            .iter()
            .filter(|p| only.is_empty() || only.iter().any(|id| id == p.id()))
            .filter(|p| !skip.iter().any(|id| id == p.id()))
            .cloned()
            .collect();

        Ok(Self { patterns })
    }

    /// Append `other`'s patterns after this catalog's.
    pub fn extend(mut self, other: PatternCatalog) -> Result<Self> {
        self.patterns.extend(other.patterns);
        self.validate()?;
        Ok(self)
    }
}

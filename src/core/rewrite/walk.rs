//! Candidate file discovery.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_GLOBS: &[&str] = &["src/**/*.ts", "src/**/*.tsx"];

/// Directories never descended into, at any depth.
pub const ALWAYS_SKIP_DIRS: &[&str] = &["node_modules", "vendor", ".git", ".svn", ".hg", ".next"];

/// Expand `globs` relative to `root` into a sorted, de-duplicated file list.
///
/// Paths under any directory named in `ALWAYS_SKIP_DIRS` or `extra_skip`
/// are dropped. Only regular files are returned.
pub fn collect_files(root: &Path, globs: &[String], extra_skip: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::validation_invalid_argument(
            "root",
            format!("Not a directory: {}", root.display()),
            Some(root.to_string_lossy().to_string()),
            None,
        ));
    }

    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let mut files = BTreeSet::new();

    for pattern in globs {
        let full = format!("{}/{}", escaped_root.trim_end_matches('/'), pattern.trim_start_matches("./"));
        let entries = glob::glob(&full).map_err(|e| {
            Error::validation_invalid_argument(
                "glob",
                format!("Invalid glob pattern '{}': {}", pattern, e),
                Some(pattern.clone()),
                None,
            )
        })?;

        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable path");
                    continue;
                }
            };

            if is_skipped(root, &path, extra_skip) || !path.is_file() {
                continue;
            }
            files.insert(path);
        }
    }

    tracing::debug!(root = %root.display(), count = files.len(), "collected candidate files");
    Ok(files.into_iter().collect())
}

fn is_skipped(root: &Path, path: &Path, extra_skip: &[String]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let Some(parent) = relative.parent() else {
        return false;
    };

    parent.components().any(|component| {
        let name = component.as_os_str().to_string_lossy();
        let name: &str = &name;
        ALWAYS_SKIP_DIRS.contains(&name) || extra_skip.iter().any(|s| s == name)
    })
}

pub fn default_globs() -> Vec<String> {
    DEFAULT_GLOBS.iter().map(|g| g.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn default_globs_find_ts_and_tsx_under_src() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/a.ts");
        touch(dir.path(), "src/app/page.tsx");
        touch(dir.path(), "src/app/style.css");
        touch(dir.path(), "scripts/fix.ts");

        let files = collect_files(dir.path(), &default_globs(), &[]).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(relative, vec!["src/a.ts", "src/app/page.tsx"]);
    }

    #[test]
    fn skip_dirs_are_ignored() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/node_modules/pkg/index.ts");
        touch(dir.path(), "src/generated/out.ts");
        touch(dir.path(), "src/keep.ts");

        let files = collect_files(dir.path(), &default_globs(), &["generated".to_string()]).unwrap();
        assert_eq!(files, vec![dir.path().join("src/keep.ts")]);
    }

    #[test]
    fn overlapping_globs_are_deduplicated() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/a.ts");

        let globs = vec!["src/**/*.ts".to_string(), "src/*.ts".to_string()];
        let files = collect_files(dir.path(), &globs, &[]).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn directories_matching_a_glob_are_skipped() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/odd.ts")).unwrap();

        let files = collect_files(dir.path(), &default_globs(), &[]).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn invalid_glob_and_missing_root_are_errors() {
        let dir = tempdir().unwrap();
        assert!(collect_files(dir.path(), &["src/[".to_string()], &[]).is_err());
        assert!(collect_files(&dir.path().join("missing"), &default_globs(), &[]).is_err());
    }
}

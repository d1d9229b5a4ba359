//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Read file contents with standardized error handling.
///
/// Wraps `fs::read_to_string` with consistent `Error::internal_io` formatting.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("{} ({})", operation, path.display())),
        )
    })
}

/// Read and deserialize a JSON file. Parse errors become `config.invalid_json`.
pub fn read_json<T: DeserializeOwned>(path: &Path, operation: &str) -> Result<T> {
    let raw = read_file(path, operation)?;
    serde_json::from_str(&raw).map_err(|e| Error::config_invalid_json(path.to_string_lossy(), e))
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    CatalogInvalidPattern,
    CatalogUnknownGroup,
    CatalogDuplicateId,

    ConfigInvalidJson,

    ValidationInvalidArgument,

    FileReadFailed,
    FileWriteFailed,
    EngineFailed,

    InternalIoError,
    InternalJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CatalogInvalidPattern => "catalog.invalid_pattern",
            ErrorCode::CatalogUnknownGroup => "catalog.unknown_group",
            ErrorCode::CatalogDuplicateId => "catalog.duplicate_id",

            ErrorCode::ConfigInvalidJson => "config.invalid_json",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::FileReadFailed => "file.read_failed",
            ErrorCode::FileWriteFailed => "file.write_failed",
            ErrorCode::EngineFailed => "engine.failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
        }
    }

    /// Catalog errors abort a run before any file is touched.
    pub fn is_catalog(&self) -> bool {
        matches!(
            self,
            ErrorCode::CatalogInvalidPattern
                | ErrorCode::CatalogUnknownGroup
                | ErrorCode::CatalogDuplicateId
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidPatternDetails {
    pub pattern_id: String,
    pub field: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownGroupDetails {
    pub pattern_id: String,
    pub group: String,
    pub declared: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileErrorDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn catalog_invalid_pattern(
        pattern_id: impl Into<String>,
        field: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let pattern_id = pattern_id.into();
        let details = to_details(InvalidPatternDetails {
            pattern_id: pattern_id.clone(),
            field: field.into(),
            error: error.into(),
        });

        Self::new(
            ErrorCode::CatalogInvalidPattern,
            format!("Pattern '{}' does not compile", pattern_id),
            details,
        )
    }

    pub fn catalog_unknown_group(
        pattern_id: impl Into<String>,
        group: impl Into<String>,
        declared: Vec<String>,
    ) -> Self {
        let pattern_id = pattern_id.into();
        let group = group.into();
        let details = to_details(UnknownGroupDetails {
            pattern_id: pattern_id.clone(),
            group: group.clone(),
            declared,
        });

        Self::new(
            ErrorCode::CatalogUnknownGroup,
            format!(
                "Pattern '{}' references group '{}' which its match expression does not capture",
                pattern_id, group
            ),
            details,
        )
        .with_hint("Write a literal '$' as '$$' in replacement templates")
    }

    pub fn catalog_duplicate_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(
            ErrorCode::CatalogDuplicateId,
            format!("Pattern id '{}' is declared more than once", id),
            serde_json::json!({ "id": id }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let details = to_details(FileErrorDetails {
            path: path.into(),
            error: err.to_string(),
        });

        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            details,
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            id,
            tried,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn file_read_failed(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::file_error(ErrorCode::FileReadFailed, "Failed to read file", path, error)
    }

    /// The rewrite was computed but could not be persisted.
    pub fn file_write_failed(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::file_error(
            ErrorCode::FileWriteFailed,
            "Failed to write rewritten file",
            path,
            error,
        )
    }

    pub fn engine_failed(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::file_error(ErrorCode::EngineFailed, "Rewrite engine failed", path, error)
    }

    fn file_error(
        code: ErrorCode,
        message: &str,
        path: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let details = to_details(FileErrorDetails {
            path: path.clone(),
            error: error.into(),
        });
        Self::new(code, format!("{}: {}", message, path), details)
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    /// Underlying cause recorded in `details.error`, falling back to the message.
    pub fn cause(&self) -> &str {
        self.details
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_dotted() {
        assert_eq!(ErrorCode::CatalogDuplicateId.as_str(), "catalog.duplicate_id");
        assert_eq!(ErrorCode::FileWriteFailed.as_str(), "file.write_failed");
    }

    #[test]
    fn read_and_write_failures_are_distinct() {
        let read = Error::file_read_failed("a.ts", "denied");
        let write = Error::file_write_failed("a.ts", "denied");
        assert_ne!(read.code, write.code);
        assert!(read.message.contains("read"));
        assert!(write.message.contains("write"));
    }

    #[test]
    fn cause_prefers_details() {
        let err = Error::file_read_failed("a.ts", "No such file or directory");
        assert_eq!(err.cause(), "No such file or directory");

        let err = Error::catalog_duplicate_id("x");
        assert_eq!(err.cause(), err.message);
    }

    #[test]
    fn only_catalog_codes_are_catalog() {
        assert!(ErrorCode::CatalogUnknownGroup.is_catalog());
        assert!(!ErrorCode::FileReadFailed.is_catalog());
        assert!(!ErrorCode::ConfigInvalidJson.is_catalog());
    }

    #[test]
    fn unknown_group_carries_hint() {
        let err = Error::catalog_unknown_group("p", "error", vec!["var".to_string()]);
        assert_eq!(err.hints.len(), 1);
        assert_eq!(err.details["group"], "error");
    }
}

//! CLI response formatting and output.
//!
//! Provides JSON envelope, printing, and exit code mapping.

use fixsweep::error::Hint;
use fixsweep::{Error, ErrorCode, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<Hint>>,
}

impl<T: Serialize> CliResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::internal_json(e.to_string(), Some("serialize response".to_string()))
        })
    }
}

impl CliResponse<()> {
    pub fn from_error(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(CliError {
                code: err.code.as_str().to_string(),
                message: err.message.clone(),
                details: err.details.clone(),
                hints: if err.hints.is_empty() {
                    None
                } else {
                    Some(err.hints.clone())
                },
            }),
        }
    }
}

fn write_stdout(payload: &str) -> Result<()> {
    use std::io::{self, Write};

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", payload) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            return Ok(()); // Exit gracefully on SIGPIPE
        }
        return Err(Error::internal_io(
            e.to_string(),
            Some("write stdout".to_string()),
        ));
    }
    Ok(())
}

fn print_response<T: Serialize>(response: &CliResponse<T>) -> Result<()> {
    write_stdout(&response.to_json()?)
}

pub fn print_success<T: Serialize>(data: T) -> Result<()> {
    print_response(&CliResponse::success(data))
}

pub fn print_json_result(result: Result<serde_json::Value>) -> Result<()> {
    match result {
        Ok(data) => print_success(data),
        Err(err) => print_response(&CliResponse::<()>::from_error(&err)),
    }
}

/// Plain-text output: rendered data on stdout, errors on stderr.
pub fn print_text_result(result: Result<String>) -> Result<()> {
    match result {
        Ok(text) => write_stdout(&text),
        Err(err) => {
            eprintln!("error [{}]: {}", err.code.as_str(), err.message);
            if let Some(cause) = err.details.get("error").and_then(|v| v.as_str()) {
                eprintln!("  cause: {}", cause);
            }
            for hint in &err.hints {
                eprintln!("  hint: {}", hint.message);
            }
            Ok(())
        }
    }
}

pub fn map_cmd_result_to_json<T: Serialize>(
    result: Result<(T, i32)>,
) -> (Result<serde_json::Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(err) => (
                Err(Error::internal_json(
                    err.to_string(),
                    Some("serialize response".to_string()),
                )),
                1,
            ),
        },
        Err(err) => {
            let exit_code = exit_code_for_error(err.code);
            (Err(err), exit_code)
        }
    }
}

pub fn exit_code_for_error(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::CatalogInvalidPattern
        | ErrorCode::CatalogUnknownGroup
        | ErrorCode::CatalogDuplicateId
        | ErrorCode::ConfigInvalidJson
        | ErrorCode::ValidationInvalidArgument => 2,

        ErrorCode::FileReadFailed
        | ErrorCode::FileWriteFailed
        | ErrorCode::EngineFailed
        | ErrorCode::InternalIoError
        | ErrorCode::InternalJsonError => 1,
    }
}

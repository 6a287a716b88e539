//! Exit codes following sysexits.h conventions.

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Context prefix used when an input file cannot be read. Errors carrying
/// it are reported with [`INPUT_ERROR`].
pub const READ_FILE_CONTEXT: &str = "Failed to read file";

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        let code = if message.starts_with(READ_FILE_CONTEXT) {
            INPUT_ERROR
        } else {
            GENERAL_ERROR
        };

        Self {
            code,
            message: Some(message),
        }
    }
}

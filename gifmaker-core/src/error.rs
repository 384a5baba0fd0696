// ============================================================================
// gifmaker-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Conversion Pipeline
//
// Only fatal conditions are represented here. Anomalies in the status stream
// or in terminal drawing are recovered where they happen and never surface as
// a CoreError.
//
// KEY COMPONENTS:
// - CoreError: every fatal failure the library can report
// - CoreResult: result alias used throughout the workspace
// - command_*_error: constructors for subprocess failures
//
// AI-ASSISTANT-INFO: Error taxonomy for gifmaker-core

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Fatal errors reported by the gifmaker core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("ffmpeg executable not found: {0}")]
    FfmpegNotFound(String),

    #[error("ffmpeg at '{path}' is not usable: {reason}")]
    FfmpegUnusable { path: PathBuf, reason: String },

    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Invalid {field} '{value}': expected HH:MM:SS or HH:MM:SS.ms")]
    InvalidTime { field: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed waiting for {0}: {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("{command} exited with {status}\nLast error output:\n{stderr_tail}")]
    ConversionFailed {
        command: String,
        status: ExitStatus,
        stderr_tail: String,
    },

    #[error("Output file '{0}' could not be inspected: {1}")]
    OutputMissing(PathBuf, #[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    OperationFailed(String),
}

/// Result type for gifmaker operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Builds the error for a subprocess that could not be started.
pub fn command_start_error(command: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(command.into(), err)
}

/// Builds the error for a subprocess whose exit status could not be collected.
pub fn command_wait_error(command: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(command.into(), err)
}

/// Builds the error for a subprocess that exited unsuccessfully.
pub fn command_failed_error(
    command: impl Into<String>,
    status: ExitStatus,
    stderr_tail: impl Into<String>,
) -> CoreError {
    CoreError::ConversionFailed {
        command: command.into(),
        status,
        stderr_tail: stderr_tail.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_time_message_names_field() {
        let err = CoreError::InvalidTime {
            field: "start time",
            value: "1:2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("start time"));
        assert!(msg.contains("'1:2'"));
    }

    #[test]
    fn test_start_error_keeps_source() {
        let err = command_start_error(
            "ffmpeg",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert!(matches!(err, CoreError::CommandStart(ref name, _) if name == "ffmpeg"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_error_includes_tail() {
        use std::os::unix::process::ExitStatusExt;

        let status = ExitStatus::from_raw(1 << 8);
        let err = command_failed_error("ffmpeg", status, "Invalid data found");
        let msg = err.to_string();
        assert!(msg.contains("Last error output"));
        assert!(msg.contains("Invalid data found"));
    }
}

//! Error plumbing for the command-line front end.
//!
//! Commands return the core error type unchanged. Terminal and prompt
//! failures are wrapped in `CoreError::OperationFailed` with a short
//! description of what the user was doing, so `main` can print one line.

use gifmaker_core::{CoreError, CoreResult};
use std::fmt::Display;

pub type CliResult<T> = CoreResult<T>;

fn described(what: impl Display, cause: Option<CoreError>) -> CoreError {
    match cause {
        Some(cause) => CoreError::OperationFailed(format!("{what}: {cause}")),
        None => CoreError::OperationFailed(what.to_string()),
    }
}

/// Turns a failed `Result` or an empty `Option` into a described
/// [`CoreError`].
pub trait CliErrorContext<T>: Sized {
    /// Describes the failure lazily; `describe` only runs on the error path.
    fn cli_with_context<C, F>(self, describe: F) -> CliResult<T>
    where
        C: Display,
        F: FnOnce() -> C;

    fn cli_context<C: Display>(self, what: C) -> CliResult<T> {
        self.cli_with_context(|| what)
    }
}

impl<T, E: Into<CoreError>> CliErrorContext<T> for Result<T, E> {
    fn cli_with_context<C, F>(self, describe: F) -> CliResult<T>
    where
        C: Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| described(describe(), Some(e.into())))
    }
}

impl<T> CliErrorContext<T> for Option<T> {
    fn cli_with_context<C, F>(self, describe: F) -> CliResult<T>
    where
        C: Display,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| described(describe(), None))
    }
}

/// `CoreError::OperationFailed` built from a format string.
#[macro_export]
macro_rules! cli_error {
    ($($arg:tt)*) => {
        ::gifmaker_core::CoreError::OperationFailed(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_context_wraps_io_error() {
        let result: Result<(), io::Error> = Err(io::Error::other("disk gone"));
        let err = result.cli_context("Failed to write summary").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Failed to write summary"));
        assert!(msg.contains("disk gone"));
    }

    #[test]
    fn test_option_context() {
        let missing: Option<u32> = None;
        let err = missing.cli_with_context(|| "no answer given").unwrap_err();
        assert!(matches!(err, CoreError::OperationFailed(m) if m == "no answer given"));
        assert_eq!(Some(3).cli_context("unused").unwrap(), 3);
    }

    #[test]
    fn test_description_not_built_on_success() {
        let ok: Result<u8, io::Error> = Ok(7);
        let value = ok
            .cli_with_context(|| -> String { panic!("described a success") })
            .unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_cli_error_macro() {
        let err = cli_error!("invalid fps '{}'", "abc");
        assert_eq!(err.to_string(), "invalid fps 'abc'");
    }
}

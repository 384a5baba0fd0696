// gifmaker-cli/src/lib.rs
//
// Library portion of the gifmaker CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod prompt;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, ConvertArgs, InfoArgs};
pub use commands::convert::run_convert;
pub use commands::info::run_info;
pub use commands::version::run_version;
pub use error::{CliErrorContext, CliResult};

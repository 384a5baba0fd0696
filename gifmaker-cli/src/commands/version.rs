//! Implementation of the 'version' subcommand.

use crate::config::FFMPEG_ENV_VAR;
use crate::error::CliResult;
use crate::output::{print_installation, print_warning};

use gifmaker_core::{SystemLocator, preflight};
use std::path::PathBuf;

/// Version string printed by `gifmaker version`.
pub fn version_line() -> String {
    format!("gifmaker {}", env!("CARGO_PKG_VERSION"))
}

/// Prints the tool version and the ffmpeg pre-flight result. A missing
/// ffmpeg is reported but is not an error for this command.
pub fn run_version() -> CliResult<()> {
    println!("{}", version_line());

    let explicit = std::env::var_os(FFMPEG_ENV_VAR).map(PathBuf::from);
    match preflight(&SystemLocator::default().with_explicit(explicit)) {
        Ok(install) => print_installation(&install),
        Err(e) => print_warning(&e.to_string()),
    }
    Ok(())
}

// ============================================================================
// gifmaker-cli/src/main.rs
// ============================================================================
//
// GIFMAKER CLI: Entry point
//
// Parses the command line, installs file logging and dispatches to the
// subcommand. Errors are printed once on stderr and turn into exit code 1.
//
// AI-ASSISTANT-INFO: Binary entry point for the gifmaker CLI

use clap::Parser;
use gifmaker_cli::config::FFMPEG_ENV_VAR;
use gifmaker_cli::logging::init_logging;
use gifmaker_cli::output::print_error;
use gifmaker_cli::{Cli, Commands, ConvertArgs, run_convert, run_info, run_version};
use std::path::PathBuf;
use std::process;

fn main() {
    let cli = Cli::parse();
    if let Some(path) = init_logging(cli.verbose) {
        log::debug!("Logging to {}", path.display());
    }
    log::info!("gifmaker {} started", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Some(Commands::Convert(args)) => run_convert(args, cli.verbose),
        Some(Commands::Info(args)) => run_info(args),
        Some(Commands::Version) => run_version(),
        None => {
            // Bare invocation behaves like `convert` with no arguments.
            let args = ConvertArgs {
                ffmpeg: std::env::var_os(FFMPEG_ENV_VAR).map(PathBuf::from),
                ..ConvertArgs::default()
            };
            run_convert(args, cli.verbose)
        }
    };

    if let Err(e) = result {
        log::error!("{e}");
        print_error(&e.to_string());
        process::exit(1);
    }
}

// gifmaker-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use crate::config::FFMPEG_ENV_VAR;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    name = "gifmaker",
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "gifmaker: Convert videos to GIFs with customizable options",
    long_about = "Converts video files to animated GIFs using ffmpeg, with a live progress display."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a video file to a GIF
    Convert(ConvertArgs),
    /// Show properties of a video and estimated GIF sizes
    Info(InfoArgs),
    /// Display version information
    Version,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ConvertArgs {
    /// Input video file (required unless using interactive mode)
    #[arg(short = 'i', long = "input", value_name = "INPUT_FILE")]
    pub input: Option<PathBuf>,

    /// Output GIF file (default: input_name.gif)
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_FILE")]
    pub output: Option<PathBuf>,

    /// Frames per second (default: 10)
    #[arg(
        short = 'f',
        long,
        value_name = "FPS",
        value_parser = clap::value_parser!(u32).range(1..=60)
    )]
    pub fps: Option<u32>,

    /// Start time (format: 00:00:00)
    #[arg(long, value_name = "TIME")]
    pub start: Option<String>,

    /// Duration (format: 00:00:00)
    #[arg(long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Output width in pixels (default: same as input)
    #[arg(
        short = 'w',
        long,
        value_name = "PIXELS",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub width: Option<u32>,

    /// Output quality 1-100 (default: 90)
    #[arg(
        short = 'q',
        long,
        value_name = "QUALITY",
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub quality: Option<u8>,

    /// Use interactive mode (default if no arguments provided)
    #[arg(short = 'I', long)]
    pub interactive: bool,

    /// Disable the progress display
    #[arg(long, conflicts_with = "plain")]
    pub no_progress: bool,

    /// Print periodic progress lines instead of redrawing in place
    #[arg(long)]
    pub plain: bool,

    /// Number of ffmpeg threads (default: based on CPU count)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub threads: Option<u32>,

    /// Path to the ffmpeg executable
    #[arg(long, value_name = "PATH", env = FFMPEG_ENV_VAR)]
    pub ffmpeg: Option<PathBuf>,

    /// Print the conversion summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl ConvertArgs {
    /// True when any conversion option was given on the command line.
    /// Display-only flags and the ffmpeg location do not count.
    pub fn has_conversion_options(&self) -> bool {
        self.input.is_some()
            || self.output.is_some()
            || self.fps.is_some()
            || self.start.is_some()
            || self.duration.is_some()
            || self.width.is_some()
            || self.quality.is_some()
            || self.threads.is_some()
    }
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Video file to inspect
    #[arg(value_name = "INPUT_FILE")]
    pub input: PathBuf,

    /// Path to the ffmpeg executable
    #[arg(long, value_name = "PATH", env = FFMPEG_ENV_VAR)]
    pub ffmpeg: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_convert_flags() {
        let cli = Cli::try_parse_from([
            "gifmaker", "convert", "-i", "in.mp4", "-o", "out.gif", "-f", "15", "--start",
            "00:00:01", "--duration", "00:00:02", "-w", "320", "-q", "80", "--plain",
        ])
        .unwrap();
        let Some(Commands::Convert(args)) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.input, Some(PathBuf::from("in.mp4")));
        assert_eq!(args.fps, Some(15));
        assert_eq!(args.width, Some(320));
        assert_eq!(args.quality, Some(80));
        assert!(args.plain);
        assert!(args.has_conversion_options());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(Cli::try_parse_from(["gifmaker", "convert", "-f", "0"]).is_err());
        assert!(Cli::try_parse_from(["gifmaker", "convert", "-f", "61"]).is_err());
        assert!(Cli::try_parse_from(["gifmaker", "convert", "-q", "101"]).is_err());
        assert!(Cli::try_parse_from(["gifmaker", "convert", "--plain", "--no-progress"]).is_err());
    }

    #[test]
    fn test_no_arguments() {
        let cli = Cli::try_parse_from(["gifmaker"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["gifmaker", "convert", "--json"]).unwrap();
        let Some(Commands::Convert(args)) = cli.command else {
            panic!("expected convert");
        };
        assert!(!args.has_conversion_options());
    }
}

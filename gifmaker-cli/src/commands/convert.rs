//! Implementation of the 'convert' subcommand.
//!
//! Folds command-line flags (or interactive answers) into a core
//! `ConvertConfig`, runs the conversion with the live progress display and
//! prints the summary.

use crate::cli::ConvertArgs;
use crate::cli_error;
use crate::error::{CliErrorContext, CliResult};
use crate::output::{print_heading, print_status, print_summary};
use crate::prompt::{Prompter, TermPrompter, prompt_convert_options};

use gifmaker_core::{
    ConvertConfig, PreparedConversion, ProgressMode, default_locator, default_output_path,
};

use log::debug;
use std::io::IsTerminal;

/// Picks the progress mode from the flags and whether stderr is a terminal.
pub fn progress_mode(args: &ConvertArgs, stderr_is_terminal: bool) -> ProgressMode {
    if args.no_progress {
        ProgressMode::Disabled
    } else if args.plain || !stderr_is_terminal {
        ProgressMode::Plain
    } else {
        ProgressMode::Interactive
    }
}

/// Whether the options should be collected interactively.
pub fn wants_interactive(args: &ConvertArgs) -> bool {
    args.interactive || !args.has_conversion_options()
}

/// Builds the conversion configuration.
///
/// With a prompter the paths and conversion settings come from its answers;
/// otherwise from the flags, where the input file is mandatory.
pub fn resolve_config(
    args: &ConvertArgs,
    prompter: Option<&mut dyn Prompter>,
    stderr_is_terminal: bool,
) -> CliResult<ConvertConfig> {
    let mut config = match prompter {
        Some(prompter) => {
            let answers = prompt_convert_options(prompter)?;
            let mut config = ConvertConfig::new(answers.input, answers.output);
            config.fps = answers.fps;
            config.start = answers.start;
            config.duration = answers.duration;
            config.width = answers.width;
            config.quality = answers.quality;
            config
        }
        None => {
            let input = args.input.clone().cli_context(
                "input file is required (use -i or run without arguments for interactive mode)",
            )?;
            let output = args.output.clone().unwrap_or_else(|| default_output_path(&input));
            let mut config = ConvertConfig::new(input, output);
            if let Some(fps) = args.fps {
                config.fps = fps;
            }
            if let Some(quality) = args.quality {
                config.quality = quality;
            }
            config.start = args.start.clone().filter(|s| !s.trim().is_empty());
            config.duration = args.duration.clone().filter(|s| !s.trim().is_empty());
            config.width = args.width;
            config
        }
    };

    config.progress = progress_mode(args, stderr_is_terminal);
    config.threads = args.threads.map(|t| t as usize);
    config.ffmpeg_path = args.ffmpeg.clone();
    config.validate()?;
    Ok(config)
}

/// Runs the convert command.
pub fn run_convert(args: ConvertArgs, verbose: bool) -> CliResult<()> {
    let stderr_is_terminal = std::io::stderr().is_terminal();
    let config = if wants_interactive(&args) {
        debug!("Collecting options interactively");
        let mut prompter = TermPrompter::new();
        resolve_config(&args, Some(&mut prompter), stderr_is_terminal)?
    } else {
        resolve_config(&args, None, stderr_is_terminal)?
    };

    let locator = default_locator(&config);
    let prepared = PreparedConversion::prepare(&config, &locator)?;
    if verbose {
        eprintln!("ffmpeg command: {}", prepared.command_line());
    }

    if !args.json {
        print_heading("Converting");
        print_status("Input", &config.input.display().to_string());
        print_status("Output", &config.output.display().to_string());
        if let Some(d) = prepared.expected_duration {
            print_status("Clip length", &gifmaker_core::format_duration(d));
        }
    }

    let summary = prepared.run()?;
    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| cli_error!("Failed to serialize summary: {}", e))?;
        println!("{json}");
    } else {
        print_summary(&summary);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::tests::ScriptedPrompter;
    use gifmaker_core::CoreError;
    use std::path::PathBuf;

    fn input_file(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("clip.mov");
        std::fs::write(&path, b"video").unwrap();
        path
    }

    #[test]
    fn test_progress_mode_selection() {
        let mut args = ConvertArgs::default();
        assert_eq!(progress_mode(&args, true), ProgressMode::Interactive);
        assert_eq!(progress_mode(&args, false), ProgressMode::Plain);
        args.plain = true;
        assert_eq!(progress_mode(&args, true), ProgressMode::Plain);
        args.plain = false;
        args.no_progress = true;
        assert_eq!(progress_mode(&args, true), ProgressMode::Disabled);
    }

    #[test]
    fn test_interactive_when_no_options() {
        assert!(wants_interactive(&ConvertArgs::default()));
        let args = ConvertArgs {
            json: true,
            plain: true,
            ..ConvertArgs::default()
        };
        assert!(wants_interactive(&args));
        let args = ConvertArgs {
            fps: Some(12),
            ..ConvertArgs::default()
        };
        assert!(!wants_interactive(&args));
    }

    #[test]
    fn test_missing_input_is_rejected() {
        let args = ConvertArgs {
            fps: Some(12),
            ..ConvertArgs::default()
        };
        let err = resolve_config(&args, None, false).unwrap_err();
        assert!(err.to_string().contains("input file is required"));
    }

    #[test]
    fn test_flags_map_onto_config() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir);
        let args = ConvertArgs {
            input: Some(input.clone()),
            fps: Some(24),
            width: Some(640),
            quality: Some(60),
            start: Some("00:00:01".into()),
            duration: Some(String::new()),
            threads: Some(3),
            no_progress: true,
            ..ConvertArgs::default()
        };
        let config = resolve_config(&args, None, true).unwrap();
        assert_eq!(config.input, input);
        assert_eq!(config.output, PathBuf::from("clip.gif"));
        assert_eq!(config.fps, 24);
        assert_eq!(config.width, Some(640));
        assert_eq!(config.quality, 60);
        assert_eq!(config.start.as_deref(), Some("00:00:01"));
        assert_eq!(config.duration, None);
        assert_eq!(config.threads, Some(3));
        assert_eq!(config.progress, ProgressMode::Disabled);
    }

    #[test]
    fn test_invalid_time_flag() {
        let dir = tempfile::tempdir().unwrap();
        let args = ConvertArgs {
            input: Some(input_file(&dir)),
            start: Some("1:00".into()),
            ..ConvertArgs::default()
        };
        let err = resolve_config(&args, None, false).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTime { field: "start time", .. }));
    }

    #[test]
    fn test_prompted_answers_with_flag_settings() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir);
        let input_str = input.display().to_string();
        let answers = [input_str.as_str(), "", "8", "", "00:00:04", "480"];
        let mut prompter = ScriptedPrompter::new(&answers, &[0]);
        let args = ConvertArgs {
            interactive: true,
            plain: true,
            ..ConvertArgs::default()
        };
        let config = resolve_config(&args, Some(&mut prompter), true).unwrap();
        assert_eq!(config.output, input.with_extension("gif"));
        assert_eq!(config.fps, 8);
        assert_eq!(config.duration.as_deref(), Some("00:00:04"));
        assert_eq!(config.width, Some(480));
        assert_eq!(config.quality, 50);
        assert_eq!(config.progress, ProgressMode::Plain);
    }
}

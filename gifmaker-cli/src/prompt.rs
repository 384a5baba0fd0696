// ============================================================================
// gifmaker-cli/src/prompt.rs
// ============================================================================
//
// INTERACTIVE MODE: Question-and-answer collection of conversion options
//
// Used when `convert` runs without arguments or with --interactive. Each
// answer is validated on the spot and asked again when invalid, up to a
// small number of attempts.
//
// KEY COMPONENTS:
// - Prompter: the question/answer seam (terminal or scripted)
// - TermPrompter: console::Term backed implementation
// - prompt_convert_options: the sequence of questions
//
// AI-ASSISTANT-INFO: Interactive option prompts for the convert command

use crate::cli_error;
use crate::config::{DEFAULT_QUALITY_CHOICE, QUALITY_CHOICES};
use crate::error::{CliErrorContext, CliResult};
use console::{Term, style};
use gifmaker_core::config::{DEFAULT_FPS, MAX_FPS};
use gifmaker_core::parse_clip_time;
use std::path::PathBuf;

/// Answers allowed per question before giving up.
pub const MAX_ATTEMPTS: usize = 3;

/// Source of answers for interactive mode.
pub trait Prompter {
    /// Asks for free text. An empty answer yields `default`, or "" without one.
    fn input(&mut self, message: &str, default: Option<&str>) -> CliResult<String>;

    /// Asks for one of `items`, returning its index.
    fn select(&mut self, message: &str, items: &[&str], default: usize) -> CliResult<usize>;

    /// Reports a rejected answer.
    fn invalid(&mut self, message: &str);
}

/// Prompts on the controlling terminal (stderr for questions, stdin for answers).
pub struct TermPrompter {
    term: Term,
}

impl TermPrompter {
    pub fn new() -> Self {
        Self { term: Term::stderr() }
    }
}

impl Default for TermPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TermPrompter {
    fn input(&mut self, message: &str, default: Option<&str>) -> CliResult<String> {
        let question = match default {
            Some(d) if !d.is_empty() => format!("{} {} ({}): ", style("?").green(), message, d),
            _ => format!("{} {} ", style("?").green(), message),
        };
        self.term.write_str(&question).cli_context("Failed to write prompt")?;
        let answer = self.term.read_line().cli_context("Failed to read answer")?;
        let answer = answer.trim();
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer.to_string())
        }
    }

    fn select(&mut self, message: &str, items: &[&str], default: usize) -> CliResult<usize> {
        self.term
            .write_line(&format!("{} {}", style("?").green(), message))
            .cli_context("Failed to write prompt")?;
        for (i, item) in items.iter().enumerate() {
            let marker = if i == default { ">" } else { " " };
            self.term
                .write_line(&format!("  {} {}) {}", marker, i + 1, item))
                .cli_context("Failed to write prompt")?;
        }
        for _ in 0..MAX_ATTEMPTS {
            let answer = self.input("Choice", Some(&(default + 1).to_string()))?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Ok(n - 1),
                _ => self.invalid(&format!("enter a number from 1 to {}", items.len())),
            }
        }
        Err(cli_error!("No valid choice for '{}'", message))
    }

    fn invalid(&mut self, message: &str) {
        let _ = self.term.write_line(&format!("{} {}", style("✗").red(), message));
    }
}

/// Options gathered from the user in interactive mode.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptedOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub fps: u32,
    pub start: Option<String>,
    pub duration: Option<String>,
    pub width: Option<u32>,
    pub quality: u8,
}

/// Asks until `parse` accepts an answer or the attempts run out.
fn ask<T>(
    prompter: &mut dyn Prompter,
    message: &str,
    default: Option<&str>,
    mut parse: impl FnMut(&str) -> Result<T, String>,
) -> CliResult<T> {
    for _ in 0..MAX_ATTEMPTS {
        let answer = prompter.input(message, default)?;
        match parse(answer.trim()) {
            Ok(value) => return Ok(value),
            Err(reason) => prompter.invalid(&reason),
        }
    }
    Err(cli_error!("Too many invalid answers for '{}'", message))
}

fn optional_time(answer: &str) -> Result<Option<String>, String> {
    if answer.is_empty() {
        return Ok(None);
    }
    parse_clip_time(answer)
        .map(|_| Some(answer.to_string()))
        .ok_or_else(|| format!("'{answer}' is not a valid time, use HH:MM:SS"))
}

/// Runs the interactive question sequence.
pub fn prompt_convert_options(prompter: &mut dyn Prompter) -> CliResult<PromptedOptions> {
    let input = ask(prompter, "Input video file path:", None, |answer| {
        if answer.is_empty() {
            return Err("an input file is required".to_string());
        }
        let path = PathBuf::from(answer);
        if path.is_file() {
            Ok(path)
        } else {
            Err(format!("'{answer}' does not exist"))
        }
    })?;

    let default_output = input.with_extension("gif").display().to_string();
    let output = ask(prompter, "Output GIF file path:", Some(&default_output), |answer| {
        Ok(PathBuf::from(answer))
    })?;

    let default_fps = DEFAULT_FPS.to_string();
    let fps = ask(
        prompter,
        "Frames per second (higher = smoother but larger file):",
        Some(&default_fps),
        |answer| match answer.parse::<u32>() {
            Ok(n) if (1..=MAX_FPS).contains(&n) => Ok(n),
            _ => Err(format!("fps must be a number from 1 to {MAX_FPS}")),
        },
    )?;

    let start = ask(
        prompter,
        "Start time (format: 00:00:00, leave empty for beginning):",
        None,
        optional_time,
    )?;
    let duration = ask(
        prompter,
        "Duration (format: 00:00:00, leave empty for full video):",
        None,
        optional_time,
    )?;

    let width = ask(
        prompter,
        "Width in pixels (leave empty to keep original size):",
        None,
        |answer| {
            if answer.is_empty() {
                return Ok(None);
            }
            match answer.parse::<u32>() {
                Ok(n) if n > 0 => Ok(Some(n)),
                _ => Err("width must be a positive number".to_string()),
            }
        },
    )?;

    let labels: Vec<&str> = QUALITY_CHOICES.iter().map(|(label, _)| *label).collect();
    let choice = prompter.select("Select quality:", &labels, DEFAULT_QUALITY_CHOICE)?;
    let quality = QUALITY_CHOICES
        .get(choice)
        .map(|(_, q)| *q)
        .cli_with_context(|| format!("Invalid quality choice {choice}"))?;

    Ok(PromptedOptions {
        input,
        output,
        fps,
        start,
        duration,
        width,
        quality,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays canned answers; "" stands for pressing enter.
    #[derive(Default)]
    pub(crate) struct ScriptedPrompter {
        answers: VecDeque<String>,
        choices: VecDeque<usize>,
        pub rejected: Vec<String>,
    }

    impl ScriptedPrompter {
        pub(crate) fn new(answers: &[&str], choices: &[usize]) -> Self {
            Self {
                answers: answers.iter().map(|s| s.to_string()).collect(),
                choices: choices.iter().copied().collect(),
                rejected: Vec::new(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn input(&mut self, message: &str, default: Option<&str>) -> CliResult<String> {
            let answer = self
                .answers
                .pop_front()
                .cli_with_context(|| format!("no scripted answer for '{message}'"))?;
            if answer.is_empty() {
                Ok(default.unwrap_or_default().to_string())
            } else {
                Ok(answer)
            }
        }

        fn select(&mut self, _message: &str, _items: &[&str], default: usize) -> CliResult<usize> {
            Ok(self.choices.pop_front().unwrap_or(default))
        }

        fn invalid(&mut self, message: &str) {
            self.rejected.push(message.to_string());
        }
    }

    fn input_file() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holiday.mp4");
        std::fs::write(&path, b"video").unwrap();
        let path = path.display().to_string();
        (dir, path)
    }

    #[test]
    fn test_defaults_accepted() {
        let (_dir, input) = input_file();
        let mut p = ScriptedPrompter::new(&[&input, "", "", "", "", ""], &[]);
        let opts = prompt_convert_options(&mut p).unwrap();
        assert_eq!(opts.input, PathBuf::from(&input));
        assert_eq!(opts.output, PathBuf::from(&input).with_extension("gif"));
        assert_eq!(opts.fps, 10);
        assert_eq!(opts.start, None);
        assert_eq!(opts.duration, None);
        assert_eq!(opts.width, None);
        assert_eq!(opts.quality, 75);
        assert!(p.rejected.is_empty());
    }

    #[test]
    fn test_invalid_answers_are_asked_again() {
        let (_dir, input) = input_file();
        let mut p = ScriptedPrompter::new(
            &[
                "/no/such/file.mp4",
                &input,
                "out.gif",
                "0",
                "15",
                "1:2",
                "00:00:02",
                "00:00:03.5",
                "wide",
                "320",
            ],
            &[2],
        );
        let opts = prompt_convert_options(&mut p).unwrap();
        assert_eq!(opts.output, PathBuf::from("out.gif"));
        assert_eq!(opts.fps, 15);
        assert_eq!(opts.start.as_deref(), Some("00:00:02"));
        assert_eq!(opts.duration.as_deref(), Some("00:00:03.5"));
        assert_eq!(opts.width, Some(320));
        assert_eq!(opts.quality, 95);
        assert_eq!(p.rejected.len(), 4);
    }

    #[test]
    fn test_gives_up_after_repeated_invalid_input() {
        let mut p = ScriptedPrompter::new(&["", "", ""], &[]);
        let err = prompt_convert_options(&mut p).unwrap_err();
        assert!(err.to_string().contains("Too many invalid answers"));
        assert_eq!(p.rejected.len(), MAX_ATTEMPTS);
    }
}

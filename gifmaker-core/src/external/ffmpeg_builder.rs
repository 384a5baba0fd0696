//! FFmpeg command builder utilities
//!
//! Builds the palette-based GIF invocation. Argument construction is pure
//! string building so the exact command line can be tested and displayed;
//! only [`FfmpegCommandBuilder::build`] touches ffmpeg-sidecar.

use crate::config::ConvertConfig;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::path::Path;
use std::process::Stdio;

/// Palette generation settings used for every conversion.
pub const PALETTEGEN_OPTIONS: &str = "max_colors=256:stats_mode=diff";

/// Palette application settings used for every conversion.
pub const PALETTEUSE_OPTIONS: &str =
    "dither=sierra2_4a:diff_mode=rectangle:alpha_threshold=128";

/// Builder for the `-filter_complex` graph of a GIF conversion.
///
/// The graph resamples to the target frame rate, optionally scales, then
/// splits the stream so one branch generates a palette that the other
/// branch is mapped through.
#[derive(Debug, Clone)]
pub struct GifFilterChain {
    fps: u32,
    width: Option<u32>,
}

impl GifFilterChain {
    #[must_use]
    pub fn new(fps: u32) -> Self {
        Self { fps, width: None }
    }

    /// Scales to `width` pixels, keeping the aspect ratio, with lanczos resampling.
    #[must_use]
    pub fn with_width(mut self, width: Option<u32>) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn build(&self) -> String {
        let mut filters = vec![format!("fps={}", self.fps)];
        if let Some(w) = self.width {
            filters.push(format!("scale={w}:-1:flags=lanczos"));
        }
        filters.push("split[s0][s1]".to_string());

        format!(
            "{};[s0]palettegen={PALETTEGEN_OPTIONS}[p];[s1][p]paletteuse={PALETTEUSE_OPTIONS}",
            filters.join(",")
        )
    }
}

/// Builds the full ffmpeg argument list for a conversion.
///
/// The order is fixed: global options, progress reporting on stdout, the
/// optional trim flags (placed before `-i` so ffmpeg seeks the input), the
/// input, the filter graph and finally the output.
#[must_use]
pub fn build_convert_args(config: &ConvertConfig, threads: usize) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "info".to_string(),
        "-threads".to_string(),
        threads.to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-stats_period".to_string(),
        "0.1".to_string(),
    ];

    if let Some(start) = config.start.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        args.push("-ss".to_string());
        args.push(start.to_string());
    }
    if let Some(duration) = config
        .duration
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        args.push("-t".to_string());
        args.push(duration.to_string());
    }

    args.push("-i".to_string());
    args.push(config.input.to_string_lossy().into_owned());
    args.push("-filter_complex".to_string());
    args.push(GifFilterChain::new(config.fps).with_width(config.width).build());
    args.push(config.output.to_string_lossy().into_owned());
    args
}

/// Renders a command line for display, quoting arguments that need it.
#[must_use]
pub fn format_command_line(program: &Path, args: &[String]) -> String {
    let quote = |s: &str| {
        let plain = !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@".contains(c));
        if plain {
            s.to_string()
        } else {
            format!("'{}'", s.replace('\'', r"'\''"))
        }
    };
    std::iter::once(quote(&program.to_string_lossy()))
        .chain(args.iter().map(|a| quote(a)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builder for the ffmpeg process itself.
pub struct FfmpegCommandBuilder {
    cmd: FfmpegCommand,
}

impl FfmpegCommandBuilder {
    /// Starts a command for the ffmpeg at `program`.
    #[must_use]
    pub fn new(program: &Path) -> Self {
        Self {
            cmd: FfmpegCommand::new_with_path(program),
        }
    }

    #[must_use]
    pub fn args(mut self, args: &[String]) -> Self {
        self.cmd.args(args);
        self
    }

    /// Builds the command with stdout and stderr piped separately.
    ///
    /// ffmpeg-sidecar requires all three standard streams to stay piped.
    #[must_use]
    pub fn build(mut self) -> FfmpegCommand {
        self.cmd
            .as_inner_mut()
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        self.cmd
    }
}

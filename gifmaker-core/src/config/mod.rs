//! Configuration structures and constants for the gifmaker-core library.
//!
//! A [`ConvertConfig`] is resolved once per invocation (by the CLI flags, the
//! interactive prompts, or the builder) and passed by reference to the
//! conversion orchestrator. Nothing in the library reads global flags.

mod builder;

use crate::error::{CoreError, CoreResult};
use crate::utils::validate_clip_time;
use std::path::PathBuf;
use std::time::Duration;

pub use builder::ConvertConfigBuilder;

// Default constants

/// Default output frame rate of the GIF.
pub const DEFAULT_FPS: u32 = 10;

/// Highest frame rate accepted for a GIF. Browsers clamp delays below 20ms.
pub const MAX_FPS: u32 = 60;

/// Default quality level (1-100).
pub const DEFAULT_QUALITY: u8 = 90;

/// Quality presets offered by interactive prompting.
pub const QUALITY_LOW: u8 = 50;
pub const QUALITY_MEDIUM: u8 = 75;
pub const QUALITY_HIGH: u8 = 95;

/// Redraw cadence of the interactive progress display.
pub const DEFAULT_RENDER_TICK: Duration = Duration::from_millis(100);

/// Interval between status lines in plain progress mode.
pub const DEFAULT_PLAIN_INTERVAL: Duration = Duration::from_secs(2);

/// Number of trailing stderr characters kept for error reports.
pub const STDERR_TAIL_CHARS: usize = 500;

/// Capacity of the scanner-to-renderer event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How conversion progress is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressMode {
    /// Fixed-height display redrawn in place on the terminal.
    #[default]
    Interactive,
    /// Periodic single status lines without cursor control, for logs and pipes.
    Plain,
    /// No progress output at all.
    Disabled,
}

/// Fully resolved configuration for a single conversion.
///
/// # Examples
///
/// ```rust,no_run
/// use gifmaker_core::config::ConvertConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConvertConfigBuilder::new()
///     .input(PathBuf::from("clip.mp4"))
///     .output(PathBuf::from("clip.gif"))
///     .fps(15)
///     .width(480)
///     .start("00:00:05")
///     .duration("00:00:03.5")
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertConfig {
    /// Source video file
    pub input: PathBuf,

    /// Destination GIF file
    pub output: PathBuf,

    /// Output frame rate
    pub fps: u32,

    /// Optional clip start, `HH:MM:SS[.ms]`
    pub start: Option<String>,

    /// Optional clip length, `HH:MM:SS[.ms]`
    pub duration: Option<String>,

    /// Optional output width in pixels; height follows the aspect ratio
    pub width: Option<u32>,

    /// Quality level 1-100. Recorded with the run; the palette filter chain
    /// itself is fixed.
    pub quality: u8,

    /// How progress is displayed
    pub progress: ProgressMode,

    /// Thread count override for ffmpeg
    pub threads: Option<usize>,

    /// Explicit ffmpeg executable, bypassing lookup
    pub ffmpeg_path: Option<PathBuf>,
}

impl ConvertConfig {
    /// Creates a configuration with defaults for everything but the paths.
    pub fn new(input: PathBuf, output: PathBuf) -> Self {
        Self {
            input,
            output,
            fps: DEFAULT_FPS,
            start: None,
            duration: None,
            width: None,
            quality: DEFAULT_QUALITY,
            progress: ProgressMode::default(),
            threads: None,
            ffmpeg_path: None,
        }
    }

    /// Clip start in seconds, if one is set and valid.
    pub fn start_seconds(&self) -> CoreResult<Option<f64>> {
        validate_clip_time("start time", self.start.as_deref())
    }

    /// Clip length in seconds, if one is set and valid.
    pub fn duration_seconds(&self) -> CoreResult<Option<f64>> {
        validate_clip_time("duration", self.duration.as_deref())
    }

    /// Validates the configuration.
    ///
    /// Checks that the input exists, that numeric settings are in range and
    /// that both clip times are well formed. Nothing is spawned on failure.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.input.is_file() {
            return Err(CoreError::InputNotFound(self.input.clone()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(CoreError::InvalidConfig("output path is empty".to_string()));
        }
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(CoreError::InvalidConfig(format!(
                "fps must be between 1 and {MAX_FPS}, got {}",
                self.fps
            )));
        }
        if self.width == Some(0) {
            return Err(CoreError::InvalidConfig("width must be at least 1".to_string()));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(CoreError::InvalidConfig(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if self.threads == Some(0) {
            return Err(CoreError::InvalidConfig("threads must be at least 1".to_string()));
        }
        self.start_seconds()?;
        if let Some(d) = self.duration_seconds()? {
            if d <= 0.0 {
                return Err(CoreError::InvalidConfig("duration must be positive".to_string()));
            }
        }
        Ok(())
    }
}

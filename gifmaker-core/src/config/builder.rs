// ============================================================================
// gifmaker-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for ConvertConfig
//
// Fluent construction of ConvertConfig with defaults for every optional
// setting. The CLI uses it to fold flags and prompt answers together.
//
// AI-ASSISTANT-INFO: Builder pattern implementation for ConvertConfig

use std::path::PathBuf;

use super::{ConvertConfig, ProgressMode};

/// Builder for creating ConvertConfig instances.
#[derive(Debug, Clone, Default)]
pub struct ConvertConfigBuilder {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    fps: Option<u32>,
    start: Option<String>,
    duration: Option<String>,
    width: Option<u32>,
    quality: Option<u8>,
    progress: Option<ProgressMode>,
    threads: Option<usize>,
    ffmpeg_path: Option<PathBuf>,
}

impl ConvertConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source video.
    pub fn input(mut self, input: PathBuf) -> Self {
        self.input = Some(input);
        self
    }

    /// Sets the destination GIF.
    pub fn output(mut self, output: PathBuf) -> Self {
        self.output = Some(output);
        self
    }

    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Sets the clip start (`HH:MM:SS[.ms]`). Validated by `ConvertConfig::validate`.
    pub fn start(mut self, start: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// Sets the clip length (`HH:MM:SS[.ms]`).
    pub fn duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn progress(mut self, progress: ProgressMode) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Uses this ffmpeg executable instead of searching for one.
    pub fn ffmpeg_path(mut self, path: PathBuf) -> Self {
        self.ffmpeg_path = Some(path);
        self
    }

    /// Builds the configuration.
    ///
    /// A missing output falls back to the input's stem with a `.gif`
    /// extension in the current directory.
    pub fn build(self) -> ConvertConfig {
        let input = self.input.unwrap_or_default();
        let output = self
            .output
            .unwrap_or_else(|| crate::utils::default_output_path(&input));

        let mut config = ConvertConfig::new(input, output);
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(progress) = self.progress {
            config.progress = progress;
        }
        config.start = self.start;
        config.duration = self.duration;
        config.width = self.width;
        config.threads = self.threads;
        config.ffmpeg_path = self.ffmpeg_path;
        config
    }
}

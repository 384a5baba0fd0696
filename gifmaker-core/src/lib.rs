//! Core library for converting videos to animated GIFs with ffmpeg.
//!
//! The interesting part is the progress pipeline: ffmpeg's streaming status
//! output is scanned line by line into events, folded into a single progress
//! state and drawn to the terminal in place while the conversion runs.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use gifmaker_core::{ConvertConfigBuilder, convert, default_locator};
//! use std::path::PathBuf;
//!
//! let config = ConvertConfigBuilder::new()
//!     .input(PathBuf::from("clip.mp4"))
//!     .fps(12)
//!     .width(480)
//!     .build();
//!
//! let summary = convert(&config, &default_locator(&config)).unwrap();
//! println!("{} frames written to {}", summary.frames, summary.output.display());
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod external;
pub mod progress;
pub mod utils;

// Re-exports for public API
pub use config::{ConvertConfig, ConvertConfigBuilder, ProgressMode};
pub use convert::{ConversionSummary, PreparedConversion, convert, default_locator};
pub use error::{CoreError, CoreResult};
pub use external::{
    FfmpegInstallation, FfmpegLocator, FixedLocator, MediaInfo, Platform, SystemLocator,
    estimate_gif_size, preflight, probe_media,
};
pub use progress::{ProgressAggregator, ProgressEvent, ProgressState, StatusScanner};
pub use utils::{
    SizeUnit, SizeValue, default_output_path, format_bytes, format_duration, format_elapsed,
    parse_clip_time, parse_ffmpeg_time,
};

// ============================================================================
// gifmaker-core/src/progress/mod.rs
// ============================================================================
//
// PROGRESS TRACKING: From ffmpeg Status Text to a Live Display
//
// ffmpeg's status output flows through three stages:
//
//   stdout bytes -> StatusScanner -> ProgressEvent
//                -> ProgressAggregator (single writer of ProgressState)
//                -> TerminalRenderer (reads the state on a fixed tick)
//
// The scanner knows about text and regexes, the aggregator about smoothing
// and estimation, the renderer about the terminal. ProgressEvent is the only
// type the three share besides the state itself.
//
// AI-ASSISTANT-INFO: Progress pipeline types and submodules

pub mod aggregator;
pub mod render;
pub mod scanner;

pub use aggregator::{ProgressAggregator, ProgressState};
pub use render::{DisplayStyle, RenderFrame, TerminalRenderer, render_bar};
pub use scanner::{ScanEvents, StatusScanner};

use crate::utils::SizeValue;
use serde::Serialize;

/// A bitrate as reported by ffmpeg, e.g. `1234.5kbits/s`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bitrate {
    pub value: f64,
    /// Unit without the `/s` suffix, e.g. `kbits`
    pub unit: String,
}

/// Everything recognized on one status line. Fields that did not appear on
/// the line are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressEvent {
    /// Position in the output timeline, seconds
    pub position: Option<f64>,
    /// Total duration of the input, seconds
    pub total_duration: Option<f64>,
    /// Processing speed relative to real time
    pub rate: Option<f64>,
    pub size: Option<SizeValue>,
    pub bitrate: Option<Bitrate>,
    pub frames: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ProgressEvent {
    /// True when no field was recognized.
    pub fn is_empty(&self) -> bool {
        *self == ProgressEvent::default()
    }
}

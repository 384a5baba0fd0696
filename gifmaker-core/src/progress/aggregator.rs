//! Progress aggregation.
//!
//! [`ProgressAggregator`] is the single writer of [`ProgressState`]. It folds
//! events in arrival order: present fields overwrite, absent fields are left
//! alone. On top of the raw values it keeps a cumulative mean of the
//! processing rate, a short window of instantaneous frame rates, and an
//! advisory total-frame estimate used while the duration is unknown.

use super::{Bitrate, ProgressEvent};
use crate::utils::SizeValue;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of instantaneous fps samples kept for smoothing.
pub const FPS_WINDOW: usize = 15;

/// Advancing frame observations required before estimating a total.
pub const FRAME_ESTIMATE_WARMUP: u32 = 5;

/// Multiplier applied to the current frame count to guess the total.
pub const FRAME_ESTIMATE_FACTOR: u64 = 10;

/// Running aggregate of everything observed during one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    pub started: Instant,
    /// Latest observed position, seconds, clamped to the total once known
    pub position: f64,
    /// Total duration in seconds; 0 while unknown
    pub total_duration: f64,
    /// Latest processing rate
    pub rate: f64,
    pub size: Option<SizeValue>,
    pub bitrate: Option<Bitrate>,
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    /// Cumulative mean of every rate sample
    pub average_rate: f64,
    /// Advisory guess of the final frame count
    pub estimated_total_frames: Option<u64>,
    rate_sum: f64,
    rate_samples: u64,
    fps_window: VecDeque<f64>,
    last_frame_observation: Option<(u64, Instant)>,
    advancing_observations: u32,
}

impl ProgressState {
    pub fn new(started: Instant) -> Self {
        Self {
            started,
            position: 0.0,
            total_duration: 0.0,
            rate: 0.0,
            size: None,
            bitrate: None,
            frames: 0,
            width: 0,
            height: 0,
            average_rate: 0.0,
            estimated_total_frames: None,
            rate_sum: 0.0,
            rate_samples: 0,
            fps_window: VecDeque::with_capacity(FPS_WINDOW),
            last_frame_observation: None,
            advancing_observations: 0,
        }
    }

    pub fn has_total(&self) -> bool {
        self.total_duration > 0.0
    }

    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Wall-clock time since the conversion started.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    /// Mean of the recent instantaneous frame rates.
    pub fn smoothed_fps(&self) -> Option<f64> {
        if self.fps_window.is_empty() {
            return None;
        }
        Some(self.fps_window.iter().sum::<f64>() / self.fps_window.len() as f64)
    }

    pub fn fps_samples(&self) -> usize {
        self.fps_window.len()
    }
}

/// Folds [`ProgressEvent`]s into a [`ProgressState`].
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    state: ProgressState,
}

impl ProgressAggregator {
    pub fn new(started: Instant) -> Self {
        Self {
            state: ProgressState::new(started),
        }
    }

    /// Seeds the total duration, typically from probing the input.
    #[must_use]
    pub fn with_total(mut self, total: Option<f64>) -> Self {
        if let Some(t) = total.filter(|t| t.is_finite() && *t > 0.0) {
            self.state.total_duration = t;
        }
        self
    }

    /// Seeds the expected output dimensions.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: Option<(u32, u32)>) -> Self {
        if let Some((w, h)) = dimensions {
            self.state.width = w;
            self.state.height = h;
        }
        self
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn into_state(self) -> ProgressState {
        self.state
    }

    pub fn apply(&mut self, event: ProgressEvent) {
        self.apply_at(event, Instant::now());
    }

    /// Applies one event observed at `now`.
    ///
    /// Every rate counts toward the mean, repeats included. A frame count
    /// that does not advance leaves the fps window alone.
    pub fn apply_at(&mut self, event: ProgressEvent, now: Instant) {
        let state = &mut self.state;

        if let Some(total) = event.total_duration.filter(|t| *t > 0.0) {
            state.total_duration = total;
        }
        if let Some(position) = event.position.filter(|p| *p >= 0.0) {
            state.position = position;
        }
        if state.has_total() && state.position > state.total_duration {
            state.position = state.total_duration;
        }

        if let Some(rate) = event.rate.filter(|r| *r > 0.0) {
            state.rate = rate;
            state.rate_sum += rate;
            state.rate_samples += 1;
            state.average_rate = state.rate_sum / state.rate_samples as f64;
        }

        if let Some(size) = event.size {
            state.size = Some(size);
        }
        if let Some(bitrate) = event.bitrate {
            state.bitrate = Some(bitrate);
        }
        if let (Some(w), Some(h)) = (event.width, event.height) {
            state.width = w;
            state.height = h;
        }

        if let Some(frames) = event.frames {
            Self::observe_frames(state, frames, now);
        }
    }

    fn observe_frames(state: &mut ProgressState, frames: u64, now: Instant) {
        if frames <= state.frames && state.last_frame_observation.is_some() {
            return;
        }

        if let Some((prev_frames, prev_at)) = state.last_frame_observation {
            let dt = now.saturating_duration_since(prev_at).as_secs_f64();
            if dt > 0.0 {
                let instant_fps = (frames - prev_frames) as f64 / dt;
                if state.fps_window.len() == FPS_WINDOW {
                    state.fps_window.pop_front();
                }
                state.fps_window.push_back(instant_fps);
            }
        }
        state.frames = frames;
        state.last_frame_observation = Some((frames, now));
        state.advancing_observations = state.advancing_observations.saturating_add(1);

        if state.advancing_observations >= FRAME_ESTIMATE_WARMUP {
            let overtaken = state
                .estimated_total_frames
                .is_none_or(|estimate| frames >= estimate);
            if overtaken {
                state.estimated_total_frames = Some(frames.saturating_mul(FRAME_ESTIMATE_FACTOR));
            }
        }
    }
}

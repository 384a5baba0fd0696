// ============================================================================
// gifmaker-core/src/progress/render.rs
// ============================================================================
//
// TERMINAL RENDERER: In-Place Progress Display
//
// The renderer pulls a snapshot of ProgressState on every tick, derives a
// RenderFrame from it and redraws a fixed block of lines: the cursor is moved
// up over the previous block and each line is cleared and rewritten. Two
// layouts exist:
//
// - unknown total: one spinner line with elapsed time, frames and fps
// - known total: a four-line block led by a proportional bar
//
// Plain style prints an occasional single line instead, with no cursor
// control, for pipes and log capture. Write failures never propagate: the
// renderer logs once and stops drawing.
//
// AI-ASSISTANT-INFO: Live progress rendering for the conversion pipeline

use super::ProgressState;
use crate::config::DEFAULT_PLAIN_INTERVAL;
use crate::utils::{SizeValue, format_bytes, format_duration, format_size};
use console::{Term, style};
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Terminal width used when the real width cannot be determined.
pub const FALLBACK_WIDTH: usize = 80;

/// Bounds of the progress bar, in cells.
pub const MIN_BAR_WIDTH: usize = 10;
pub const MAX_BAR_WIDTH: usize = 50;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FILLED: &str = "█";
const EMPTY: &str = "░";
const ESTIMATING: &str = "estimating…";
const ANALYZING: &str = "analyzing…";

/// Fps samples needed before a remaining-time estimate is shown without a total.
const MIN_FPS_SAMPLES: usize = 3;

/// Everything a redraw needs, derived from one state snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub known_total: bool,
    /// Always within [0, 100]; 0 while the total is unknown
    pub percent: f64,
    pub elapsed: Duration,
    /// Seconds left, when it can be estimated
    pub remaining: Option<f64>,
    pub current_size: Option<SizeValue>,
    /// Projected final size in bytes
    pub estimated_final_bytes: Option<u64>,
    pub frames: u64,
    pub rate: f64,
    pub fps: Option<f64>,
    pub dimensions: Option<(u32, u32)>,
    pub bar_width: usize,
}

impl RenderFrame {
    /// Projects `state` for a terminal `width` columns wide.
    pub fn from_state(state: &ProgressState, now: Instant, width: usize) -> Self {
        let known_total = state.has_total();
        let percent = if known_total {
            let pct = state.position / state.total_duration * 100.0;
            if pct.is_finite() { pct.clamp(0.0, 100.0) } else { 0.0 }
        } else {
            0.0
        };

        let fps = state.smoothed_fps().filter(|f| f.is_finite() && *f > 0.0);
        let remaining = if known_total {
            (state.rate > 0.0)
                .then(|| ((state.total_duration - state.position) / state.rate).max(0.0))
        } else {
            match (state.estimated_total_frames, fps) {
                (Some(total), Some(fps)) if state.fps_samples() >= MIN_FPS_SAMPLES => {
                    Some(total.saturating_sub(state.frames) as f64 / fps)
                }
                _ => None,
            }
        };

        let estimated_final_bytes = match state.size {
            Some(size) if known_total && state.position > 0.0 => {
                let projected = size.to_bytes() as f64 * state.total_duration / state.position;
                projected.is_finite().then_some(projected as u64)
            }
            _ => None,
        };

        Self {
            known_total,
            percent,
            elapsed: state.elapsed(now),
            remaining,
            current_size: state.size,
            estimated_final_bytes,
            frames: state.frames,
            rate: state.rate,
            fps,
            dimensions: state.has_dimensions().then_some((state.width, state.height)),
            bar_width: bar_width_for(width),
        }
    }
}

/// Bar width for a terminal `width` columns wide.
pub fn bar_width_for(width: usize) -> usize {
    width.saturating_sub(30).clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH)
}

/// A bar of `bar_width` cells with `round(bar_width * percent / 100)` filled.
pub fn render_bar(percent: f64, bar_width: usize) -> String {
    let pct = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
    let filled = ((bar_width as f64 * pct / 100.0).round() as usize).min(bar_width);
    format!("{}{}", FILLED.repeat(filled), EMPTY.repeat(bar_width - filled))
}

fn remaining_text(remaining: Option<f64>) -> String {
    remaining.map_or_else(|| ESTIMATING.to_string(), format_duration)
}

/// How the renderer writes to its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStyle {
    /// Fixed-height block redrawn in place
    Interactive,
    /// Occasional single lines, no cursor movement
    Plain,
}

/// Draws progress to a writer, usually stderr.
pub struct TerminalRenderer<W: Write> {
    out: W,
    style: DisplayStyle,
    width: Option<usize>,
    lines_drawn: usize,
    tick: usize,
    failed: bool,
    plain_interval: Duration,
    last_plain: Option<Instant>,
    last_logged_decile: u32,
}

impl TerminalRenderer<io::Stderr> {
    pub fn stderr(style: DisplayStyle) -> Self {
        Self::new(io::stderr(), style)
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, style: DisplayStyle) -> Self {
        Self {
            out,
            style,
            width: None,
            lines_drawn: 0,
            tick: 0,
            failed: false,
            plain_interval: DEFAULT_PLAIN_INTERVAL,
            last_plain: None,
            last_logged_decile: 0,
        }
    }

    /// Uses a fixed width instead of querying the terminal.
    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub fn with_plain_interval(mut self, interval: Duration) -> Self {
        self.plain_interval = interval;
        self
    }

    /// False once a write has failed; nothing is drawn after that.
    pub fn is_active(&self) -> bool {
        !self.failed
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn width(&self) -> usize {
        self.width.unwrap_or_else(|| {
            Term::stderr()
                .size_checked()
                .map(|(_, cols)| cols as usize)
                .filter(|w| *w > 0)
                .unwrap_or(FALLBACK_WIDTH)
        })
    }

    /// Redraws for the current state. Called on every tick.
    pub fn draw(&mut self, state: &ProgressState, now: Instant) {
        let width = self.width();
        let frame = RenderFrame::from_state(state, now, width);
        self.log_threshold(&frame);
        if self.failed {
            return;
        }

        let result = match self.style {
            DisplayStyle::Interactive => {
                let lines = self.interactive_lines(&frame);
                self.tick = self.tick.wrapping_add(1);
                self.redraw(&lines, width)
            }
            DisplayStyle::Plain => {
                let due = self
                    .last_plain
                    .is_none_or(|last| now.saturating_duration_since(last) >= self.plain_interval);
                if due {
                    self.last_plain = Some(now);
                    let line = plain_line(&frame);
                    writeln!(self.out, "{line}").and_then(|()| self.out.flush())
                } else {
                    Ok(())
                }
            }
        };
        self.check(result);
    }

    /// Draws the final state once more and leaves the cursor below the display.
    pub fn finish(&mut self, state: &ProgressState, now: Instant) {
        let width = self.width();
        let frame = RenderFrame::from_state(state, now, width);
        self.log_threshold(&frame);
        if self.failed {
            return;
        }
        let result = match self.style {
            DisplayStyle::Interactive => {
                let lines = self.interactive_lines(&frame);
                self.redraw(&lines, width)
            }
            DisplayStyle::Plain => {
                let line = plain_line(&frame);
                writeln!(self.out, "{line}").and_then(|()| self.out.flush())
            }
        };
        self.check(result);
        self.lines_drawn = 0;
    }

    fn check(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            log::warn!("Progress display disabled after write error: {}", e);
            self.failed = true;
        }
    }

    fn log_threshold(&mut self, frame: &RenderFrame) {
        if !frame.known_total {
            return;
        }
        let decile = (frame.percent / 10.0).floor() as u32;
        if decile > self.last_logged_decile {
            self.last_logged_decile = decile;
            log::info!(
                target: "gifmaker::progress",
                "Progress: {:.1}% (elapsed {}, remaining {}, frames {})",
                frame.percent,
                format_duration(frame.elapsed.as_secs_f64()),
                remaining_text(frame.remaining),
                frame.frames
            );
        }
    }

    fn redraw(&mut self, lines: &[String], width: usize) -> io::Result<()> {
        let max = width.saturating_sub(1).max(1);
        let mut buf = String::new();
        if self.lines_drawn > 0 {
            buf.push_str(&format!("\x1b[{}A", self.lines_drawn));
        }
        for line in lines {
            buf.push_str("\r\x1b[2K");
            buf.push_str(&console::truncate_str(line, max, "…"));
            buf.push('\n');
        }
        self.out.write_all(buf.as_bytes())?;
        self.out.flush()?;
        self.lines_drawn = lines.len();
        Ok(())
    }

    fn interactive_lines(&self, frame: &RenderFrame) -> Vec<String> {
        let elapsed = format_duration(frame.elapsed.as_secs_f64());
        let fps = frame
            .fps
            .map_or_else(|| ANALYZING.to_string(), |f| format!("{f:.1} fps"));

        if !frame.known_total {
            let spinner = SPINNER[self.tick % SPINNER.len()];
            return vec![format!(
                "{} Converting  {}  {} frames  {}  remaining {}",
                style(spinner).cyan().for_stderr(),
                elapsed,
                frame.frames,
                fps,
                remaining_text(frame.remaining)
            )];
        }

        let bar = render_bar(frame.percent, frame.bar_width);
        let size = match frame.current_size {
            Some(s) => format_size(s),
            None => ANALYZING.to_string(),
        };
        let final_size = frame
            .estimated_final_bytes
            .map_or_else(|| ESTIMATING.to_string(), format_bytes);
        let dims = frame
            .dimensions
            .map_or_else(|| ANALYZING.to_string(), |(w, h)| format!("{w}x{h}"));
        let speed = if frame.rate > 0.0 {
            format!("{:.2}x", frame.rate)
        } else {
            ANALYZING.to_string()
        };

        vec![
            format!(
                "{} {}",
                style(bar).green().for_stderr(),
                style(format!("{:5.1}%", frame.percent)).bold().for_stderr()
            ),
            format!("Elapsed: {elapsed}  Remaining: {}", remaining_text(frame.remaining)),
            format!("Size: {size}  Est. final: {final_size}"),
            format!("Frames: {}  Speed: {speed}  {fps}  Output: {dims}", frame.frames),
        ]
    }
}

/// Single status line for plain output.
pub fn plain_line(frame: &RenderFrame) -> String {
    let elapsed = format_duration(frame.elapsed.as_secs_f64());
    let speed = if frame.rate > 0.0 {
        format!(", speed {:.2}x", frame.rate)
    } else {
        String::new()
    };
    if frame.known_total {
        format!(
            "Progress: {:.1}% (elapsed {}, remaining {}), frames {}{}",
            frame.percent,
            elapsed,
            remaining_text(frame.remaining),
            frame.frames,
            speed
        )
    } else {
        format!("Progress: elapsed {}, frames {}{}", elapsed, frame.frames, speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{ProgressAggregator, ProgressEvent};
    use crate::utils::SizeUnit;

    fn state_with(total: Option<f64>, position: f64) -> ProgressState {
        let start = Instant::now();
        let mut agg = ProgressAggregator::new(start).with_total(total);
        agg.apply_at(
            ProgressEvent {
                position: Some(position),
                rate: Some(2.0),
                frames: Some(40),
                size: Some(SizeValue::new(100, SizeUnit::KB)),
                ..ProgressEvent::default()
            },
            start,
        );
        agg.into_state()
    }

    #[test]
    fn test_render_bar() {
        assert_eq!(render_bar(0.0, 10), "░░░░░░░░░░");
        assert_eq!(render_bar(50.0, 10), "█████░░░░░");
        assert_eq!(render_bar(100.0, 10), "██████████");
        assert_eq!(render_bar(250.0, 10), "██████████");
        assert_eq!(render_bar(-5.0, 4), "░░░░");
        assert_eq!(render_bar(f64::NAN, 4), "░░░░");
    }

    #[test]
    fn test_bar_width_bounds() {
        assert_eq!(bar_width_for(0), MIN_BAR_WIDTH);
        assert_eq!(bar_width_for(60), 30);
        assert_eq!(bar_width_for(500), MAX_BAR_WIDTH);
    }

    #[test]
    fn test_frame_known_total() {
        let state = state_with(Some(10.0), 4.0);
        let frame = RenderFrame::from_state(&state, state.started, 80);
        assert!(frame.known_total);
        assert!((frame.percent - 40.0).abs() < 1e-9);
        assert_eq!(frame.remaining, Some(3.0));
        assert_eq!(frame.estimated_final_bytes, Some(100 * 1024 * 10 / 4));
    }

    #[test]
    fn test_percent_never_exceeds_bounds() {
        let mut state = state_with(Some(10.0), 4.0);
        // Bypass the aggregator clamp to check the renderer's own bound.
        state.position = 25.0;
        let frame = RenderFrame::from_state(&state, state.started, 80);
        assert_eq!(frame.percent, 100.0);
        assert_eq!(frame.remaining, Some(0.0));
    }

    #[test]
    fn test_unknown_total_single_line() {
        let state = state_with(None, 4.0);
        let mut renderer =
            TerminalRenderer::new(Vec::new(), DisplayStyle::Interactive).with_width(80);
        renderer.draw(&state, state.started);
        renderer.draw(&state, state.started);
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("estimating…"));
        assert!(out.contains("40 frames"));
        assert!(out.contains("\x1b[1A"));
        assert!(!out.contains('█'));
    }

    #[test]
    fn test_known_total_block_redrawn_in_place() {
        let state = state_with(Some(10.0), 5.0);
        let mut renderer =
            TerminalRenderer::new(Vec::new(), DisplayStyle::Interactive).with_width(70);
        renderer.draw(&state, state.started);
        renderer.draw(&state, state.started);
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("50.0%"));
        assert!(out.contains("Remaining: 00:00:02"));
        assert!(out.contains("\x1b[4A"));
        assert_eq!(out.matches("\x1b[2K").count(), 8);
    }

    #[test]
    fn test_lines_truncated_to_width() {
        let state = state_with(Some(10.0), 5.0);
        let mut renderer =
            TerminalRenderer::new(Vec::new(), DisplayStyle::Interactive).with_width(20);
        renderer.draw(&state, state.started);
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        for line in out.lines() {
            let visible = console::strip_ansi_codes(line);
            assert!(console::measure_text_width(&visible) <= 19, "{visible:?}");
        }
    }

    #[test]
    fn test_plain_style_is_periodic() {
        let state = state_with(Some(10.0), 5.0);
        let start = state.started;
        let mut renderer = TerminalRenderer::new(Vec::new(), DisplayStyle::Plain)
            .with_width(80)
            .with_plain_interval(Duration::from_secs(1));
        renderer.draw(&state, start);
        renderer.draw(&state, start + Duration::from_millis(300));
        renderer.draw(&state, start + Duration::from_millis(1200));
        renderer.finish(&state, start + Duration::from_millis(1300));
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 3);
        assert!(!out.contains('\x1b'));
        assert!(out.contains("Progress: 50.0%"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_errors_disable_drawing() {
        let state = state_with(Some(10.0), 5.0);
        let mut renderer =
            TerminalRenderer::new(BrokenPipe, DisplayStyle::Interactive).with_width(80);
        renderer.draw(&state, state.started);
        assert!(!renderer.is_active());
        renderer.draw(&state, state.started);
        renderer.finish(&state, state.started);
    }
}

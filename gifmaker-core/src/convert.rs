// ============================================================================
// gifmaker-core/src/convert.rs
// ============================================================================
//
// CONVERSION ORCHESTRATOR: ffmpeg Lifecycle and Pipeline Wiring
//
// A conversion is prepared first (validate, resolve ffmpeg, probe the input,
// build the arguments) and then run. Running spawns ffmpeg with separate
// stdout and stderr pipes and wires them up:
//
//   stdout -> scanner thread --(bounded channel)--> render thread
//   stderr -> tail thread (keeps the last characters for error reports)
//
// The render thread owns the aggregator, so it is the only writer and the
// only reader of the progress state. The scanner never blocks on the
// channel: when it is full the event is dropped and the next one will carry
// fresher values anyway. The main thread waits for ffmpeg to exit, joins the
// threads and builds the summary from the final state.
//
// AI-ASSISTANT-INFO: Conversion orchestration and progress pipeline wiring

// ---- Internal crate imports ----
use crate::config::{
    ConvertConfig, DEFAULT_RENDER_TICK, EVENT_CHANNEL_CAPACITY, ProgressMode, STDERR_TAIL_CHARS,
};
use crate::error::{
    CoreError, CoreResult, command_failed_error, command_start_error, command_wait_error,
};
use crate::external::ffmpeg_builder::{
    FfmpegCommandBuilder, build_convert_args, format_command_line,
};
use crate::external::{FfmpegLocator, MediaInfo, SystemLocator, preflight, probe_media};
use crate::progress::{
    DisplayStyle, ProgressAggregator, ProgressEvent, ProgressState, StatusScanner, TerminalRenderer,
};
use crate::utils::{optimal_thread_count, tail_chars};

// ---- External crate imports ----
use serde::Serialize;

// ---- Standard library imports ----
use std::fs;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionSummary {
    pub output: PathBuf,
    pub size_bytes: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frames: u64,
    /// Requested output frame rate
    pub fps: u32,
    pub quality: u8,
    /// Wall-clock time of the ffmpeg run, seconds
    pub elapsed_secs: f64,
    /// Mean processing speed relative to real time; 0 when never reported
    pub average_rate: f64,
}

/// A validated conversion, ready to run.
#[derive(Debug, Clone)]
pub struct PreparedConversion {
    pub config: ConvertConfig,
    pub ffmpeg: PathBuf,
    pub args: Vec<String>,
    pub media: MediaInfo,
    /// Length of the converted section, when known
    pub expected_duration: Option<f64>,
    /// Output dimensions after scaling, when known
    pub expected_dimensions: Option<(u32, u32)>,
}

/// The default locator for a configuration, honouring its explicit ffmpeg path.
pub fn default_locator(config: &ConvertConfig) -> SystemLocator {
    SystemLocator::default().with_explicit(config.ffmpeg_path.clone())
}

/// Prepares and runs a conversion, displaying progress on stderr.
pub fn convert(
    config: &ConvertConfig,
    locator: &dyn FfmpegLocator,
) -> CoreResult<ConversionSummary> {
    PreparedConversion::prepare(config, locator)?.run()
}

impl PreparedConversion {
    /// Validates the configuration, resolves and checks ffmpeg, then probes the input.
    ///
    /// An ffmpeg that fails `-version` is rejected here. Nothing is spawned
    /// for the conversion itself. A failed probe is logged
    /// and only costs the progress display its total.
    pub fn prepare(config: &ConvertConfig, locator: &dyn FfmpegLocator) -> CoreResult<Self> {
        config.validate()?;
        let installation = preflight(locator)?;
        log::info!("Using {} ({})", installation.path.display(), installation.version);
        let ffmpeg = installation.path;

        let media = probe_media(&ffmpeg, &config.input).unwrap_or_else(|e| {
            log::warn!("Could not probe {}: {}", config.input.display(), e);
            MediaInfo::default()
        });
        let expected_duration =
            media.clip_duration(config.start_seconds()?, config.duration_seconds()?);
        let expected_dimensions = media.scaled_dimensions(config.width);

        let threads = config.threads.unwrap_or_else(optimal_thread_count);
        let args = build_convert_args(config, threads);

        Ok(Self {
            config: config.clone(),
            ffmpeg,
            args,
            media,
            expected_duration,
            expected_dimensions,
        })
    }

    /// The ffmpeg command line, quoted for display.
    pub fn command_line(&self) -> String {
        format_command_line(&self.ffmpeg, &self.args)
    }

    /// Runs the conversion with progress drawn on stderr.
    pub fn run(&self) -> CoreResult<ConversionSummary> {
        self.run_with_display(io::stderr())
    }

    /// Runs the conversion with progress drawn on `display`.
    pub fn run_with_display<W>(&self, display: W) -> CoreResult<ConversionSummary>
    where
        W: Write + Send + 'static,
    {
        let config = &self.config;
        if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        log::info!(
            "Converting {} -> {} at {} fps (quality {})",
            config.input.display(),
            config.output.display(),
            config.fps,
            config.quality
        );
        log::debug!("ffmpeg command: {}", self.command_line());

        let started = Instant::now();
        let mut child = FfmpegCommandBuilder::new(&self.ffmpeg)
            .args(&self.args)
            .build()
            .spawn()
            .map_err(|e| command_start_error("ffmpeg", e))?;

        let stdout = child
            .take_stdout()
            .ok_or_else(|| CoreError::OperationFailed("ffmpeg stdout was not captured".into()))?;
        let stderr = child
            .take_stderr()
            .ok_or_else(|| CoreError::OperationFailed("ffmpeg stderr was not captured".into()))?;

        let stderr_handle = thread::spawn(move || collect_stderr_tail(stderr, STDERR_TAIL_CHARS));

        let style = match config.progress {
            ProgressMode::Interactive => Some(DisplayStyle::Interactive),
            ProgressMode::Plain => Some(DisplayStyle::Plain),
            ProgressMode::Disabled => None,
        };

        let (scan_handle, render_handle) = match style {
            Some(style) => {
                let aggregator = ProgressAggregator::new(started)
                    .with_total(self.expected_duration)
                    .with_dimensions(self.expected_dimensions);
                let renderer = TerminalRenderer::new(display, style);
                let scanner = StatusScanner::with_known_duration(self.expected_duration);
                let (tx, rx) = mpsc::sync_channel(EVENT_CHANNEL_CAPACITY);

                let scan = thread::spawn(move || scan_loop(stdout, scanner, tx));
                let render = thread::spawn(move || {
                    render_loop(rx, aggregator, renderer, DEFAULT_RENDER_TICK)
                });
                (scan, Some(render))
            }
            None => {
                let drain = thread::spawn(move || {
                    let mut stdout = stdout;
                    if let Err(e) = io::copy(&mut stdout, &mut io::sink()) {
                        log::debug!("Draining ffmpeg stdout stopped: {}", e);
                    }
                });
                (drain, None)
            }
        };

        let status = match child.wait() {
            Ok(status) => status,
            Err(e) => {
                log::error!("Failed waiting for ffmpeg: {}", e);
                // Closing the pipes lets the worker threads finish.
                if let Err(kill_err) = child.kill() {
                    log::debug!("Could not kill ffmpeg: {}", kill_err);
                }
                let _ = join_workers(stderr_handle, scan_handle, render_handle);
                return Err(command_wait_error("ffmpeg", e));
            }
        };
        let elapsed = started.elapsed();

        let (stderr_tail, final_state) = join_workers(stderr_handle, scan_handle, render_handle);

        if !status.success() {
            log::error!("ffmpeg exited with {}: {}", status, stderr_tail);
            return Err(command_failed_error("ffmpeg", status, stderr_tail));
        }

        let metadata = fs::metadata(&config.output)
            .map_err(|e| CoreError::OutputMissing(config.output.clone(), e))?;

        let summary = self.summarize(final_state.as_ref(), metadata.len(), elapsed);
        log::info!(
            "Conversion finished: {} ({} bytes, {} frames) in {:.1}s",
            summary.output.display(),
            summary.size_bytes,
            summary.frames,
            summary.elapsed_secs
        );
        Ok(summary)
    }

    fn summarize(
        &self,
        state: Option<&ProgressState>,
        size_bytes: u64,
        elapsed: Duration,
    ) -> ConversionSummary {
        let fps = self.config.fps;
        let expected_frames = self
            .expected_duration
            .map(|d| (d * f64::from(fps)).round() as u64)
            .unwrap_or(0);

        let (frames, dimensions, average_rate) = match state {
            Some(s) => (
                if s.frames > 0 { s.frames } else { expected_frames },
                s.has_dimensions().then_some((s.width, s.height)),
                s.average_rate,
            ),
            None => (expected_frames, self.expected_dimensions, 0.0),
        };

        ConversionSummary {
            output: self.config.output.clone(),
            size_bytes,
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
            frames,
            fps,
            quality: self.config.quality,
            elapsed_secs: elapsed.as_secs_f64(),
            average_rate,
        }
    }
}

/// Feeds scanned events into the channel without ever blocking.
fn scan_loop<R: Read>(stdout: R, scanner: StatusScanner, tx: SyncSender<ProgressEvent>) {
    let mut dropped: u64 = 0;
    let mut connected = true;
    // Keep reading after a disconnect so ffmpeg never stalls on a full pipe.
    for event in scanner.events(BufReader::new(stdout)) {
        if !connected {
            continue;
        }
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => dropped += 1,
            Err(TrySendError::Disconnected(_)) => connected = false,
        }
    }
    if dropped > 0 {
        log::debug!("Dropped {} progress events while the display was busy", dropped);
    }
}

/// Joins the stderr, scanner and display threads, returning the stderr tail
/// and the final progress state if a display was running.
fn join_workers(
    stderr: JoinHandle<String>,
    scan: JoinHandle<()>,
    render: Option<JoinHandle<ProgressState>>,
) -> (String, Option<ProgressState>) {
    let stderr_tail = stderr.join().unwrap_or_else(|_| {
        log::warn!("Stderr reader thread panicked");
        String::new()
    });
    if scan.join().is_err() {
        log::warn!("Status scanner thread panicked");
    }
    let final_state = match render.map(JoinHandle::join) {
        Some(Ok(state)) => Some(state),
        Some(Err(_)) => {
            log::warn!("Progress display thread panicked");
            None
        }
        None => None,
    };
    (stderr_tail, final_state)
}

/// Applies events as they arrive and redraws on every tick until the
/// scanner hangs up. Returns the final state.
fn render_loop<W: Write>(
    rx: Receiver<ProgressEvent>,
    mut aggregator: ProgressAggregator,
    mut renderer: TerminalRenderer<W>,
    tick: Duration,
) -> ProgressState {
    let mut next_draw = Instant::now();
    loop {
        let timeout = next_draw.saturating_duration_since(Instant::now());
        match rx.recv_timeout(timeout) {
            Ok(event) => aggregator.apply(event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        let now = Instant::now();
        if now >= next_draw {
            renderer.draw(aggregator.state(), now);
            next_draw = now + tick;
        }
    }
    renderer.finish(aggregator.state(), Instant::now());
    aggregator.into_state()
}

/// Logs every stderr line and returns the last `limit` characters.
fn collect_stderr_tail<R: Read>(stderr: R, limit: usize) -> String {
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    let mut tail = String::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                for line in text.split(['\r', '\n']).filter(|l| !l.trim().is_empty()) {
                    log::debug!(target: "ffmpeg_log", "{}", line.trim_end());
                    tail.push_str(line.trim_end());
                    tail.push('\n');
                }
                if tail.len() > limit * 8 {
                    tail = tail_chars(&tail, limit * 2).to_string();
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                log::debug!("Reading ffmpeg stderr stopped: {}", e);
                break;
            }
        }
    }
    tail_chars(tail.trim_end(), limit).trim_start().to_string()
}

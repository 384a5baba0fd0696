// ============================================================================
// gifmaker-core/src/external/probe.rs
// ============================================================================
//
// MEDIA PROBE: Input Properties from ffmpeg's Stream Banner
//
// Runs `ffmpeg -hide_banner -i <input>` without an output. ffmpeg prints the
// container and stream description to stderr and exits with an error because
// no output was given; the description is all we need. Every field is
// optional and a probe that finds nothing is not an error.
//
// AI-ASSISTANT-INFO: Input probing and GIF size estimation

use crate::error::{CoreResult, command_start_error};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("valid duration regex")
});

static VIDEO_STREAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Stream #.*Video:.*?\b(\d{2,5})x(\d{2,5})\b").expect("valid stream regex")
});

static FPS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+(?:\.\d+)?)\s*fps\b").expect("valid fps regex"));

/// Properties of an input video, each present only if ffmpeg reported it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaInfo {
    /// Container duration in seconds
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Frames per second of the first video stream
    pub frame_rate: Option<f64>,
}

impl MediaInfo {
    /// Output dimensions after scaling to `target_width` with the aspect ratio kept.
    pub fn scaled_dimensions(&self, target_width: Option<u32>) -> Option<(u32, u32)> {
        let (w, h) = (self.width?, self.height?);
        match target_width {
            None => Some((w, h)),
            Some(tw) if w > 0 => {
                let th = (f64::from(h) * f64::from(tw) / f64::from(w)).round() as u32;
                Some((tw, th.max(1)))
            }
            Some(_) => None,
        }
    }

    /// Length of the section that will be converted, given optional trim values.
    pub fn clip_duration(&self, start: Option<f64>, length: Option<f64>) -> Option<f64> {
        let available = self.duration.map(|d| (d - start.unwrap_or(0.0)).max(0.0));
        match (available, length) {
            (Some(a), Some(l)) => Some(a.min(l)),
            (Some(a), None) => Some(a),
            (None, Some(l)) => Some(l),
            (None, None) => None,
        }
        .filter(|d| *d > 0.0)
    }
}

/// Extracts media properties from ffmpeg's stream banner.
pub fn parse_probe_output(output: &str) -> MediaInfo {
    let mut info = MediaInfo::default();

    if let Some(caps) = DURATION_RE.captures(output) {
        let h = caps[1].parse::<f64>().ok();
        let m = caps[2].parse::<f64>().ok();
        let s = caps[3].parse::<f64>().ok();
        if let (Some(h), Some(m), Some(s)) = (h, m, s) {
            info.duration = Some(h * 3600.0 + m * 60.0 + s).filter(|d| *d > 0.0);
        }
    }

    if let Some(line) = output.lines().find(|l| VIDEO_STREAM_RE.is_match(l)) {
        if let Some(caps) = VIDEO_STREAM_RE.captures(line) {
            info.width = caps[1].parse().ok().filter(|w| *w > 0);
            info.height = caps[2].parse().ok().filter(|h| *h > 0);
        }
        info.frame_rate = FPS_RE
            .captures(line)
            .and_then(|c| c[1].parse::<f64>().ok())
            .filter(|f| *f > 0.0);
    }

    info
}

/// Probes `input` with the ffmpeg at `ffmpeg`.
///
/// Only a failure to start ffmpeg is reported as an error.
pub fn probe_media(ffmpeg: &Path, input: &Path) -> CoreResult<MediaInfo> {
    log::debug!("Probing {} with {}", input.display(), ffmpeg.display());
    let output = Command::new(ffmpeg)
        .arg("-hide_banner")
        .arg("-i")
        .arg(input)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| command_start_error(format!("{} (probe)", ffmpeg.display()), e))?;

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stderr));
    log::debug!("Probe result for {}: {:?}", input.display(), info);
    Ok(info)
}

/// Rough GIF size in bytes for a clip: three quarters of a byte-per-channel
/// RGB frame per output frame. Only useful as an order of magnitude.
pub fn estimate_gif_size(width: u32, height: u32, duration: f64, fps: u32) -> u64 {
    if !duration.is_finite() || duration <= 0.0 {
        return 0;
    }
    let frames = (duration as u64).saturating_mul(u64::from(fps));
    u64::from(width)
        .saturating_mul(u64::from(height))
        .saturating_mul(frames)
        .saturating_mul(3)
        / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'clip.mp4':\n\
  Metadata:\n\
    major_brand     : isom\n\
  Duration: 00:01:30.50, start: 0.000000, bitrate: 1205 kb/s\n\
  Stream #0:0[0x1](und): Video: h264 (High) (avc1 / 0x31637661), yuv420p(progressive), 1280x720 [SAR 1:1 DAR 16:9], 1070 kb/s, 29.97 fps, 29.97 tbr, 30k tbn (default)\n\
  Stream #0:1[0x2](und): Audio: aac (LC) (mp4a / 0x6134706D), 48000 Hz, stereo, fltp, 128 kb/s (default)\n\
At least one output file must be specified\n";

    #[test]
    fn test_parse_probe_output() {
        let info = parse_probe_output(BANNER);
        assert_eq!(info.duration, Some(90.5));
        assert_eq!(info.width, Some(1280));
        assert_eq!(info.height, Some(720));
        assert_eq!(info.frame_rate, Some(29.97));
    }

    #[test]
    fn test_parse_probe_output_without_video() {
        let info = parse_probe_output("Duration: N/A, bitrate: N/A\nStream #0:0: Audio: mp3\n");
        assert_eq!(info, MediaInfo::default());
    }

    #[test]
    fn test_scaled_dimensions() {
        let info = parse_probe_output(BANNER);
        assert_eq!(info.scaled_dimensions(None), Some((1280, 720)));
        assert_eq!(info.scaled_dimensions(Some(320)), Some((320, 180)));
        assert_eq!(MediaInfo::default().scaled_dimensions(Some(320)), None);
    }

    #[test]
    fn test_clip_duration() {
        let info = MediaInfo {
            duration: Some(10.0),
            ..MediaInfo::default()
        };
        assert_eq!(info.clip_duration(None, None), Some(10.0));
        assert_eq!(info.clip_duration(Some(4.0), None), Some(6.0));
        assert_eq!(info.clip_duration(Some(4.0), Some(2.0)), Some(2.0));
        assert_eq!(info.clip_duration(Some(12.0), None), None);
        assert_eq!(MediaInfo::default().clip_duration(None, Some(3.0)), Some(3.0));
    }

    #[test]
    fn test_estimate_gif_size() {
        // 100x100, 2s at 10 fps: 20 frames * 10000 px * 3 / 4
        assert_eq!(estimate_gif_size(100, 100, 2.9, 10), 150_000);
        assert_eq!(estimate_gif_size(100, 100, 0.0, 10), 0);
        assert_eq!(estimate_gif_size(100, 100, f64::NAN, 10), 0);
    }
}

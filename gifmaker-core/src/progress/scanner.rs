//! Status line scanner.
//!
//! Turns ffmpeg's progress output (the `key=value` lines of `-progress` as
//! well as the classic `frame= ... time= ... speed=` stats lines) into
//! [`ProgressEvent`]s. Each extractor runs independently on every line, so a
//! single stats line can populate several fields at once. Lines that match
//! nothing, and values that are zero, negative or `N/A`, are skipped.

use super::{Bitrate, ProgressEvent};
use crate::utils::{SizeValue, parse_ffmpeg_time, parse_size_token};
use regex::Regex;
use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::LazyLock;

static POSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(out_time_us|out_time_ms|out_time|time)=\s*(\S+)").expect("valid position regex")
});

static DURATION_BANNER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration:\s*(\d+:\d{2}:\d{2}(?:\.\d+)?)").expect("valid duration regex")
});

static DURATION_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bduration=\s*(\d+(?:\.\d+)?)").expect("valid duration key regex")
});

static SPEED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bspeed=\s*(\d+(?:\.\d+)?)x").expect("valid speed regex")
});

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bsize=\s*(\d+[A-Za-z]*)").expect("valid size regex")
});

static TOTAL_SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btotal_size=\s*(\d+)").expect("valid total_size regex"));

static BITRATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bbitrate=\s*(\d+(?:\.\d+)?)\s*([A-Za-z]+)/s").expect("valid bitrate regex")
});

static FRAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bframe=\s*(\d+)").expect("valid frame regex"));

static DIMENSIONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{2,5})x(\d{2,5})\b").expect("valid dimensions regex")
});

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:percent|progress)=\s*(\d+(?:\.\d+)?)%?").expect("valid percent regex")
});

fn positive_f64(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

/// Stateful line scanner.
///
/// The only state is whether a total duration is already known: the
/// duration extractor fires once and the percentage extractor needs the
/// total to back-compute a position.
#[derive(Debug, Clone, Default)]
pub struct StatusScanner {
    known_total: Option<f64>,
}

impl StatusScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a total already known (e.g. from probing the input), which
    /// disables the duration extractor.
    pub fn with_known_duration(total: Option<f64>) -> Self {
        Self {
            known_total: total.filter(|t| t.is_finite() && *t > 0.0),
        }
    }

    pub fn known_total(&self) -> Option<f64> {
        self.known_total
    }

    /// Applies every extractor to one line. Returns `None` when nothing was recognized.
    pub fn scan_line(&mut self, line: &str) -> Option<ProgressEvent> {
        let mut event = ProgressEvent::default();

        // Last valid position on the line wins.
        for caps in POSITION_RE.captures_iter(line) {
            let value = match &caps[1] {
                "out_time_us" | "out_time_ms" => caps[2]
                    .parse::<i64>()
                    .ok()
                    .filter(|us| *us > 0)
                    .map(|us| us as f64 / 1_000_000.0),
                _ => parse_ffmpeg_time(&caps[2]).filter(|s| *s > 0.0),
            };
            if value.is_some() {
                event.position = value;
            }
        }

        if self.known_total.is_none() {
            let total = DURATION_BANNER_RE
                .captures(line)
                .and_then(|c| parse_ffmpeg_time(&c[1]))
                .or_else(|| {
                    DURATION_KEY_RE
                        .captures(line)
                        .and_then(|c| positive_f64(&c[1]))
                })
                .filter(|t| *t > 0.0);
            if let Some(total) = total {
                self.known_total = Some(total);
                event.total_duration = Some(total);
            }
        }

        event.rate = SPEED_RE.captures(line).and_then(|c| positive_f64(&c[1]));

        event.size = TOTAL_SIZE_RE
            .captures(line)
            .and_then(|c| c[1].parse::<u64>().ok())
            .map(SizeValue::bytes)
            .or_else(|| SIZE_RE.captures(line).and_then(|c| parse_size_token(&c[1])))
            .filter(|s| s.value > 0);

        event.bitrate = BITRATE_RE.captures(line).and_then(|c| {
            positive_f64(&c[1]).map(|value| Bitrate {
                value,
                unit: c[2].to_string(),
            })
        });

        event.frames = FRAME_RE
            .captures(line)
            .and_then(|c| c[1].parse::<u64>().ok())
            .filter(|f| *f > 0);

        if let Some(caps) = DIMENSIONS_RE.captures(line) {
            let w = caps[1].parse::<u32>().ok().filter(|w| *w > 0);
            let h = caps[2].parse::<u32>().ok().filter(|h| *h > 0);
            if let (Some(w), Some(h)) = (w, h) {
                event.width = Some(w);
                event.height = Some(h);
            }
        }

        if event.position.is_none() {
            if let Some(total) = self.known_total {
                event.position = PERCENT_RE
                    .captures(line)
                    .and_then(|c| positive_f64(&c[1]))
                    .map(|pct| total * pct.min(100.0) / 100.0);
            }
        }

        (!event.is_empty()).then_some(event)
    }

    /// Turns this scanner into a lazy iterator of events over `reader`.
    ///
    /// Lines are read without a length limit and decoded lossily. Carriage
    /// returns also separate lines, as in ffmpeg's interactive stats output.
    /// End of stream and read errors both end the sequence.
    pub fn events<R: BufRead>(self, reader: R) -> ScanEvents<R> {
        ScanEvents {
            scanner: self,
            reader,
            buf: Vec::new(),
            pending: VecDeque::new(),
            done: false,
        }
    }
}

/// Iterator of events produced by [`StatusScanner::events`].
pub struct ScanEvents<R> {
    scanner: StatusScanner,
    reader: R,
    buf: Vec<u8>,
    pending: VecDeque<ProgressEvent>,
    done: bool,
}

impl<R: BufRead> ScanEvents<R> {
    fn read_more(&mut self) {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => self.done = true,
            Ok(_) => {
                let text = String::from_utf8_lossy(&self.buf);
                for segment in text.split(['\r', '\n']).filter(|s| !s.trim().is_empty()) {
                    if let Some(event) = self.scanner.scan_line(segment) {
                        self.pending.push_back(event);
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                log::debug!("Status stream read failed, treating as end of stream: {}", e);
                self.done = true;
            }
        }
    }
}

impl<R: BufRead> Iterator for ScanEvents<R> {
    type Item = ProgressEvent;

    fn next(&mut self) -> Option<ProgressEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.done {
                return None;
            }
            self.read_more();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SizeUnit;

    #[test]
    fn test_stats_line_populates_several_fields() {
        let mut scanner = StatusScanner::new();
        let line = "frame=  120 fps= 24 q=-0.0 size=     256kB time=00:00:04.80 \
                    bitrate= 436.9kbits/s speed=1.92x";
        let event = scanner.scan_line(line).unwrap();
        assert_eq!(event.frames, Some(120));
        assert_eq!(event.size, Some(SizeValue::new(256, SizeUnit::KB)));
        assert_eq!(event.position, Some(4.8));
        assert_eq!(event.rate, Some(1.92));
        assert_eq!(
            event.bitrate,
            Some(Bitrate {
                value: 436.9,
                unit: "kbits".to_string()
            })
        );
        assert_eq!(event.total_duration, None);
    }

    #[test]
    fn test_progress_keys() {
        let mut scanner = StatusScanner::new();
        assert_eq!(scanner.scan_line("out_time_us=2500000").unwrap().position, Some(2.5));
        assert_eq!(scanner.scan_line("out_time_ms=1000000").unwrap().position, Some(1.0));
        assert_eq!(
            scanner.scan_line("out_time=00:00:03.250000").unwrap().position,
            Some(3.25)
        );
        assert_eq!(
            scanner.scan_line("total_size=4096").unwrap().size,
            Some(SizeValue::bytes(4096))
        );
        assert!(scanner.scan_line("progress=continue").is_none());
        assert!(scanner.scan_line("bitrate=N/A").is_none());
        assert!(scanner.scan_line("out_time_us=N/A").is_none());
    }

    #[test]
    fn test_last_position_in_line_wins() {
        let mut scanner = StatusScanner::new();
        let event = scanner
            .scan_line("time=00:00:01.00 out_time=00:00:02.00 out_time_us=3000000")
            .unwrap();
        assert_eq!(event.position, Some(3.0));

        let event = scanner
            .scan_line("out_time_us=3000000 time=00:00:04.00 out_time=N/A")
            .unwrap();
        assert_eq!(event.position, Some(4.0));
    }

    #[test]
    fn test_zero_and_negative_values_skipped() {
        let mut scanner = StatusScanner::new();
        assert!(scanner.scan_line("frame=0").is_none());
        assert!(scanner.scan_line("speed=0x").is_none());
        assert!(scanner.scan_line("out_time=-00:00:00.040000").is_none());
        assert!(scanner.scan_line("out_time_us=-40000").is_none());
        assert!(scanner.scan_line("speed=N/A").is_none());
    }

    #[test]
    fn test_duration_captured_once() {
        let mut scanner = StatusScanner::new();
        let event = scanner
            .scan_line("  Duration: 00:01:30.50, start: 0.000000, bitrate: 1205 kb/s")
            .unwrap();
        assert_eq!(event.total_duration, Some(90.5));
        assert_eq!(scanner.known_total(), Some(90.5));

        assert!(scanner.scan_line("  Duration: 00:00:10.00, start: 0").is_none());
        assert!(scanner.scan_line("duration=12.5").is_none());
        assert_eq!(scanner.known_total(), Some(90.5));
    }

    #[test]
    fn test_duration_key_form() {
        let mut scanner = StatusScanner::new();
        assert_eq!(scanner.scan_line("duration=12.5").unwrap().total_duration, Some(12.5));
    }

    #[test]
    fn test_seeded_duration_disables_extractor() {
        let mut scanner = StatusScanner::with_known_duration(Some(20.0));
        assert!(scanner.scan_line("Duration: 00:00:10.00").is_none());
        assert_eq!(scanner.known_total(), Some(20.0));
    }

    #[test]
    fn test_percentage_back_computes_position() {
        let mut scanner = StatusScanner::with_known_duration(Some(20.0));
        assert_eq!(scanner.scan_line("progress=25%").unwrap().position, Some(5.0));
        assert_eq!(scanner.scan_line("percent=50").unwrap().position, Some(10.0));

        // A direct position on the same line takes precedence.
        let event = scanner.scan_line("progress=90% time=00:00:01.00").unwrap();
        assert_eq!(event.position, Some(1.0));

        // Without a total the percentage cannot be used.
        let mut unknown = StatusScanner::new();
        assert!(unknown.scan_line("progress=25%").is_none());
    }

    #[test]
    fn test_dimensions() {
        let mut scanner = StatusScanner::new();
        let event = scanner.scan_line("Stream #0:0: Video: gif, pal8, 320x240, q=2-31").unwrap();
        assert_eq!((event.width, event.height), (Some(320), Some(240)));
        assert!(scanner.scan_line("speed=2.0x").unwrap().width.is_none());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let mut scanner = StatusScanner::new();
        for line in ["", "   ", "garbage", "time=", "frame=abc", "size=kB", "\u{fffd}\u{fffd}"] {
            assert!(scanner.scan_line(line).is_none(), "{line:?}");
        }
    }

    #[test]
    fn test_events_split_on_carriage_returns() {
        let input = b"frame=1 time=00:00:00.10\rframe=2 time=00:00:00.20\nspeed=1.5x\n";
        let events: Vec<_> = StatusScanner::new().events(&input[..]).collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].frames, Some(2));
        assert_eq!(events[2].rate, Some(1.5));
    }
}

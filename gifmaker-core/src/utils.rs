//! Utility functions for parsing and formatting times and sizes.
//!
//! This module holds the leaf parsers used by the status scanner and the
//! CLI: timestamps in `HH:MM:SS[.ms]` form, ffmpeg size tokens such as
//! `1024kB`, and the humanized renderings of both.

use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Unit attached to a size token reported by ffmpeg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SizeUnit {
    B,
    KB,
    MB,
    GB,
}

impl SizeUnit {
    /// Parses a unit suffix case-insensitively. `k`, `kB` and `KiB` all map to KB.
    #[must_use]
    pub fn parse(unit: &str) -> Option<Self> {
        match unit.trim().to_ascii_lowercase().as_str() {
            "b" | "byte" | "bytes" => Some(SizeUnit::B),
            "k" | "kb" | "kib" => Some(SizeUnit::KB),
            "m" | "mb" | "mib" => Some(SizeUnit::MB),
            "g" | "gb" | "gib" => Some(SizeUnit::GB),
            _ => None,
        }
    }

    /// Number of bytes in one of this unit.
    #[must_use]
    pub fn multiplier(self) -> u64 {
        match self {
            SizeUnit::B => 1,
            SizeUnit::KB => 1024,
            SizeUnit::MB => 1024 * 1024,
            SizeUnit::GB => 1024 * 1024 * 1024,
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SizeUnit::B => "B",
            SizeUnit::KB => "KB",
            SizeUnit::MB => "MB",
            SizeUnit::GB => "GB",
        };
        f.write_str(label)
    }
}

/// A size as reported on a status line: an unsigned value plus its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeValue {
    pub value: u64,
    pub unit: SizeUnit,
}

impl SizeValue {
    #[must_use]
    pub fn new(value: u64, unit: SizeUnit) -> Self {
        Self { value, unit }
    }

    #[must_use]
    pub fn bytes(value: u64) -> Self {
        Self::new(value, SizeUnit::B)
    }

    /// Converts to bytes using binary multiples, saturating on overflow.
    #[must_use]
    pub fn to_bytes(self) -> u64 {
        self.value.saturating_mul(self.unit.multiplier())
    }
}

impl fmt::Display for SizeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_size(*self))
    }
}

/// Parses a size token like `1024kB`, `512 KiB` or `2048`. A bare number is bytes.
#[must_use]
pub fn parse_size_token(token: &str) -> Option<SizeValue> {
    let token = token.trim();
    let digits_end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    if digits_end == 0 {
        return None;
    }
    let value = token[..digits_end].parse::<u64>().ok()?;
    let suffix = token[digits_end..].trim();
    let unit = if suffix.is_empty() {
        SizeUnit::B
    } else {
        SizeUnit::parse(suffix)?
    };
    Some(SizeValue::new(value, unit))
}

/// Formats a reported size in its own unit. Byte values are promoted to KB or MB.
#[must_use]
pub fn format_size(size: SizeValue) -> String {
    if size.value == 0 {
        return "0 KB".to_string();
    }
    match size.unit {
        SizeUnit::KB | SizeUnit::MB | SizeUnit::GB => {
            format!("{:.2} {}", size.value as f64, size.unit)
        }
        SizeUnit::B => {
            let bytes = size.value as f64;
            if size.value < 1024 {
                format!("{} bytes", size.value)
            } else if bytes < 1024.0 * 1024.0 {
                format!("{:.2} KB", bytes / 1024.0)
            } else {
                format!("{:.2} MB", bytes / (1024.0 * 1024.0))
            }
        }
    }
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats a short wall-clock span for summaries: "4.2s", "3m 07s", "1h 02m".
#[must_use]
pub fn format_elapsed(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "?".to_string();
    }
    if seconds < 60.0 {
        return format!("{seconds:.1}s");
    }
    let total = seconds as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes}m {secs:02}s")
    }
}

/// Parses an ffmpeg time string (HH:MM:SS.MS) to seconds.
///
/// Used on status lines, so it is lenient about field widths. Negative
/// timestamps, which ffmpeg prints before the first frame, yield `None`.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<f64> {
    let time = time.trim();
    if time.starts_with('-') {
        return None;
    }
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() == 3 {
        let hours = parts[0].parse::<f64>().ok()?;
        let minutes = parts[1].parse::<f64>().ok()?;
        let seconds = parts[2].parse::<f64>().ok()?;
        let total = hours * 3600.0 + minutes * 60.0 + seconds;
        total.is_finite().then_some(total)
    } else {
        None
    }
}

/// Strictly parses a user-supplied clip time: `HH:MM:SS` or `HH:MM:SS.ms`.
///
/// Every component must be plain digits, minutes and seconds must be below 60.
#[must_use]
pub fn parse_clip_time(time: &str) -> Option<f64> {
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    let (hours, minutes) = (parts[0], parts[1]);
    let (whole_secs, frac) = match parts[2].split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (parts[2], None),
    };
    if !all_digits(hours) || !all_digits(minutes) || !all_digits(whole_secs) {
        return None;
    }
    if frac.is_some_and(|f| !all_digits(f)) {
        return None;
    }

    let hours = hours.parse::<f64>().ok()?;
    let minutes = minutes.parse::<f64>().ok()?;
    let seconds = parts[2].parse::<f64>().ok()?;
    if minutes >= 60.0 || seconds >= 60.0 {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Validates an optional clip time, naming the offending field on failure.
pub fn validate_clip_time(field: &'static str, value: Option<&str>) -> CoreResult<Option<f64>> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => parse_clip_time(v.trim())
            .map(Some)
            .ok_or_else(|| CoreError::InvalidTime {
                field,
                value: v.to_string(),
            }),
    }
}

/// Derives the default output path: the input's file stem with a `.gif`
/// extension, relative to the current directory.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "output".to_string());
    PathBuf::from(format!("{stem}.gif"))
}

/// Thread count for an ffmpeg run given the number of logical CPUs,
/// leaving headroom for the rest of the system on larger machines.
#[must_use]
pub fn threads_for_cpus(cpus: usize) -> usize {
    match cpus {
        0..=2 => 1,
        3..=4 => 2,
        n => n - 2,
    }
}

/// Thread count for this machine.
#[must_use]
pub fn optimal_thread_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    threads_for_cpus(cpus)
}

/// Returns the last `max_chars` characters of `text`, on a char boundary.
#[must_use]
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

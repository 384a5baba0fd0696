//! Console output for the CLI: status lines, errors and the final summary.
//!
//! Colors are applied only when the target stream supports them and
//! `NO_COLOR` is unset. Labels are padded by display width so that values
//! line up even with wide characters in file names.

use gifmaker_core::{
    ConversionSummary, FfmpegInstallation, MediaInfo, format_bytes, format_duration,
    format_elapsed,
};
use owo_colors::OwoColorize;
use supports_color::Stream;
use unicode_width::UnicodeWidthStr;

const LABEL_WIDTH: usize = 14;

fn use_color(stream: Stream) -> bool {
    std::env::var_os("NO_COLOR").is_none() && supports_color::on(stream).is_some()
}

/// Pads `label:` to a common display width.
pub fn pad_label(label: &str) -> String {
    let width = label.width() + 1;
    let padding = LABEL_WIDTH.saturating_sub(width).max(1);
    format!("{}:{}", label, " ".repeat(padding))
}

/// Formats a key-value status line.
pub fn status_line(label: &str, value: &str) -> String {
    format!("  {}{}", pad_label(label), value)
}

pub fn print_status(label: &str, value: &str) {
    if use_color(Stream::Stdout) {
        println!("  {}{}", pad_label(label).cyan(), value.bold());
    } else {
        println!("{}", status_line(label, value));
    }
}

pub fn print_heading(title: &str) {
    if use_color(Stream::Stdout) {
        println!("===== {} =====", title.to_uppercase().cyan());
    } else {
        println!("===== {} =====", title.to_uppercase());
    }
}

pub fn print_success(message: &str) {
    if use_color(Stream::Stdout) {
        println!("  ✓ {}", message.green());
    } else {
        println!("  ✓ {message}");
    }
}

pub fn print_error(message: &str) {
    if use_color(Stream::Stderr) {
        eprintln!("{} {}", "✗ Error:".red().bold(), message);
    } else {
        eprintln!("✗ Error: {message}");
    }
}

pub fn print_warning(message: &str) {
    if use_color(Stream::Stderr) {
        eprintln!("{} {}", "Warning:".yellow(), message);
    } else {
        eprintln!("Warning: {message}");
    }
}

/// Lines of the boxed conversion summary, without color.
pub fn summary_lines(summary: &ConversionSummary) -> Vec<String> {
    let mut rows = vec![
        ("Output", summary.output.display().to_string()),
        ("Size", format_bytes(summary.size_bytes)),
    ];
    if let (Some(w), Some(h)) = (summary.width, summary.height) {
        rows.push(("Dimensions", format!("{w}x{h}")));
    }
    rows.push(("Frames", format!("{} @ {} fps", summary.frames, summary.fps)));
    rows.push(("Quality", summary.quality.to_string()));
    rows.push(("Time", format_elapsed(summary.elapsed_secs)));
    if summary.average_rate > 0.0 {
        rows.push(("Avg speed", format!("{:.2}x", summary.average_rate)));
    }

    let body: Vec<String> = rows
        .iter()
        .map(|(label, value)| format!("{}{}", pad_label(label), value))
        .collect();
    let inner = body
        .iter()
        .map(|line| line.width())
        .max()
        .unwrap_or(0)
        .max("Conversion complete".width());

    let mut lines = Vec::with_capacity(body.len() + 4);
    lines.push(format!("┌{}┐", "─".repeat(inner + 2)));
    lines.push(format!("│ {:<w$} │", "Conversion complete", w = inner));
    lines.push(format!("├{}┤", "─".repeat(inner + 2)));
    for line in body {
        let pad = inner - line.width();
        lines.push(format!("│ {}{} │", line, " ".repeat(pad)));
    }
    lines.push(format!("└{}┘", "─".repeat(inner + 2)));
    lines
}

pub fn print_summary(summary: &ConversionSummary) {
    let color = use_color(Stream::Stdout);
    for line in summary_lines(summary) {
        let is_border = line.starts_with(['┌', '├', '└']);
        if color && is_border {
            println!("{}", line.bright_blue());
        } else {
            println!("{line}");
        }
    }
}

/// Lines printed by `info` for a probed input.
pub fn media_lines(media: &MediaInfo, file_size: u64) -> Vec<String> {
    let mut lines = vec![status_line("Size", &format_bytes(file_size))];
    if let (Some(w), Some(h)) = (media.width, media.height) {
        lines.push(status_line("Dimensions", &format!("{w}x{h}")));
    }
    if let Some(d) = media.duration {
        lines.push(status_line("Duration", &format_duration(d)));
    }
    if let Some(fps) = media.frame_rate {
        lines.push(status_line("Frame rate", &format!("{fps:.2} fps")));
    }
    lines
}

pub fn print_installation(install: &FfmpegInstallation) {
    print_status("ffmpeg", &install.path.display().to_string());
    print_status("Version", &install.version);
}

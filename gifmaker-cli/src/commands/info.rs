//! Implementation of the 'info' subcommand: probe a video and estimate
//! how large the GIF would be at a few frame rates.

use crate::cli::InfoArgs;
use crate::config::ESTIMATE_FPS;
use crate::error::{CliErrorContext, CliResult};
use crate::output::{media_lines, print_heading, print_status, print_warning};

use gifmaker_core::{
    CoreError, FfmpegLocator, MediaInfo, SystemLocator, estimate_gif_size, format_bytes,
    probe_media,
};
use std::fs;

/// Size estimates for each frame rate in `ESTIMATE_FPS`, if the probe found
/// both dimensions and a duration.
pub fn size_estimates(media: &MediaInfo) -> Option<Vec<(u32, u64)>> {
    let (w, h, d) = (media.width?, media.height?, media.duration?);
    Some(
        ESTIMATE_FPS
            .iter()
            .map(|&fps| (fps, estimate_gif_size(w, h, d, fps)))
            .collect(),
    )
}

pub fn run_info(args: InfoArgs) -> CliResult<()> {
    if !args.input.is_file() {
        return Err(CoreError::InputNotFound(args.input));
    }
    let file_size = fs::metadata(&args.input)
        .cli_with_context(|| format!("Failed to read {}", args.input.display()))?
        .len();

    let ffmpeg = SystemLocator::default().with_explicit(args.ffmpeg.clone()).resolve()?;
    let media = probe_media(&ffmpeg, &args.input)?;

    print_heading("Video information");
    print_status("File", &args.input.display().to_string());
    for line in media_lines(&media, file_size) {
        println!("{line}");
    }

    match size_estimates(&media) {
        Some(estimates) => {
            print_heading("Estimated GIF size");
            for (fps, bytes) in estimates {
                print_status(&format!("{fps} fps"), &format!("~{}", format_bytes(bytes)));
            }
        }
        None => print_warning("could not determine dimensions and duration; no size estimate"),
    }
    Ok(())
}

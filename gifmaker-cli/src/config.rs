// gifmaker-cli/src/config.rs
//
// Defaults and names used by the command-line front end.

/// Environment variable naming an explicit ffmpeg executable.
pub const FFMPEG_ENV_VAR: &str = "GIFMAKER_FFMPEG";

/// Directory (under the system temp dir) holding the log file.
pub const LOG_DIR_NAME: &str = "gifmaker-logs";
pub const LOG_FILE_NAME: &str = "gifmaker.log";

/// Frame rates shown in the `info` size estimates.
pub const ESTIMATE_FPS: [u32; 4] = [5, 10, 15, 20];

/// Quality choices offered in interactive mode, in menu order.
pub const QUALITY_CHOICES: [(&str, u8); 3] = [
    ("Low (faster, smaller file)", gifmaker_core::config::QUALITY_LOW),
    ("Medium", gifmaker_core::config::QUALITY_MEDIUM),
    ("High (slower, larger file)", gifmaker_core::config::QUALITY_HIGH),
];

/// Menu index preselected for quality.
pub const DEFAULT_QUALITY_CHOICE: usize = 1;

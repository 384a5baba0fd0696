// ============================================================================
// gifmaker-cli/src/logging.rs
// ============================================================================
//
// LOGGING: File logging for the gifmaker CLI
//
// Everything logged through the `log` facade goes to a single append-only
// file in the system temp directory. The console belongs to the progress
// display and the output module, so the logger never writes there.
//
// KEY COMPONENTS:
// - init_logging: installs the fern dispatcher
// - log_file_path: where the log file lives
// - get_timestamp: timestamp helper used for log records
//
// AI-ASSISTANT-INFO: fern-based file logging setup

use crate::config::{LOG_DIR_NAME, LOG_FILE_NAME};
use log::LevelFilter;
use std::fs;
use std::path::PathBuf;

/// Returns the current local timestamp formatted as "YYYY-MM-DD HH:MM:SS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Location of the log file.
pub fn log_file_path() -> PathBuf {
    std::env::temp_dir().join(LOG_DIR_NAME).join(LOG_FILE_NAME)
}

/// Level for the given verbosity flag.
pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose { LevelFilter::Debug } else { LevelFilter::Info }
}

/// Installs the file logger.
///
/// Returns the log path on success. If the file cannot be opened a warning is
/// printed and the program carries on without file logging.
pub fn init_logging(verbose: bool) -> Option<PathBuf> {
    let path = log_file_path();
    let file = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fern::log_file(&path));

    let file = match file {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {}", path.display(), e);
            return None;
        }
    };

    let result = fern::Dispatch::new()
        .format(|out, message, record| {
            let text = strip_ansi_escapes::strip_str(message.to_string());
            out.finish(format_args!(
                "[{} {} {}] {}",
                get_timestamp(),
                record.level(),
                record.target(),
                text
            ))
        })
        .level(level_for(verbose))
        .chain(file)
        .apply();

    match result {
        Ok(()) => Some(path),
        Err(e) => {
            eprintln!("Warning: logger already initialised: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_in_temp_dir() {
        let path = log_file_path();
        assert!(path.starts_with(std::env::temp_dir()));
        assert!(path.ends_with("gifmaker-logs/gifmaker.log"));
    }

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(false), LevelFilter::Info);
        assert_eq!(level_for(true), LevelFilter::Debug);
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = get_timestamp();
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
    }
}

// ============================================================================
// gifmaker-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Locating and Checking the ffmpeg Executable
//
// This module encapsulates everything that touches the ffmpeg binary from the
// outside: where to find it for the running platform, whether it actually
// runs, how its arguments are built, and what it says about an input file.
//
// KEY COMPONENTS:
// - Platform: OS/architecture descriptor with the bundled binary name
// - FfmpegLocator: trait resolving a usable executable path
// - SystemLocator: explicit path, bundled binary, sidecar, then PATH
// - check_ffmpeg: runs `-version` and reports the first line
//
// AI-ASSISTANT-INFO: ffmpeg discovery, pre-flight checks and submodules

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult, command_start_error};

// ---- Standard library imports ----
use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Argument and filter-graph construction for the GIF conversion
pub mod ffmpeg_builder;

/// Input probing through ffmpeg's stream banner
pub mod probe;

pub use ffmpeg_builder::{GifFilterChain, build_convert_args};
pub use probe::{MediaInfo, estimate_gif_size, parse_probe_output, probe_media};

// ============================================================================
// PLATFORM DESCRIPTOR
// ============================================================================

/// Operating system and CPU architecture of a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        Self::new(env::consts::OS, env::consts::ARCH)
    }

    /// File name of the ffmpeg build shipped for this platform, if there is one.
    pub fn bundled_binary_name(&self) -> Option<&'static str> {
        match (self.os.as_str(), self.arch.as_str()) {
            ("windows", "x86_64") => Some("ffmpeg-win64.exe"),
            ("windows", "x86") => Some("ffmpeg-win32.exe"),
            ("macos", "x86_64") => Some("ffmpeg-macos-x86_64"),
            ("macos", "aarch64") => Some("ffmpeg-macos-arm64"),
            ("linux", "x86_64") => Some("ffmpeg-linux-x86_64"),
            ("linux", "x86") => Some("ffmpeg-linux-i386"),
            ("linux", "aarch64") => Some("ffmpeg-linux-arm64"),
            ("linux", "arm") => Some("ffmpeg-linux-armhf"),
            _ => None,
        }
    }

    /// Name of the ffmpeg executable as found on PATH.
    pub fn system_binary_name(&self) -> &'static str {
        if self.os == "windows" { "ffmpeg.exe" } else { "ffmpeg" }
    }
}

// ============================================================================
// EXECUTABLE RESOLUTION
// ============================================================================

/// Resolves the ffmpeg executable to run.
pub trait FfmpegLocator {
    /// Returns the path of an ffmpeg executable, or `CoreError::FfmpegNotFound`.
    fn resolve(&self) -> CoreResult<PathBuf>;
}

/// A locator that always returns the same path. Useful when the caller has
/// already resolved the executable.
#[derive(Debug, Clone)]
pub struct FixedLocator(pub PathBuf);

impl FfmpegLocator for FixedLocator {
    fn resolve(&self) -> CoreResult<PathBuf> {
        if self.0.is_file() {
            Ok(self.0.clone())
        } else {
            Err(CoreError::FfmpegNotFound(format!(
                "'{}' does not exist",
                self.0.display()
            )))
        }
    }
}

/// Default lookup: explicit path, bundled binary, ffmpeg-sidecar's install
/// location, then the `PATH` environment variable.
#[derive(Debug, Clone)]
pub struct SystemLocator {
    platform: Platform,
    explicit: Option<PathBuf>,
    bundle_dir: Option<PathBuf>,
    search_path: Option<OsString>,
}

impl Default for SystemLocator {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}

impl SystemLocator {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            explicit: None,
            bundle_dir: None,
            search_path: None,
        }
    }

    /// Uses an explicitly configured executable. A bare name is looked up on PATH.
    #[must_use]
    pub fn with_explicit(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    /// Directory whose `binaries/` subdirectory holds bundled builds.
    /// Defaults to the directory of the running executable.
    #[must_use]
    pub fn with_bundle_dir(mut self, dir: PathBuf) -> Self {
        self.bundle_dir = Some(dir);
        self
    }

    /// Overrides the `PATH`-style search list.
    #[must_use]
    pub fn with_search_path(mut self, path: OsString) -> Self {
        self.search_path = Some(path);
        self
    }

    fn bundled_candidate(&self) -> Option<PathBuf> {
        let name = self.platform.bundled_binary_name()?;
        let dir = match &self.bundle_dir {
            Some(dir) => dir.clone(),
            None => env::current_exe().ok()?.parent()?.to_path_buf(),
        };
        let candidate = dir.join("binaries").join(name);
        candidate.is_file().then_some(candidate)
    }

    fn sidecar_candidate(&self) -> Option<PathBuf> {
        // Only consulted for the real install layout.
        if self.bundle_dir.is_some() {
            return None;
        }
        let candidate = ffmpeg_sidecar::paths::sidecar_path().ok()?;
        candidate.is_file().then_some(candidate)
    }

    fn search(&self, name: &Path) -> Option<PathBuf> {
        let paths = match &self.search_path {
            Some(p) => p.clone(),
            None => env::var_os("PATH")?,
        };
        find_in_path(name, &paths)
    }
}

impl FfmpegLocator for SystemLocator {
    fn resolve(&self) -> CoreResult<PathBuf> {
        if let Some(explicit) = &self.explicit {
            if explicit.is_file() {
                log::debug!("Using configured ffmpeg: {}", explicit.display());
                return Ok(explicit.clone());
            }
            if explicit.components().count() == 1 {
                if let Some(found) = self.search(explicit) {
                    log::debug!("Using configured ffmpeg from PATH: {}", found.display());
                    return Ok(found);
                }
            }
            return Err(CoreError::FfmpegNotFound(format!(
                "configured path '{}' does not exist",
                explicit.display()
            )));
        }

        if let Some(bundled) = self.bundled_candidate() {
            log::debug!("Using bundled ffmpeg: {}", bundled.display());
            return Ok(bundled);
        }
        if let Some(sidecar) = self.sidecar_candidate() {
            log::debug!("Using sidecar ffmpeg: {}", sidecar.display());
            return Ok(sidecar);
        }
        let system_name = Path::new(self.platform.system_binary_name());
        if let Some(found) = self.search(system_name) {
            log::debug!("Using ffmpeg from PATH: {}", found.display());
            return Ok(found);
        }

        Err(CoreError::FfmpegNotFound(format!(
            "no bundled build for {}/{} and '{}' is not on PATH",
            self.platform.os,
            self.platform.arch,
            system_name.display()
        )))
    }
}

/// Looks for `name` in each directory of a `PATH`-style list.
pub fn find_in_path(name: &Path, paths: &OsString) -> Option<PathBuf> {
    env::split_paths(paths)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

// ============================================================================
// PRE-FLIGHT CHECK
// ============================================================================

/// A resolved and verified ffmpeg executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegInstallation {
    pub path: PathBuf,
    /// First line of `ffmpeg -version`
    pub version: String,
}

/// Runs `<ffmpeg> -version` and returns its first output line.
///
/// # Returns
///
/// * `Err(CoreError::FfmpegNotFound)` - the file does not exist
/// * `Err(CoreError::FfmpegUnusable)` - it runs but exits unsuccessfully
/// * `Err(CoreError::CommandStart)` - it exists but cannot be started
pub fn check_ffmpeg(path: &Path) -> CoreResult<String> {
    let output = Command::new(path)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                log::warn!("ffmpeg '{}' not found", path.display());
                CoreError::FfmpegNotFound(path.display().to_string())
            } else {
                log::error!("Failed to start '{}': {}", path.display(), e);
                command_start_error(path.display().to_string(), e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CoreError::FfmpegUnusable {
            path: path.to_path_buf(),
            reason: format!("'-version' exited with {}: {}", output.status, stderr.trim()),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("unknown version")
        .to_string();
    log::debug!("ffmpeg at {} reports: {}", path.display(), version);
    Ok(version)
}

/// Resolves ffmpeg through `locator` and verifies that it runs.
pub fn preflight(locator: &dyn FfmpegLocator) -> CoreResult<FfmpegInstallation> {
    let path = locator.resolve()?;
    let version = check_ffmpeg(&path)?;
    Ok(FfmpegInstallation { path, version })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_bundled_binary_names() {
        let cases = [
            ("windows", "x86_64", Some("ffmpeg-win64.exe")),
            ("macos", "aarch64", Some("ffmpeg-macos-arm64")),
            ("linux", "x86_64", Some("ffmpeg-linux-x86_64")),
            ("linux", "arm", Some("ffmpeg-linux-armhf")),
            ("freebsd", "x86_64", None),
        ];
        for (os, arch, expected) in cases {
            assert_eq!(Platform::new(os, arch).bundled_binary_name(), expected, "{os}/{arch}");
        }
        assert_eq!(Platform::new("windows", "x86_64").system_binary_name(), "ffmpeg.exe");
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("my-ffmpeg");
        fs::write(&exe, b"").unwrap();
        let locator = SystemLocator::new(Platform::new("linux", "x86_64"))
            .with_explicit(Some(exe.clone()))
            .with_bundle_dir(dir.path().to_path_buf())
            .with_search_path(OsString::new());
        assert_eq!(locator.resolve().unwrap(), exe);
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let locator = SystemLocator::new(Platform::new("linux", "x86_64"))
            .with_explicit(Some(dir.path().join("nope").join("ffmpeg")))
            .with_bundle_dir(dir.path().to_path_buf())
            .with_search_path(OsString::new());
        assert!(matches!(locator.resolve(), Err(CoreError::FfmpegNotFound(_))));
    }

    #[test]
    fn test_bundled_before_path() {
        let bundle = tempfile::tempdir().unwrap();
        let bin_dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(bundle.path().join("binaries")).unwrap();
        let bundled = bundle.path().join("binaries").join("ffmpeg-linux-x86_64");
        fs::write(&bundled, b"").unwrap();
        fs::write(bin_dir.path().join("ffmpeg"), b"").unwrap();

        let locator = SystemLocator::new(Platform::new("linux", "x86_64"))
            .with_bundle_dir(bundle.path().to_path_buf())
            .with_search_path(bin_dir.path().as_os_str().to_owned());
        assert_eq!(locator.resolve().unwrap(), bundled);
    }

    #[test]
    fn test_path_fallback_and_not_found() {
        let bundle = tempfile::tempdir().unwrap();
        let bin_dir = tempfile::tempdir().unwrap();
        let on_path = bin_dir.path().join("ffmpeg");
        fs::write(&on_path, b"").unwrap();

        let locator = SystemLocator::new(Platform::new("linux", "x86_64"))
            .with_bundle_dir(bundle.path().to_path_buf())
            .with_search_path(bin_dir.path().as_os_str().to_owned());
        assert_eq!(locator.resolve().unwrap(), on_path);

        let empty = SystemLocator::new(Platform::new("linux", "x86_64"))
            .with_bundle_dir(bundle.path().to_path_buf())
            .with_search_path(OsString::new());
        let err = empty.resolve().unwrap_err();
        assert!(err.to_string().contains("not on PATH"));
    }

    #[test]
    fn test_check_ffmpeg_missing_file() {
        let result = check_ffmpeg(Path::new("/definitely/not/here/ffmpeg"));
        assert!(matches!(result, Err(CoreError::FfmpegNotFound(_))));
    }
}

//! Platform-specific utilities and cross-platform compatibility helpers.
//!
//! This module provides the small set of OS-abstraction helpers gitcache
//! needs: locating `git` and the user's home directory, and normalizing
//! Windows' long-path quirk for paths deep under the cache root.

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Gets the home directory path for the current user.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: check that the HOME environment variable is set"
        };
        anyhow::anyhow!("could not determine home directory.\n\n{platform_help}")
    })
}

/// Returns the appropriate Git command name for the current platform.
#[must_use]
pub const fn get_git_command() -> &'static str {
    if is_windows() { "git.exe" } else { "git" }
}

/// Checks if a command is available in the system `PATH`.
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Returns the Node.js/npm platform identifier `{os}-{arch}` for the current
/// build target, e.g. `linux-x64`, `darwin-arm64`, `win32-x64`.
///
/// This mirrors the triples npm itself uses for optional dependencies, since
/// the cache layout is meant to interoperate with npm's own conventions (spec
/// §9: the platform dimension is retained for forward compatibility with
/// native-built artifacts).
#[must_use]
pub fn platform_id() -> String {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        other => other,
    };
    format!("{os}-{arch}")
}

/// Applies the `\\?\` long-path prefix on Windows for paths that might
/// exceed the legacy 260-character limit. No-op on other platforms.
#[cfg(windows)]
#[must_use]
pub fn windows_long_path(path: &Path) -> PathBuf {
    if path.as_os_str().len() < 200 {
        return path.to_path_buf();
    }
    let path_str = path.to_string_lossy();
    if path_str.len() > 260 && !path_str.starts_with(r"\\?\") {
        PathBuf::from(format!(r"\\?\{path_str}"))
    } else {
        path.to_path_buf()
    }
}

/// No-op outside Windows.
#[cfg(not(windows))]
#[must_use]
pub fn windows_long_path(path: &Path) -> PathBuf {
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_id_has_two_hyphenated_segments() {
        let id = platform_id();
        assert_eq!(id.split('-').count(), 2, "expected os-arch, got {id}");
    }

    #[test]
    fn git_command_name_matches_platform() {
        let cmd = get_git_command();
        if is_windows() {
            assert_eq!(cmd, "git.exe");
        } else {
            assert_eq!(cmd, "git");
        }
    }
}

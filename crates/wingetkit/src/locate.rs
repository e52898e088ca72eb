//! Locating the winget executable.
//!
//! Search order: every directory on `PATH`, then the per-user
//! `WindowsApps` directory where the App Installer places its alias. A
//! failed search is not an error; the bare name is returned and the launch
//! failure surfaces when the process is started.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Executable name searched for on `PATH`.
pub const EXECUTABLE_NAME: &str = "winget";

/// Resolve the winget executable for the current environment.
pub fn locate_executable() -> PathBuf {
    locate_in(
        EXECUTABLE_NAME,
        std::env::var_os("PATH"),
        default_fallback().as_deref(),
    )
}

/// Resolve `name` against `search_path`, then `fallback`.
pub fn locate_in(name: &str, search_path: Option<OsString>, fallback: Option<&Path>) -> PathBuf {
    if let Some(paths) = search_path {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        match which::which_in(name, Some(paths), cwd) {
            Ok(path) => {
                log::debug!("found {} on PATH: {}", name, path.display());
                return path;
            }
            Err(e) => log::debug!("{} not on PATH: {}", name, e),
        }
    }

    if let Some(fallback) = fallback
        && fallback.is_file()
    {
        log::debug!("using fallback location: {}", fallback.display());
        return fallback.to_path_buf();
    }

    log::debug!("{} not found, deferring to launch", name);
    PathBuf::from(name)
}

/// Well-known per-user install location (`%LOCALAPPDATA%\Microsoft\WindowsApps\winget.exe`).
pub fn default_fallback() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| {
        dir.join("Microsoft")
            .join("WindowsApps")
            .join(format!("{EXECUTABLE_NAME}.exe"))
    })
}

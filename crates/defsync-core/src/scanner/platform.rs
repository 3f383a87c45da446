//! Default scanner tool location per operating system.

use std::path::PathBuf;

use crate::error::UpdateError;

const WINDOWS_TOOL: &str = "C:/Program Files (x86)/VIPRE/SBAMCommandLineScanner.exe";

/// Known install location of the command-line scanner for `os`
/// (as in `std::env::consts::OS`).
pub fn tool_path_for(os: &str) -> Result<PathBuf, UpdateError> {
    match os {
        "windows" => Ok(PathBuf::from(WINDOWS_TOOL)),
        other => Err(UpdateError::UnsupportedPlatform {
            os: other.to_string(),
        }),
    }
}

/// Use the configured path if there is one, else the platform default.
pub fn resolve_tool_path(configured: Option<PathBuf>) -> Result<PathBuf, UpdateError> {
    match configured {
        Some(path) => Ok(path),
        None => tool_path_for(std::env::consts::OS),
    }
}

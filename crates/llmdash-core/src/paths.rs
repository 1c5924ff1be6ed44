//! Home-relative path helpers.

use std::path::{Path, PathBuf};

use crate::error::{DashError, Result};

/// Resolve the user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| DashError::internal("HOME directory could not be determined"))
}

/// Directory holding llmdash's own files.
///
/// Returns `~/.config/llmdash`
pub fn config_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join(".config").join("llmdash"))
}

/// Expand a leading `~` to the home directory.
///
/// Paths without a leading `~` are returned unchanged, as is `~` itself
/// when no home directory can be determined.
pub fn expand_home(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

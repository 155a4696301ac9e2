use crate::utils::{DuplexError, Result};
use std::fs;
use std::path::Path;

pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(DuplexError::Io)
}

/// Create `path` and its parents; succeeds if it already exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(DuplexError::Io)
}

/// Write `content`, creating the parent directory first
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, content).map_err(DuplexError::Io)
}

/// Copy bytes verbatim, creating the destination directory first
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(from, to).map_err(DuplexError::Io)?;
    Ok(())
}

/// Delete a file if there is one. Returns whether something was removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    fs::remove_file(path).map_err(DuplexError::Io)?;
    Ok(true)
}

// src/paths.rs

//! The absolute-path rule shared by glob expansion and redirection.
//!
//! A path is absolute when it starts with the platform separator, or, on
//! platforms whose separator is `\`, when it has a drive-letter-colon form
//! (`C:\...`). Everything else is resolved against a context's current
//! folder.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::errors::{Result, ShellError};

/// True if `s` contains a wildcard understood by the expander.
pub fn has_wildcard(s: &str) -> bool {
    s.contains('*') || s.contains('?')
}

/// Absolute-path check for the platform separator.
pub fn is_absolute(path: &str) -> Result<bool> {
    is_absolute_with(path, MAIN_SEPARATOR)
}

/// Absolute-path check for an explicit separator.
///
/// Blank paths are a usage error rather than "relative".
pub fn is_absolute_with(path: &str, separator: char) -> Result<bool> {
    let path = path.trim();
    if path.is_empty() {
        return Err(ShellError::usage("empty path given"));
    }
    if path.starts_with(separator) {
        return Ok(true);
    }
    if separator == '\\' {
        return Ok(has_drive_prefix(path));
    }
    Ok(false)
}

fn has_drive_prefix(path: &str) -> bool {
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic()
    )
}

/// Resolve `path` against `cwd` unless it is already absolute.
pub fn absolute_path(cwd: &Path, path: &str) -> Result<PathBuf> {
    let trimmed = path.trim();
    if is_absolute(trimmed)? {
        return Ok(PathBuf::from(trimmed));
    }
    Ok(cwd.join(trimmed))
}

/// Split a path into its root and the segments below it.
///
/// The root is the filesystem root (or drive) for absolute paths and `cwd`
/// for relative ones. Empty and `.` segments are dropped.
pub fn split_root(path: &str, cwd: &Path) -> Result<(PathBuf, Vec<String>)> {
    split_root_with(path, cwd, MAIN_SEPARATOR)
}

pub(crate) fn split_root_with(
    path: &str,
    cwd: &Path,
    separator: char,
) -> Result<(PathBuf, Vec<String>)> {
    let trimmed = path.trim();
    let absolute = is_absolute_with(trimmed, separator)?;
    let mut pieces = trimmed.split(separator);

    let root = if !absolute {
        cwd.to_path_buf()
    } else if separator == '\\' && has_drive_prefix(trimmed) {
        // "C:" -> "C:\"
        let drive = pieces.next().unwrap_or_default();
        PathBuf::from(format!("{drive}{separator}"))
    } else {
        PathBuf::from(separator.to_string())
    };

    let segments = pieces
        .filter(|p| !p.is_empty() && *p != ".")
        .map(str::to_string)
        .collect();

    Ok((root, segments))
}

// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawShellConfig, ShellConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawShellConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawShellConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawShellConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks that `pipe_capacity >= 1` and that `initial_dir`, when given,
///   is absolute.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ShellConfig> {
    let raw = load_from_path(path)?;
    ShellConfig::try_from(raw)
}

/// Same as [`load_and_validate`] for configuration held in memory.
pub fn parse_and_validate(contents: &str) -> Result<ShellConfig> {
    let raw: RawShellConfig = toml::from_str(contents)?;
    ShellConfig::try_from(raw)
}

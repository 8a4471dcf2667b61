// src/config/validate.rs

use crate::config::model::{RawShellConfig, ShellConfig};
use crate::errors::{Result, ShellError};
use crate::paths::is_absolute;

impl TryFrom<RawShellConfig> for ShellConfig {
    type Error = crate::errors::ShellError;

    fn try_from(raw: RawShellConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ShellConfig::new_unchecked(raw.shell, raw.env))
    }
}

fn validate_raw_config(cfg: &RawShellConfig) -> Result<()> {
    validate_pipe_capacity(cfg)?;
    validate_initial_dir(cfg)?;
    validate_env(cfg)?;
    Ok(())
}

fn validate_pipe_capacity(cfg: &RawShellConfig) -> Result<()> {
    if cfg.shell.pipe_capacity == 0 {
        return Err(ShellError::Config(
            "[shell].pipe_capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_initial_dir(cfg: &RawShellConfig) -> Result<()> {
    let Some(dir) = &cfg.shell.initial_dir else {
        return Ok(());
    };
    let text = dir.to_string_lossy();
    let absolute = is_absolute(&text).map_err(|_| {
        ShellError::Config("[shell].initial_dir must not be empty".to_string())
    })?;
    if !absolute {
        return Err(ShellError::Config(format!(
            "[shell].initial_dir must be an absolute path (got '{}')",
            text
        )));
    }
    Ok(())
}

fn validate_env(cfg: &RawShellConfig) -> Result<()> {
    for key in cfg.env.keys() {
        if key.is_empty() || key.contains('=') {
            return Err(ShellError::Config(format!(
                "[env] has invalid variable name '{}'",
                key
            )));
        }
    }
    Ok(())
}

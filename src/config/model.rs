// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::exec::pipe::PIPE_BUFFER_SIZE;
use crate::types::ZeroMatchPolicy;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [shell]
/// initial_dir = "/srv/work"
/// pipe_capacity = 2048
/// zero_match = "drop"
///
/// [env]
/// LANG = "C"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawShellConfig {
    /// Behaviour knobs from `[shell]`.
    #[serde(default)]
    pub shell: ShellSection,

    /// Initial environment for every new execution context.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// `[shell]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellSection {
    /// Current folder of freshly created contexts.
    ///
    /// If `None`, the process working directory is used.
    #[serde(default)]
    pub initial_dir: Option<PathBuf>,

    /// Capacity in bytes of each pipe between two units.
    #[serde(default = "default_pipe_capacity")]
    pub pipe_capacity: usize,

    /// `"drop"` (default) or `"keep"`.
    #[serde(default)]
    pub zero_match: ZeroMatchPolicy,
}

fn default_pipe_capacity() -> usize {
    PIPE_BUFFER_SIZE
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            initial_dir: None,
            pipe_capacity: default_pipe_capacity(),
            zero_match: ZeroMatchPolicy::default(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawShellConfig>` (see `validate.rs`) or
/// `Default`.
#[derive(Debug, Clone, Default)]
pub struct ShellConfig {
    shell: ShellSection,
    env: BTreeMap<String, String>,
}

impl ShellConfig {
    pub(crate) fn new_unchecked(shell: ShellSection, env: BTreeMap<String, String>) -> Self {
        Self { shell, env }
    }

    pub fn shell_section(&self) -> &ShellSection {
        &self.shell
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn pipe_capacity(&self) -> usize {
        self.shell.pipe_capacity
    }

    pub fn zero_match(&self) -> ZeroMatchPolicy {
        self.shell.zero_match
    }

    /// The configured initial folder, or the process working directory.
    pub fn initial_dir(&self) -> PathBuf {
        match &self.shell.initial_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")),
        }
    }
}

// src/errors.rs

//! Crate-wide error type, aliases and helpers.
//!
//! Unit bodies return `anyhow::Result<()>`; the core does not care what went
//! wrong inside a body. The run boundary uses [`ErrorKind::of`] to classify a
//! failure for reporting only.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state error: {0}")]
    State(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShellError {
    pub fn usage(msg: impl Into<String>) -> Self {
        ShellError::Usage(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        ShellError::State(msg.into())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ShellError>;

/// Coarse classification of a unit failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    Io,
    State,
    Config,
    /// The body panicked instead of returning an error.
    Panic,
    Other,
}

impl ErrorKind {
    /// Classify an error by the first recognised cause in its chain.
    pub fn of(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(shell) = cause.downcast_ref::<ShellError>() {
                return match shell {
                    ShellError::Usage(_) => ErrorKind::Usage,
                    ShellError::Io(_) => ErrorKind::Io,
                    ShellError::State(_) => ErrorKind::State,
                    ShellError::Config(_) | ShellError::Toml(_) => ErrorKind::Config,
                    ShellError::Other(inner) => ErrorKind::of(inner),
                };
            }
            if cause.downcast_ref::<std::io::Error>().is_some() {
                return ErrorKind::Io;
            }
        }
        ErrorKind::Other
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Usage => "usage",
            ErrorKind::Io => "io",
            ErrorKind::State => "state",
            ErrorKind::Config => "config",
            ErrorKind::Panic => "panic",
            ErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

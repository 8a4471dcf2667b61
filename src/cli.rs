// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `pipeshell`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipeshell",
    version,
    about = "Compose built-in commands into pipelines and expand globs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML). Defaults are used when omitted.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPESHELL_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Starting folder, resolved against the configured initial folder.
    #[arg(long, global = true, value_name = "DIR")]
    pub cwd: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the glob expansion of each argument, one path per line.
    Expand {
        #[arg(required = true, value_name = "ARG")]
        args: Vec<String>,
    },
    /// Compose the words into a script and run it.
    ///
    /// Quote operators so your own shell passes them through, e.g.
    /// `pipeshell run ls '|' grep rs`.
    Run {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true, value_name = "WORD")]
        words: Vec<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

// src/lib.rs

pub mod builtins;
pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod glob;
pub mod logging;
pub mod paths;
pub mod script;
pub mod types;

use anyhow::Result;
use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::config::{ShellConfig, load_and_validate};
use crate::context::ContextRegistry;

pub use crate::context::{ExecutionContext, TaskKey};
pub use crate::exec::{ExecutionUnit, UnitHandle, UnitIo, UnitReport};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and the global context registry
/// - the starting folder (`--cwd`)
/// - the selected subcommand
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = match &args.config {
        Some(path) => load_and_validate(path)?,
        None => ShellConfig::default(),
    };

    if !ContextRegistry::install_global(cfg) {
        debug!("global context registry already initialised; config ignored");
    }
    let ctx = ContextRegistry::global().current();

    if let Some(cwd) = &args.cwd {
        let folder = ctx.absolute_path(cwd)?;
        ctx.set_current_folder(folder);
    }
    debug!(folder = %ctx.current_folder().display(), "context ready");

    match args.command {
        Command::Expand { args } => {
            for path in ctx.expand(&args)? {
                println!("{path}");
            }
            Ok(())
        }
        Command::Run { words } => {
            let unit = script::compose(&words)?;
            // Wait for the whole pipeline so producers are not cut off at exit.
            let mut reports = unit.start().wait_all().await;
            debug!(?reports, "script finished");
            match reports.pop() {
                Some(last) => last.into_result(),
                None => Ok(()),
            }
        }
    }
}

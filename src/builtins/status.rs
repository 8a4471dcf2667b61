// src/builtins/status.rs

use crate::builtins::command;
use crate::errors::ShellError;
use crate::exec::ExecutionUnit;

/// Succeeds without doing anything.
pub fn true_() -> ExecutionUnit {
    command("true", None::<String>, |_io| Box::pin(async { Ok(()) }))
}

/// Always fails with a state error.
pub fn false_() -> ExecutionUnit {
    command("false", None::<String>, |_io| {
        Box::pin(async { Err(anyhow::Error::new(ShellError::state("false"))) })
    })
}

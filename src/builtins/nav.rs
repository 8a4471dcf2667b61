// src/builtins/nav.rs

//! Current-folder commands. They change the execution context, not the
//! process working directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::builtins::command;
use crate::errors::ShellError;
use crate::exec::{ExecutionUnit, UnitIo};

pub fn pwd() -> ExecutionUnit {
    command("pwd", None::<String>, |io| {
        Box::pin(async move {
            let folder = io.context().current_folder();
            io.println(&folder.display().to_string()).await?;
            Ok(())
        })
    })
}

/// Change the current folder. The target must be an existing directory.
pub fn cd(folder: impl Into<String>) -> ExecutionUnit {
    command("cd", [folder.into()], |io| {
        Box::pin(async move {
            let folder = resolve_folder(io).await?;
            io.context().set_current_folder(folder);
            Ok(())
        })
    })
}

/// Save the current folder, then change to `folder`.
pub fn pushd(folder: impl Into<String>) -> ExecutionUnit {
    command("pushd", [folder.into()], |io| {
        Box::pin(async move {
            let folder = resolve_folder(io).await?;
            io.context().push_folder(folder);
            Ok(())
        })
    })
}

/// Return to the folder saved by the last `pushd`.
pub fn popd() -> ExecutionUnit {
    command("popd", None::<String>, |io| {
        Box::pin(async move {
            io.context().pop_folder()?;
            Ok(())
        })
    })
}

/// The first expanded argument as an existing, canonical directory.
async fn resolve_folder(io: &mut UnitIo) -> anyhow::Result<PathBuf> {
    let ctx = Arc::clone(io.context());
    let args = io.expanded_args()?;
    let Some(target) = args.first() else {
        return Err(ShellError::usage("argument missing").into());
    };

    let path = ctx.absolute_path(target)?;
    let resolved = tokio::fs::canonicalize(&path)
        .await
        .with_context(|| format!("cannot change to {}", path.display()))?;
    if !tokio::fs::metadata(&resolved).await?.is_dir() {
        return Err(ShellError::usage(format!("{} is not a directory", path.display())).into());
    }

    Ok(resolved)
}

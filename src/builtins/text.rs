// src/builtins/text.rs

//! Line-oriented text commands.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::builtins::command;
use crate::exec::{ExecutionUnit, UnitIo};

/// Print the expanded arguments on one line, separated by spaces.
///
/// Expansion yields a sorted set, so `echo b a a` prints `a b`.
pub fn echo<I, S>(args: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    command("echo", args, |io| {
        Box::pin(async move {
            let words = io.expanded_args()?;
            io.println(&words.join(" ")).await?;
            Ok(())
        })
    })
}

/// Concatenate files, or copy input when no file is given.
///
/// Files are read in sorted order and each at most once, whatever order they
/// were given in.
pub fn cat<I, S>(files: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    command("cat", files, |io| {
        Box::pin(async move { filter_lines(io, |_| true).await })
    })
}

/// Print lines containing `text`.
pub fn grep<I, S>(text: impl Into<String>, files: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let text = text.into();
    command("grep", files, move |io| {
        Box::pin(async move { filter_lines(io, |line| line.contains(text.as_str())).await })
    })
}

/// Print lines not containing `text`.
pub fn grep_v<I, S>(text: impl Into<String>, files: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let text = text.into();
    command("grep_v", files, move |io| {
        Box::pin(async move { filter_lines(io, |line| !line.contains(text.as_str())).await })
    })
}

/// Copy the lines accepted by `keep` from every file argument (or from the
/// unit's input when there are none) to its output.
async fn filter_lines<F>(io: &mut UnitIo, keep: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> bool + Send,
{
    let files = io.expanded_args()?;
    if files.is_empty() {
        while let Some(line) = io.read_line().await? {
            if keep(&line) {
                io.println(&line).await?;
            }
        }
        return Ok(());
    }

    let ctx = Arc::clone(io.context());
    for file in files {
        let path = ctx.absolute_path(&file)?;
        let handle = tokio::fs::File::open(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        let mut lines = BufReader::new(handle).lines();
        while let Some(line) = lines.next_line().await? {
            if keep(&line) {
                io.println(&line).await?;
            }
        }
    }
    Ok(())
}

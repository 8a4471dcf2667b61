// src/builtins/dos.rs

//! DOS spellings of a few commands.

use crate::builtins::{files, text};
use crate::exec::ExecutionUnit;

/// Same as `ls`.
pub fn dir<I, S>(args: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    files::ls(args).named("dir")
}

pub fn echo<I, S>(args: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    text::echo(args)
}

/// Same as `grep`.
pub fn find<I, S>(text: impl Into<String>, files: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    text::grep(text, files).named("find")
}

// src/builtins/mod.rs

//! Built-in command bodies.
//!
//! Every command here is an ordinary [`ExecutionUnit`] created in the current
//! task's context, so it can be piped, redirected and combined like any
//! host-defined unit. Names follow the usual Unix commands; Rust keywords get
//! a trailing underscore (`true_`, `false_`).
//!
//! - [`nav`]: `pwd`, `cd`, `pushd`, `popd`
//! - [`text`]: `echo`, `cat`, `grep`, `grep_v`
//! - [`files`]: `ls`, `cp`, `cp_r`, `mv`, `rm`, `rm_r`, `mkdir`, `mkdir_p`,
//!   `rmdir`, `ln`, `ln_s`
//! - [`status`]: `true_`, `false_`
//! - [`dos`]: `dir`, `echo`, `find`

pub mod dos;
pub mod files;
pub mod nav;
pub mod status;
pub mod text;

pub use files::{cp, cp_r, ln, ln_s, ls, mkdir, mkdir_p, mv, rm, rm_r, rmdir};
pub use nav::{cd, popd, pushd, pwd};
pub use status::{false_, true_};
pub use text::{cat, echo, grep, grep_v};

use crate::errors::{Result, ShellError};
use crate::exec::{BodyFuture, ExecutionUnit, UnitIo};

/// Every name [`lookup`] understands.
pub const COMMANDS: &[&str] = &[
    "pwd", "cd", "pushd", "popd", "echo", "ls", "dir", "cat", "grep", "grep_v", "find", "cp",
    "cp_r", "mv", "rm", "rm_r", "mkdir", "mkdir_p", "rmdir", "ln", "ln_s", "true", "false",
];

/// Build the unit for command `name` with `args`.
///
/// Commands that need a leading operand (`cd`, `pushd`, `grep`, `grep_v`,
/// `find`) take it from `args[0]`.
pub fn lookup(name: &str, args: Vec<String>) -> Result<ExecutionUnit> {
    let unit = match name {
        "pwd" => nav::pwd(),
        "cd" => nav::cd(first(name, &args)?),
        "pushd" => nav::pushd(first(name, &args)?),
        "popd" => nav::popd(),
        "echo" => text::echo(args),
        "ls" => files::ls(args),
        "dir" => dos::dir(args),
        "cat" => text::cat(args),
        "grep" | "grep_v" | "find" => {
            let pattern = first(name, &args)?;
            let rest = args.into_iter().skip(1);
            match name {
                "grep" => text::grep(pattern, rest),
                "grep_v" => text::grep_v(pattern, rest),
                _ => dos::find(pattern, rest),
            }
        }
        "cp" => files::cp(args),
        "cp_r" => files::cp_r(args),
        "mv" => files::mv(args),
        "rm" => files::rm(args),
        "rm_r" => files::rm_r(args),
        "mkdir" => files::mkdir(args),
        "mkdir_p" => files::mkdir_p(args),
        "rmdir" => files::rmdir(args),
        "ln" => files::ln(args),
        "ln_s" => files::ln_s(args),
        "true" => status::true_(),
        "false" => status::false_(),
        other => return Err(ShellError::usage(format!("unknown command: {other}"))),
    };
    Ok(unit)
}

fn first(name: &str, args: &[String]) -> Result<String> {
    args.first()
        .cloned()
        .ok_or_else(|| ShellError::usage(format!("{name}: missing argument")))
}

/// A named unit in the current context.
pub(crate) fn command<I, S, F>(name: &'static str, args: I, f: F) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: for<'a> FnOnce(&'a mut UnitIo) -> BodyFuture<'a> + Send + 'static,
{
    ExecutionUnit::new(f).named(name).with_args(args)
}

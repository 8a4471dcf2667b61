// src/script.rs

//! Build a unit from a flat list of words.
//!
//! ```text
//! ls src | grep .rs > list.txt && cat list.txt || echo failed
//! ```
//!
//! Words are read strictly left to right: `|`, `&&` and `||` combine the unit
//! built so far with the next command, so the line above is
//! `((ls | grep) && cat) || echo`. `>`, `>>`, `<` and `2>` take the following
//! word as a path and apply to the command they follow. There is no quoting;
//! each word is taken as is.

use tracing::debug;

use crate::builtins;
use crate::errors::{Result, ShellError};
use crate::exec::ExecutionUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Join {
    Pipe,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Redirect {
    Out,
    Append,
    In,
    Err,
}

#[derive(Debug, Default)]
struct Command {
    words: Vec<String>,
    redirects: Vec<(Redirect, String)>,
}

/// Compose `words` into a single unit in the current task's context.
pub fn compose<S: AsRef<str>>(words: &[S]) -> Result<ExecutionUnit> {
    let (first, rest) = parse(words)?;
    let mut unit = build(first)?;
    for (join, command) in rest {
        let next = build(command)?;
        unit = match join {
            Join::Pipe => unit.pipe(next),
            Join::And => unit.and(next),
            Join::Or => unit.or(next),
        };
    }
    debug!(unit = %unit.id(), "composed script");
    Ok(unit)
}

/// Split a line on whitespace and compose it.
pub fn compose_line(line: &str) -> Result<ExecutionUnit> {
    let words: Vec<&str> = line.split_whitespace().collect();
    compose(&words)
}

fn parse<S: AsRef<str>>(words: &[S]) -> Result<(Command, Vec<(Join, Command)>)> {
    let mut head: Option<Command> = None;
    let mut rest: Vec<(Join, Command)> = Vec::new();
    let mut pending: Option<Join> = None;
    let mut current = Command::default();

    let mut iter = words.iter().map(as_word);
    while let Some(word) = iter.next() {
        let join = match word {
            "|" => Some(Join::Pipe),
            "&&" => Some(Join::And),
            "||" => Some(Join::Or),
            _ => None,
        };
        if let Some(join) = join {
            let done = finish(std::mem::take(&mut current), word)?;
            match pending.replace(join) {
                None => head = Some(done),
                Some(prev) => rest.push((prev, done)),
            }
            continue;
        }

        let redirect = match word {
            ">" => Some(Redirect::Out),
            ">>" => Some(Redirect::Append),
            "<" => Some(Redirect::In),
            "2>" => Some(Redirect::Err),
            _ => None,
        };
        if let Some(redirect) = redirect {
            let Some(path) = iter.next() else {
                return Err(ShellError::usage(format!("{word}: missing path")));
            };
            current.redirects.push((redirect, path.to_string()));
            continue;
        }

        current.words.push(word.to_string());
    }

    let last = match pending {
        Some(join) => finish(current, join_symbol(join))?,
        None => finish(current, "end of script")?,
    };
    match (head, pending) {
        (None, None) => Ok((last, rest)),
        (Some(head), Some(join)) => {
            rest.push((join, last));
            Ok((head, rest))
        }
        // head is set exactly when a join has been seen
        _ => Err(ShellError::usage("malformed script")),
    }
}

fn as_word<S: AsRef<str>>(s: &S) -> &str {
    s.as_ref()
}

fn finish(command: Command, near: &str) -> Result<Command> {
    if command.words.is_empty() {
        return Err(ShellError::usage(format!("missing command near '{near}'")));
    }
    Ok(command)
}

fn join_symbol(join: Join) -> &'static str {
    match join {
        Join::Pipe => "|",
        Join::And => "&&",
        Join::Or => "||",
    }
}

fn build(command: Command) -> Result<ExecutionUnit> {
    let mut words = command.words.into_iter();
    let Some(name) = words.next() else {
        return Err(ShellError::usage("missing command"));
    };
    let mut unit = builtins::lookup(&name, words.collect())?;
    for (redirect, path) in command.redirects {
        unit = match redirect {
            Redirect::Out => unit.redirect(&path)?,
            Redirect::Append => unit.append(&path)?,
            Redirect::In => unit.redirect_from(&path)?,
            Redirect::Err => unit.redirect_err(&path)?,
        };
    }
    Ok(unit)
}

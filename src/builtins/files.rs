// src/builtins/files.rs

//! Filesystem commands: listing, copying, moving, removing and linking.
//!
//! Arguments are glob-expanded and resolved against the context's current
//! folder. For `cp`, `cp_r` and `mv` only the sources are expanded; the last
//! argument is the destination, taken literally.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::builtins::command;
use crate::context::ExecutionContext;
use crate::errors::ShellError;
use crate::exec::{ExecutionUnit, UnitIo};

/// List directories (sorted, hidden entries skipped) or print file names.
/// Defaults to the current folder.
pub fn ls<I, S>(args: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    command("ls", args, |io| {
        Box::pin(async move {
            let ctx = Arc::clone(io.context());
            let mut targets = io.expanded_args()?;
            if targets.is_empty() {
                targets.push(".".to_string());
            }

            for target in targets {
                let path = ctx.absolute_path(&target)?;
                let meta = tokio::fs::metadata(&path)
                    .await
                    .with_context(|| format!("cannot access {}", path.display()))?;
                if meta.is_dir() {
                    for name in list_dir(&path).await? {
                        io.println(&name).await?;
                    }
                } else {
                    io.println(&file_name(&path)).await?;
                }
            }
            Ok(())
        })
    })
}

/// Copy regular files.
pub fn cp<I, S>(sources_and_dest: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    command("cp", sources_and_dest, |io| {
        Box::pin(async move {
            for (src, dest) in plan_transfer(io, "cp").await? {
                if tokio::fs::metadata(&src).await?.is_dir() {
                    return Err(
                        ShellError::usage(format!("{} is a directory", src.display())).into(),
                    );
                }
                tokio::fs::copy(&src, &dest)
                    .await
                    .with_context(|| format!("copying {} to {}", src.display(), dest.display()))?;
            }
            Ok(())
        })
    })
}

/// Copy files and directory trees.
pub fn cp_r<I, S>(sources_and_dest: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    command("cp_r", sources_and_dest, |io| {
        Box::pin(async move {
            for (src, dest) in plan_transfer(io, "cp_r").await? {
                copy_tree(&src, &dest).await?;
            }
            Ok(())
        })
    })
}

/// Move or rename files and directories.
pub fn mv<I, S>(sources_and_dest: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    command("mv", sources_and_dest, |io| {
        Box::pin(async move {
            for (src, dest) in plan_transfer(io, "mv").await? {
                tokio::fs::rename(&src, &dest)
                    .await
                    .with_context(|| format!("moving {} to {}", src.display(), dest.display()))?;
            }
            Ok(())
        })
    })
}

/// Remove files. Missing files are ignored; directories are rejected.
pub fn rm<I, S>(files: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    command("rm", files, |io| {
        Box::pin(async move {
            for path in resolve_all(io)? {
                let Some(meta) = metadata_if_exists(&path).await? else {
                    continue;
                };
                if meta.is_dir() {
                    return Err(
                        ShellError::usage(format!("{} is a directory", path.display())).into(),
                    );
                }
                tokio::fs::remove_file(&path).await?;
            }
            Ok(())
        })
    })
}

/// Remove files and directory trees. Missing paths are ignored.
pub fn rm_r<I, S>(paths: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    command("rm_r", paths, |io| {
        Box::pin(async move {
            for path in resolve_all(io)? {
                let meta = match tokio::fs::symlink_metadata(&path).await {
                    Ok(meta) => meta,
                    Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                    Err(err) => return Err(err.into()),
                };
                if meta.is_dir() {
                    tokio::fs::remove_dir_all(&path).await?;
                } else {
                    tokio::fs::remove_file(&path).await?;
                }
            }
            Ok(())
        })
    })
}

pub fn mkdir<I, S>(folders: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    command("mkdir", folders, |io| {
        Box::pin(async move {
            for path in resolve_all(io)? {
                tokio::fs::create_dir(&path)
                    .await
                    .with_context(|| format!("cannot create {}", path.display()))?;
            }
            Ok(())
        })
    })
}

/// Create folders along with missing parents.
pub fn mkdir_p<I, S>(folders: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    command("mkdir_p", folders, |io| {
        Box::pin(async move {
            for path in resolve_all(io)? {
                tokio::fs::create_dir_all(&path)
                    .await
                    .with_context(|| format!("cannot create {}", path.display()))?;
            }
            Ok(())
        })
    })
}

/// Remove empty folders. Missing paths are ignored.
pub fn rmdir<I, S>(folders: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    command("rmdir", folders, |io| {
        Box::pin(async move {
            for path in resolve_all(io)? {
                let Some(meta) = metadata_if_exists(&path).await? else {
                    continue;
                };
                if !meta.is_dir() {
                    return Err(
                        ShellError::usage(format!("{} is not a directory", path.display())).into(),
                    );
                }
                let mut entries = tokio::fs::read_dir(&path).await?;
                if entries.next_entry().await?.is_some() {
                    return Err(
                        ShellError::usage(format!("{} is not empty", path.display())).into(),
                    );
                }
                tokio::fs::remove_dir(&path).await?;
            }
            Ok(())
        })
    })
}

/// Hard link: `ln TARGET [LINK]`.
pub fn ln<I, S>(target_and_link: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    command("ln", target_and_link, |io| {
        Box::pin(async move {
            let (target, link) = plan_link(io).await?;
            tokio::fs::hard_link(&target, &link).await?;
            Ok(())
        })
    })
}

/// Symbolic link: `ln_s TARGET [LINK]`.
pub fn ln_s<I, S>(target_and_link: I) -> ExecutionUnit
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    command("ln_s", target_and_link, |io| {
        Box::pin(async move {
            let (target, link) = plan_link(io).await?;
            symlink(&target, &link).await?;
            Ok(())
        })
    })
}

#[cfg(unix)]
async fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    tokio::fs::symlink(target, link).await
}

#[cfg(windows)]
async fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    if tokio::fs::metadata(target).await?.is_dir() {
        tokio::fs::symlink_dir(target, link).await
    } else {
        tokio::fs::symlink_file(target, link).await
    }
}

fn resolve_all(io: &mut UnitIo) -> anyhow::Result<Vec<PathBuf>> {
    let ctx = Arc::clone(io.context());
    let mut paths = Vec::new();
    for arg in io.expanded_args()? {
        paths.push(ctx.absolute_path(&arg)?);
    }
    Ok(paths)
}

async fn metadata_if_exists(path: &Path) -> io::Result<Option<std::fs::Metadata>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

async fn is_dir(path: &Path) -> io::Result<bool> {
    Ok(metadata_if_exists(path).await?.is_some_and(|m| m.is_dir()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Visible entry names of a directory, sorted.
async fn list_dir(path: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(path).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Work out `(source, destination)` pairs for `cp`, `cp_r` and `mv`.
///
/// With one source and a missing destination whose parent is a directory,
/// the destination is the new name. Otherwise the destination must be an
/// existing directory, and each source lands inside it under its own name,
/// which must not exist yet.
async fn plan_transfer(io: &mut UnitIo, verb: &str) -> anyhow::Result<Vec<(PathBuf, PathBuf)>> {
    let ctx = Arc::clone(io.context());
    let Some((dest_arg, source_args)) = io.args().split_last() else {
        return Err(missing_operands(verb).into());
    };
    if source_args.is_empty() {
        return Err(missing_operands(verb).into());
    }

    let sources = ctx.expand(source_args)?;
    if sources.is_empty() {
        return Err(ShellError::usage(format!("{verb}: no source matched")).into());
    }
    let dest = ctx.absolute_path(dest_arg)?;

    let dest_exists = metadata_if_exists(&dest).await?.is_some();
    let parent_is_dir = match dest.parent() {
        Some(parent) => is_dir(parent).await?,
        None => false,
    };
    if sources.len() == 1 && !dest_exists && parent_is_dir {
        return Ok(vec![(ctx.absolute_path(&sources[0])?, dest)]);
    }

    if !is_dir(&dest).await? {
        return Err(ShellError::usage(format!(
            "{} does not exist or is not a folder",
            dest.display()
        ))
        .into());
    }

    let mut plan = Vec::with_capacity(sources.len());
    for source in &sources {
        let src = ctx.absolute_path(source)?;
        let target = dest.join(file_name(&src));
        if metadata_if_exists(&target).await?.is_some() {
            return Err(
                ShellError::usage(format!("{} already exists", target.display())).into(),
            );
        }
        plan.push((src, target));
    }
    Ok(plan)
}

fn missing_operands(verb: &str) -> ShellError {
    ShellError::usage(format!(
        "{verb} requires at least one source and the destination"
    ))
}

/// Work out `(target, link)` for `ln` / `ln_s`.
///
/// Operands are positional, so they come from the raw arguments. Only the
/// target is glob-expanded and it must resolve to a single path; the link is
/// taken literally.
async fn plan_link(io: &mut UnitIo) -> anyhow::Result<(PathBuf, PathBuf)> {
    let ctx: Arc<ExecutionContext> = Arc::clone(io.context());
    let (target_arg, link_arg) = match io.args() {
        [target] => (target, None),
        [target, link] => (target, Some(link)),
        _ => return Err(ShellError::usage("1 or 2 arguments expected").into()),
    };

    let targets = ctx.expand(std::slice::from_ref(target_arg))?;
    let [target] = targets.as_slice() else {
        return Err(ShellError::usage(format!(
            "target must name exactly one file: {target_arg}"
        ))
        .into());
    };
    let target = ctx.absolute_path(target)?;
    let mut link = match link_arg {
        Some(link) => ctx.absolute_path(link)?,
        None => ctx.current_folder(),
    };

    if metadata_if_exists(&target).await?.is_none() {
        return Err(ShellError::usage(format!(
            "target file does not exist: {}",
            target.display()
        ))
        .into());
    }
    if let Some(meta) = metadata_if_exists(&link).await? {
        if !meta.is_dir() {
            return Err(
                ShellError::usage(format!("link file already exists: {}", link.display())).into(),
            );
        }
        link = link.join(file_name(&target));
    }
    Ok((target, link))
}

/// Copy `src` to `dest`, recursing into directories.
async fn copy_tree(src: &Path, dest: &Path) -> anyhow::Result<()> {
    let mut stack = vec![(src.to_path_buf(), dest.to_path_buf())];
    while let Some((from, to)) = stack.pop() {
        if tokio::fs::metadata(&from).await?.is_dir() {
            tokio::fs::create_dir_all(&to)
                .await
                .with_context(|| format!("cannot create {}", to.display()))?;
            let mut entries = tokio::fs::read_dir(&from).await?;
            while let Some(entry) = entries.next_entry().await? {
                stack.push((entry.path(), to.join(entry.file_name())));
            }
        } else {
            tokio::fs::copy(&from, &to)
                .await
                .with_context(|| format!("copying {} to {}", from.display(), to.display()))?;
        }
    }
    Ok(())
}

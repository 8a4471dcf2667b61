// src/glob/expand.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, trace};

use crate::errors::{Result, ShellError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::glob::SegmentPattern;
use crate::paths::{has_wildcard, split_root};
use crate::types::ZeroMatchPolicy;

/// Expands wildcard arguments against a filesystem.
#[derive(Debug, Clone)]
pub struct Expander {
    fs: Arc<dyn FileSystem>,
    policy: ZeroMatchPolicy,
}

enum Segment {
    Literal(String),
    Wildcard(SegmentPattern),
}

impl Default for Expander {
    fn default() -> Self {
        Self::new(Arc::new(RealFileSystem), ZeroMatchPolicy::default())
    }
}

impl Expander {
    pub fn new(fs: Arc<dyn FileSystem>, policy: ZeroMatchPolicy) -> Self {
        Self { fs, policy }
    }

    pub fn policy(&self) -> ZeroMatchPolicy {
        self.policy
    }

    pub fn filesystem(&self) -> Arc<dyn FileSystem> {
        Arc::clone(&self.fs)
    }

    /// Expand every argument and return the union, deduplicated and sorted.
    ///
    /// Order carries no meaning; sorting only keeps output stable.
    pub fn expand<S: AsRef<str>>(&self, args: &[S], cwd: &Path) -> Result<Vec<String>> {
        let mut out = BTreeSet::new();

        for arg in args {
            let arg = arg.as_ref();
            if !has_wildcard(arg) {
                // e.g. a fixed filename, an empty string, or an option
                out.insert(arg.to_string());
                continue;
            }

            let matches = self.expand_pattern(arg, cwd)?;
            if matches.is_empty() {
                debug!(pattern = %arg, policy = ?self.policy, "wildcard matched nothing");
                if self.policy == ZeroMatchPolicy::Keep {
                    out.insert(arg.to_string());
                }
            } else {
                out.extend(matches);
            }
        }

        Ok(out.into_iter().collect())
    }

    /// All existing paths matched by one wildcard argument.
    pub fn expand_pattern(&self, pattern: &str, cwd: &Path) -> Result<BTreeSet<String>> {
        let (root, pieces) = split_root(pattern, cwd)?;
        let segments = pieces
            .iter()
            .map(|p| compile_segment(p))
            .collect::<Result<Vec<_>>>()?;

        trace!(%pattern, root = ?root, depth = segments.len(), "expanding pattern");

        let mut matches = BTreeSet::new();
        let mut stack: Vec<(PathBuf, usize)> = vec![(root, 0)];

        while let Some((path, depth)) = stack.pop() {
            if !self.fs.exists(&path) {
                continue;
            }
            if depth == segments.len() || !self.fs.is_dir(&path) {
                matches.insert(path.to_string_lossy().into_owned());
                continue;
            }

            match &segments[depth] {
                Segment::Literal(name) => {
                    // Joined directly so hidden entries are reachable too.
                    let child = path.join(name);
                    if self.fs.exists(&child) {
                        stack.push((child, depth + 1));
                    }
                }
                Segment::Wildcard(pat) => {
                    let children = match self.fs.read_dir(&path) {
                        Ok(children) => children,
                        Err(err) => {
                            debug!(dir = ?path, error = %err, "skipping unreadable directory");
                            continue;
                        }
                    };
                    for child in children {
                        let matched = child
                            .file_name()
                            .and_then(|n| n.to_str())
                            .is_some_and(|n| pat.is_match(n));
                        if matched {
                            stack.push((child, depth + 1));
                        }
                    }
                }
            }
        }

        Ok(matches)
    }
}

fn compile_segment(piece: &str) -> Result<Segment> {
    if !SegmentPattern::is_wildcard(piece) {
        return Ok(Segment::Literal(piece.to_string()));
    }
    let pat = SegmentPattern::new(piece)
        .with_context(|| format!("invalid wildcard segment: {piece}"))
        .map_err(ShellError::from)?;
    Ok(Segment::Wildcard(pat))
}

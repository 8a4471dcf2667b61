#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use pipeshell::context::ExecutionContext;

pub use pipeshell_test_utils::{
    Capture, CollectingDiagnostics, Recorder, TreeBuilder, in_context, init_tracing,
    sample_tree, with_timeout,
};

/// A shared context rooted at `dir`.
pub fn context_at(dir: &Path) -> Arc<ExecutionContext> {
    ExecutionContext::new(dir).into_shared()
}

/// Sorted file names (last path component) of `paths`.
pub fn names(paths: &[String]) -> Vec<String> {
    let mut out: Vec<String> = paths
        .iter()
        .map(|p| {
            Path::new(p)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect();
    out.sort();
    out
}

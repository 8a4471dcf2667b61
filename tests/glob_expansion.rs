// tests/glob_expansion.rs
mod common;
use crate::common::{context_at, init_tracing, names, sample_tree};

use std::error::Error;
use std::sync::Arc;

use pipeshell::context::ExecutionContext;
use pipeshell::fs::mock::MockFileSystem;
use pipeshell::types::ZeroMatchPolicy;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn star_matches_every_file_with_prefix() -> TestResult {
    init_tracing();
    let tree = sample_tree();
    let ctx = context_at(tree.path());

    assert_eq!(ctx.expand(&["dir1/file*"])?.len(), 3);
    assert_eq!(ctx.expand(&["./dir1/file*"])?.len(), 3);
    Ok(())
}

#[test]
fn question_mark_matches_exactly_one_character() -> TestResult {
    init_tracing();
    let tree = sample_tree();
    let ctx = context_at(tree.path());

    let found = ctx.expand(&["dir1/file?.txt"])?;
    assert_eq!(names(&found), vec!["file1.txt", "file2.txt"]);

    assert!(ctx.expand(&["dir1/file??.txt"])?.is_empty());
    Ok(())
}

#[test]
fn absolute_patterns_ignore_the_current_folder() -> TestResult {
    init_tracing();
    let tree = sample_tree();
    let ctx = ExecutionContext::new("/").into_shared();

    let root = tree.path().to_string_lossy().into_owned();
    let found = ctx.expand(&[format!("{root}/dir1/file?.txt")])?;
    assert_eq!(found.len(), 2);
    for path in &found {
        assert!(path.starts_with(root.as_str()));
    }
    Ok(())
}

#[test]
fn wildcards_in_several_segments() -> TestResult {
    init_tracing();
    let tree = sample_tree();
    let ctx = context_at(tree.path());

    let found = ctx.expand(&["*/file*.txt"])?;
    assert_eq!(names(&found), vec!["file1.txt", "file2.txt", "file4.txt"]);
    Ok(())
}

#[test]
fn wildcards_match_hidden_entries() -> TestResult {
    init_tracing();
    let tree = sample_tree();
    let ctx = context_at(tree.path());

    let found = ctx.expand(&["dir2/*"])?;
    assert_eq!(names(&found), vec![".hidden", "file4.txt"]);
    Ok(())
}

#[test]
fn plain_arguments_pass_through_without_existence_check() -> TestResult {
    init_tracing();
    let tree = sample_tree();
    let ctx = context_at(tree.path());

    let found = ctx.expand(&["no/such/file", "-v"])?;
    assert_eq!(found, vec!["-v".to_string(), "no/such/file".to_string()]);
    Ok(())
}

#[test]
fn unmatched_pattern_at_root_is_dropped_by_default() -> TestResult {
    init_tracing();
    let ctx = ExecutionContext::new("/").into_shared();

    assert_eq!(ctx.zero_match(), ZeroMatchPolicy::Drop);
    assert!(ctx.expand(&["/pipeshell-no-such-file?.txt"])?.is_empty());
    Ok(())
}

#[test]
fn unmatched_pattern_is_kept_under_keep_policy() -> TestResult {
    init_tracing();
    let tree = sample_tree();
    let ctx = ExecutionContext::new(tree.path())
        .with_zero_match(ZeroMatchPolicy::Keep)
        .into_shared();

    let found = ctx.expand(&["dir1/*.doc", "dir1/file3.*"])?;
    assert_eq!(found.len(), 2);
    assert!(found.contains(&"dir1/*.doc".to_string()));
    assert!(names(&found).contains(&"file3.pdf".to_string()));
    Ok(())
}

#[test]
fn overlapping_patterns_are_deduplicated() -> TestResult {
    init_tracing();
    let tree = sample_tree();
    let ctx = context_at(tree.path());

    let found = ctx.expand(&["dir1/*.txt", "dir1/file1*"])?;
    assert_eq!(names(&found), vec!["file1.txt", "file2.txt"]);
    Ok(())
}

#[test]
fn expansion_is_idempotent() -> TestResult {
    init_tracing();
    let tree = sample_tree();
    let ctx = context_at(tree.path());

    let once = ctx.expand(&["*/file*", "dir2/.h*"])?;
    let twice = ctx.expand(&once)?;
    assert_eq!(once, twice);
    Ok(())
}

#[test]
fn blank_path_is_a_usage_error() {
    init_tracing();
    let ctx = ExecutionContext::new("/").into_shared();
    let err = ctx.absolute_path("   ").unwrap_err();
    assert!(err.to_string().contains("usage error"));
}

fn mock_context() -> Arc<ExecutionContext> {
    let fs = MockFileSystem::new();
    fs.add_file("/work/src/main.rs");
    fs.add_file("/work/src/lib.rs");
    fs.add_file("/work/src/util/mod.rs");
    fs.add_file("/work/README.md");
    fs.add_dir("/work/target");
    ExecutionContext::new("/work")
        .with_filesystem(Arc::new(fs))
        .into_shared()
}

#[test]
fn mock_filesystem_relative_expansion() -> TestResult {
    init_tracing();
    let ctx = mock_context();

    let found = ctx.expand(&["src/*.rs"])?;
    assert_eq!(found, vec!["/work/src/lib.rs", "/work/src/main.rs"]);
    Ok(())
}

#[test]
fn a_file_ends_the_walk_even_with_segments_left() -> TestResult {
    init_tracing();
    let ctx = mock_context();

    // README.md is not a directory, so it matches before `util/mod.rs` is
    // looked at; `target` has no `util` child and is abandoned.
    let found = ctx.expand(&["*/util/mod.rs"])?;
    assert_eq!(found, vec!["/work/README.md", "/work/src/util/mod.rs"]);
    Ok(())
}

#[test]
fn mock_filesystem_follows_current_folder_changes() -> TestResult {
    init_tracing();
    let ctx = mock_context();

    ctx.set_current_folder("/work/src");
    let found = ctx.expand(&["*"])?;
    assert_eq!(
        found,
        vec!["/work/src/lib.rs", "/work/src/main.rs", "/work/src/util"]
    );
    Ok(())
}

#[test]
fn mock_filesystem_missing_directory_yields_nothing() -> TestResult {
    init_tracing();
    let ctx = mock_context();

    assert!(ctx.expand(&["docs/*.md"])?.is_empty());
    Ok(())
}

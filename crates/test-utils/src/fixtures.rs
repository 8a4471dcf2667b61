use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Builds a throwaway directory tree for filesystem tests.
///
/// ```ignore
/// let tree = TreeBuilder::new()
///     .file("dir1/file1.txt", "one\n")
///     .dir("empty")
///     .build();
/// ```
pub struct TreeBuilder {
    files: Vec<(PathBuf, String)>,
    dirs: Vec<PathBuf>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            dirs: Vec::new(),
        }
    }

    pub fn file(mut self, path: &str, contents: &str) -> Self {
        self.files.push((PathBuf::from(path), contents.to_string()));
        self
    }

    pub fn dir(mut self, path: &str) -> Self {
        self.dirs.push(PathBuf::from(path));
        self
    }

    pub fn build(self) -> TempDir {
        let root = tempfile::tempdir().expect("creating temp dir");
        for dir in &self.dirs {
            fs::create_dir_all(root.path().join(dir)).expect("creating fixture dir");
        }
        for (path, contents) in &self.files {
            let full = root.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).expect("creating fixture parent");
            }
            fs::write(&full, contents).expect("writing fixture file");
        }
        root
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The tree most glob tests use:
///
/// ```text
/// dir1/file1.txt  dir1/file2.txt  dir1/file3.pdf
/// dir2/file4.txt  dir2/.hidden
/// ```
pub fn sample_tree() -> TempDir {
    TreeBuilder::new()
        .file("dir1/file1.txt", "alpha\nbeta\n")
        .file("dir1/file2.txt", "gamma\n")
        .file("dir1/file3.pdf", "%PDF\n")
        .file("dir2/file4.txt", "delta\n")
        .file("dir2/.hidden", "secret\n")
        .build()
}

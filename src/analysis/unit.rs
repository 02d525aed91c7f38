//! Analysis units.
//!
//! A unit is the set of files analyzed together: declarations in one unit
//! never answer usages in another. For Go this is normally one package, i.e.
//! the `.go` files of one directory.

use std::path::{Path, PathBuf};

/// A group of source files analyzed as one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisUnit {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl AnalysisUnit {
    /// Create a unit rooted at `root`.
    ///
    /// Files are sorted lexically and deduplicated, which fixes the
    /// traversal order used to pick authoritative declarations.
    pub fn new<P: AsRef<Path>>(root: P, mut files: Vec<PathBuf>) -> Self {
        files.sort();
        files.dedup();
        Self {
            root: root.as_ref().to_path_buf(),
            files,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Display label for logs and reports.
    pub fn label(&self) -> String {
        self.root.display().to_string()
    }
}

//! Fact structures extracted from AST analysis.

use std::fmt;
use std::path::{Path, PathBuf};

/// A source position (1-indexed line and column).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Absolute path of the source file.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, in bytes).
    pub column: usize,
}

impl Position {
    /// Create a position for a tree-sitter node in `file`.
    pub fn from_node(file: &Path, node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        Self {
            file: file.to_path_buf(),
            line: start.row + 1, // tree-sitter is 0-indexed
            column: start.column + 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// How an occurrence of a tracked symbol is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccurrenceKind {
    Declaration,
    Usage,
}

impl OccurrenceKind {
    /// Convert to a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OccurrenceKind::Declaration => "declaration",
            OccurrenceKind::Usage => "usage",
        }
    }
}

impl fmt::Display for OccurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single syntactic appearance of a tracked symbol name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// The configured symbol name that matched.
    pub symbol: String,
    /// Declaration or usage.
    pub kind: OccurrenceKind,
    /// Where the identifier starts.
    pub position: Position,
}

impl Occurrence {
    pub fn is_declaration(&self) -> bool {
        self.kind == OccurrenceKind::Declaration
    }

    pub fn is_usage(&self) -> bool {
        self.kind == OccurrenceKind::Usage
    }
}

//! Core traits for language analysis.

use std::path::{Path, PathBuf};

use super::BindingTable;

/// Holds a parsed tree-sitter tree and associated metadata.
///
/// The binding pass and the scanner both walk the same tree, so it is
/// parsed once and shared.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// Source bytes, kept for node text extraction.
    pub source: Vec<u8>,
    /// The file path, as given to the analyzer.
    pub path: PathBuf,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// Visit every node in pre-order, depth-first, left to right.
    ///
    /// This is the traversal order that decides which of several
    /// declarations of the same name is authoritative.
    pub fn for_each_node<'a>(&'a self, mut visit: impl FnMut(tree_sitter::Node<'a>)) {
        let mut cursor = self.tree.walk();
        loop {
            visit(cursor.node());
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return;
                }
            }
        }
    }
}

/// Language-specific analyzer trait.
///
/// # Thread Safety
///
/// tree_sitter::Parser is not Sync, so implementations create a parser per
/// call and share only the `Language`.
pub trait LanguageAnalyzer: Send + Sync {
    /// Returns the language identifier (e.g., "go").
    fn language_id(&self) -> &'static str;

    /// Returns file extensions this analyzer handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parse a source file into a tree-sitter tree.
    ///
    /// Partial parse errors still produce a tree with ERROR nodes.
    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile>;

    /// Build the declaration-site table for a parsed file.
    fn resolve_bindings(&self, parsed: &ParsedFile) -> BindingTable;

    /// Whether a node kind is a name that can refer to a tracked symbol.
    fn is_name_node(&self, kind: &str) -> bool;

    /// The package/module the file belongs to, if the language declares one.
    fn package_name(&self, parsed: &ParsedFile) -> Option<String>;

    /// Check if this analyzer handles the given file extension.
    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}

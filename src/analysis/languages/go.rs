//! Go language analyzer using tree-sitter.
//!
//! Declaration sites recognized by the binding pass:
//! - First name of `var`/`const` specs (`var A, B = f()` declares only `A`)
//! - First identifier on the left of `:=`
//! - First field name of a struct field declaration
//! - Function, method and type names

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use crate::analysis::{BindingTable, DeclarationSite, LanguageAnalyzer, ParsedFile};

/// Tree-sitter query for package declaration.
const PACKAGE_QUERY: &str = r#"
(package_clause
  (package_identifier) @package_name
)
"#;

/// Node kinds that can name a tracked symbol.
const NAME_KINDS: &[&str] = &["identifier", "field_identifier", "type_identifier"];

/// Go language analyzer.
pub struct GoAnalyzer {
    language: Language,
}

impl GoAnalyzer {
    /// Create a new Go analyzer.
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Create a new parser for this thread.
    fn create_parser(&self) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    /// The declaring identifier of `node`, if `node` is a declaration.
    fn declaration_site<'a>(node: Node<'a>) -> Option<(Node<'a>, DeclarationSite)> {
        match node.kind() {
            "var_spec" | "const_spec" => first_named(node, "name").map(|n| (n, DeclarationSite::Value)),
            "field_declaration" => first_named(node, "name").map(|n| (n, DeclarationSite::Field)),
            "short_var_declaration" => {
                let left = node.child_by_field_name("left")?;
                let first = left.named_child(0)?;
                (first.kind() == "identifier").then_some((first, DeclarationSite::ShortVar))
            }
            "function_declaration" => node
                .child_by_field_name("name")
                .map(|n| (n, DeclarationSite::Function)),
            "method_declaration" => node
                .child_by_field_name("name")
                .map(|n| (n, DeclarationSite::Method)),
            "type_spec" | "type_alias" => node
                .child_by_field_name("name")
                .map(|n| (n, DeclarationSite::Type)),
            _ => None,
        }
    }
}

impl Default for GoAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// First child stored under a repeated field (e.g. the `name`s of a spec).
fn first_named<'a>(node: Node<'a>, field: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let first = node.children_by_field_name(field, &mut cursor).next();
    first
}

impl LanguageAnalyzer for GoAnalyzer {
    fn language_id(&self) -> &'static str {
        "go"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile> {
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse Go file: {}", path.display()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
            path: path.to_path_buf(),
        })
    }

    fn resolve_bindings(&self, parsed: &ParsedFile) -> BindingTable {
        let mut sites = Vec::new();
        parsed.for_each_node(|node| {
            if let Some((name, site)) = Self::declaration_site(node) {
                sites.push((name.start_byte(), site));
            }
        });
        sites.into_iter().collect()
    }

    fn is_name_node(&self, kind: &str) -> bool {
        NAME_KINDS.contains(&kind)
    }

    fn package_name(&self, parsed: &ParsedFile) -> Option<String> {
        let query = Query::new(&self.language, PACKAGE_QUERY).ok()?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        if let Some(m) = matches.next() {
            for capture in m.captures {
                let name = query.capture_names()[capture.index as usize];
                if name == "package_name" {
                    return Some(parsed.node_text(capture.node).to_string());
                }
            }
        }
        None
    }
}

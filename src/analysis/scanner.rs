//! Occurrence scanner.
//!
//! Walks parsed files and reports every identifier whose name is one of the
//! configured symbols, classified as a declaration or a usage according to
//! the file's binding table.
//!
//! Order is reproducible: files in lexical path order, nodes in pre-order.
//! Scopes and packages are not distinguished; a name match is enough.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{
    get_analyzer, AnalysisUnit, BindingTable, LanguageAnalyzer, Occurrence, OccurrenceKind,
    ParsedFile, Position,
};

/// Scans syntax trees for configured symbol names.
pub struct Scanner {
    symbols: HashSet<String>,
}

/// Result of scanning one source file.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Source text, kept for suppression comments.
    pub source: String,
    /// Package declared by the file, if any.
    pub package: Option<String>,
    pub occurrences: Vec<Occurrence>,
}

/// Result of scanning every file of an analysis unit.
#[derive(Debug, Clone, Default)]
pub struct UnitScan {
    pub files: Vec<ScannedFile>,
    /// Files that could not be read or parsed.
    pub failed: usize,
}

impl UnitScan {
    /// All occurrences in traversal order.
    pub fn occurrences(&self) -> impl Iterator<Item = &Occurrence> {
        self.files.iter().flat_map(|f| f.occurrences.iter())
    }

    /// Package name of the first file that declares one.
    pub fn package(&self) -> Option<&str> {
        self.files.iter().find_map(|f| f.package.as_deref())
    }
}

impl Scanner {
    /// Create a scanner for the given symbol names.
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `name` is a tracked symbol.
    pub fn tracks(&self, name: &str) -> bool {
        self.symbols.contains(name)
    }

    /// Scan a parsed file, resolving its bindings first.
    pub fn scan(&self, analyzer: &dyn LanguageAnalyzer, parsed: &ParsedFile) -> Vec<Occurrence> {
        let bindings = analyzer.resolve_bindings(parsed);
        self.scan_with_bindings(analyzer, parsed, &bindings)
    }

    /// Scan a parsed file against an already resolved binding table.
    pub fn scan_with_bindings(
        &self,
        analyzer: &dyn LanguageAnalyzer,
        parsed: &ParsedFile,
        bindings: &BindingTable,
    ) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();

        parsed.for_each_node(|node| {
            if !analyzer.is_name_node(node.kind()) {
                return;
            }
            let name = parsed.node_text(node);
            if !self.tracks(name) {
                return;
            }

            let kind = if bindings.is_declaration(node.start_byte()) {
                OccurrenceKind::Declaration
            } else {
                OccurrenceKind::Usage
            };

            occurrences.push(Occurrence {
                symbol: name.to_string(),
                kind,
                position: Position::from_node(&parsed.path, node),
            });
        });

        occurrences
    }

    /// Read, parse and scan a single file.
    ///
    /// Returns `Ok(None)` for files no analyzer handles.
    pub fn scan_file(&self, path: &Path) -> anyhow::Result<Option<ScannedFile>> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let analyzer = match get_analyzer(ext) {
            Some(a) => a,
            None => return Ok(None),
        };

        let bytes = fs::read(path)?;
        let source = String::from_utf8_lossy(&bytes).to_string();

        // Files that never mention a tracked name need no parse.
        if !self.symbols.iter().any(|s| source.contains(s.as_str())) {
            return Ok(Some(ScannedFile {
                path: path.to_path_buf(),
                source,
                package: None,
                occurrences: Vec::new(),
            }));
        }

        let parsed = analyzer.parse(path, &bytes)?;
        let occurrences = self.scan(analyzer, &parsed);
        let package = analyzer.package_name(&parsed);

        Ok(Some(ScannedFile {
            path: path.to_path_buf(),
            source,
            package,
            occurrences,
        }))
    }

    /// Scan every file of a unit in lexical path order.
    ///
    /// Unreadable files are logged and skipped.
    pub fn scan_unit(&self, unit: &AnalysisUnit) -> UnitScan {
        let mut scan = UnitScan::default();

        for path in unit.files() {
            match self.scan_file(path) {
                Ok(Some(file)) => scan.files.push(file),
                Ok(None) => log::debug!("no analyzer for {}", path.display()),
                Err(e) => {
                    log::warn!("failed to scan {}: {}", path.display(), e);
                    scan.failed += 1;
                }
            }
        }

        scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::GoAnalyzer;
    use std::fs;
    use tempfile::TempDir;

    fn scan_source(symbols: &[&str], source: &str) -> Vec<Occurrence> {
        let analyzer = GoAnalyzer::new();
        let parsed = analyzer
            .parse(Path::new("/repo/flags.go"), source.as_bytes())
            .unwrap();
        Scanner::new(symbols.iter().copied()).scan(&analyzer, &parsed)
    }

    #[test]
    fn test_absent_symbol_has_no_occurrences() {
        let occurrences = scan_source(
            &["Missing"],
            r#"
package flags

var Present = true

func check() bool { return Present }
"#,
        );
        assert!(occurrences.is_empty());
    }

    #[test]
    fn test_var_list_second_name_is_usage() {
        let occurrences = scan_source(
            &["A", "B"],
            r#"
package flags

var A, B = f()
"#,
        );

        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].symbol, "A");
        assert_eq!(occurrences[0].kind, OccurrenceKind::Declaration);
        assert_eq!(occurrences[1].symbol, "B");
        assert_eq!(occurrences[1].kind, OccurrenceKind::Usage);
    }

    #[test]
    fn test_declaration_and_usages_in_source_order() {
        let occurrences = scan_source(
            &["NewCheckout"],
            r#"
package shop

var NewCheckout = true

func render() string {
    if NewCheckout {
        return "new"
    }
    return legacy(NewCheckout)
}
"#,
        );

        let kinds: Vec<_> = occurrences.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OccurrenceKind::Declaration,
                OccurrenceKind::Usage,
                OccurrenceKind::Usage
            ]
        );

        assert_eq!(occurrences[0].position.line, 4);
        assert_eq!(occurrences[0].position.column, 5);
        assert_eq!(occurrences[1].position.line, 7);
        assert_eq!(occurrences[2].position.line, 10);
    }

    #[test]
    fn test_selector_usage() {
        let occurrences = scan_source(
            &["BetaSearch"],
            r#"
package main

func main() {
    if flags.BetaSearch {
        run()
    }
}
"#,
        );

        assert_eq!(occurrences.len(), 1);
        assert!(occurrences[0].is_usage());
    }

    #[test]
    fn test_struct_field_declaration() {
        let occurrences = scan_source(
            &["DarkMode"],
            r#"
package settings

type Flags struct {
    DarkMode bool
}

func apply(f Flags) bool { return f.DarkMode }
"#,
        );

        assert_eq!(occurrences.len(), 2);
        assert!(occurrences[0].is_declaration());
        assert!(occurrences[1].is_usage());
    }

    #[test]
    fn test_strings_and_comments_are_not_occurrences() {
        let occurrences = scan_source(
            &["Rollout"],
            r#"
package main

// Rollout is mentioned here
func main() {
    println("Rollout")
}
"#,
        );
        assert!(occurrences.is_empty());
    }

    #[test]
    fn test_scan_unit_orders_files_lexically() {
        let temp = TempDir::new().unwrap();
        let b = temp.path().join("b.go");
        let a = temp.path().join("a.go");
        fs::write(&b, "package p\n\nvar Flag = true\n").unwrap();
        fs::write(&a, "package p\n\nfunc use() bool { return Flag }\n").unwrap();

        let unit = AnalysisUnit::new(temp.path(), vec![b.clone(), a.clone()]);
        let scan = Scanner::new(["Flag"]).scan_unit(&unit);

        let occurrences: Vec<_> = scan.occurrences().collect();
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].position.file, a);
        assert!(occurrences[0].is_usage());
        assert_eq!(occurrences[1].position.file, b);
        assert!(occurrences[1].is_declaration());
        assert_eq!(scan.package(), Some("p"));
    }

    #[test]
    fn test_scan_unit_skips_unreadable_files() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("present.go");
        fs::write(&present, "package p\n\nvar Flag = 1\n").unwrap();
        let missing = temp.path().join("missing.go");

        let unit = AnalysisUnit::new(temp.path(), vec![present, missing]);
        let scan = Scanner::new(["Flag"]).scan_unit(&unit);

        assert_eq!(scan.failed, 1);
        assert_eq!(scan.occurrences().count(), 1);
    }
}

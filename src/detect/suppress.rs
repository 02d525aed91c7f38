//! Inline suppression of diagnostics via comments.
//!
//! Supports suppression comments like:
//! - `// flagexorcist:ignore <symbol> - <reason>`
//! - `// flagexorcist:ignore-next-line <symbol> - <reason>`
//! - `// flagexorcist:ignore-file <symbol> - <reason>`
//!
//! `*` in place of a symbol matches every symbol.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{Diagnostic, SuppressedDiagnostic};

/// How a suppression applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuppressionType {
    /// Applies to the same line
    Line,
    /// Applies to the next line
    NextLine,
    /// Applies to the entire file
    File,
}

/// An inline suppression directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Symbol to suppress, or "*" for all
    pub symbol: String,
    pub reason: String,
    pub file: PathBuf,
    /// Line number (0 for file-level)
    pub line: usize,
    pub suppression_type: SuppressionType,
}

/// File-level directives are honored only within this many leading lines
/// once code has started.
const FILE_DIRECTIVE_WINDOW: usize = 10;

lazy_static::lazy_static! {
    static ref SUPPRESSION_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"//\s*flagexorcist:(ignore(?:-file|-next-line)?)\s+(\S+)\s*(?:-\s*(.*))?")
            .expect("valid line-comment pattern"),
        Regex::new(r"/\*\s*flagexorcist:(ignore(?:-file|-next-line)?)\s+(\S+?)\s*(?:-\s*(.*?))?\s*\*/")
            .expect("valid block-comment pattern"),
    ];
}

/// Parse suppression directives from a Go source file.
pub fn parse_suppressions(file: &Path, content: &str) -> Vec<Suppression> {
    let mut suppressions = Vec::new();
    let mut in_header = true;

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();

        if in_header && !is_comment_or_empty(trimmed) {
            in_header = false;
        }

        for pattern in SUPPRESSION_PATTERNS.iter() {
            let caps = match pattern.captures(line) {
                Some(caps) => caps,
                None => continue,
            };
            let directive = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let symbol = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let reason = caps
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();

            let suppression_type = match directive {
                "ignore-file" => {
                    if !in_header && line_number > FILE_DIRECTIVE_WINDOW {
                        continue;
                    }
                    SuppressionType::File
                }
                "ignore-next-line" => SuppressionType::NextLine,
                "ignore" => {
                    // Alone on its line it covers the next one; trailing code it covers its own.
                    let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
                    if line[..start].trim().is_empty() {
                        SuppressionType::NextLine
                    } else {
                        SuppressionType::Line
                    }
                }
                _ => continue,
            };

            suppressions.push(Suppression {
                symbol: symbol.to_string(),
                reason,
                file: file.to_path_buf(),
                line: if suppression_type == SuppressionType::File {
                    0
                } else {
                    line_number
                },
                suppression_type,
            });
            break;
        }
    }

    suppressions
}

fn is_comment_or_empty(line: &str) -> bool {
    line.is_empty() || line.starts_with("//") || line.starts_with("/*")
}

/// Check if a diagnostic matches a suppression.
pub fn matches_suppression(diagnostic: &Diagnostic, suppression: &Suppression) -> bool {
    if diagnostic.position.file != suppression.file {
        return false;
    }
    if suppression.symbol != "*" && suppression.symbol != diagnostic.symbol {
        return false;
    }

    match suppression.suppression_type {
        SuppressionType::File => true,
        SuppressionType::Line => diagnostic.line() == suppression.line,
        SuppressionType::NextLine => diagnostic.line() == suppression.line + 1,
    }
}

/// Separate diagnostics into active and suppressed.
pub fn filter_suppressed(
    diagnostics: Vec<Diagnostic>,
    suppressions: &[Suppression],
) -> (Vec<Diagnostic>, Vec<SuppressedDiagnostic>) {
    let mut active = Vec::new();
    let mut suppressed = Vec::new();

    for diagnostic in diagnostics {
        match suppressions
            .iter()
            .find(|s| matches_suppression(&diagnostic, s))
        {
            Some(suppression) => suppressed.push(SuppressedDiagnostic {
                diagnostic,
                suppression: suppression.clone(),
            }),
            None => active.push(diagnostic),
        }
    }

    (active, suppressed)
}

//! Core types for audit results.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::analysis::Position;

use super::Suppression;

/// Rule identifier carried by every diagnostic.
pub const RULE_ID: &str = "stale_flag";

/// Build the diagnostic message for a stale symbol.
pub fn format_message(symbol: &str, introduced_at: DateTime<Utc>, cutoff_days: i64) -> String {
    format!(
        "Flag '{}', added on {}, is more than {} days old",
        symbol,
        introduced_at.format("%Y-%m-%d"),
        cutoff_days
    )
}

/// A usage of a stale symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Position of the usage being reported.
    pub position: Position,
    pub symbol: String,
    /// When the symbol was introduced into its declaring file.
    pub introduced_at: DateTime<Utc>,
    pub cutoff_days: i64,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        position: Position,
        symbol: impl Into<String>,
        introduced_at: DateTime<Utc>,
        cutoff_days: i64,
    ) -> Self {
        let symbol = symbol.into();
        let message = format_message(&symbol, introduced_at, cutoff_days);
        Self {
            position,
            symbol,
            introduced_at,
            cutoff_days,
            message,
        }
    }

    pub fn line(&self) -> usize {
        self.position.line
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

/// A diagnostic silenced by an inline comment.
#[derive(Debug, Clone)]
pub struct SuppressedDiagnostic {
    pub diagnostic: Diagnostic,
    pub suppression: Suppression,
}

/// Outcome of analyzing one unit.
#[derive(Debug, Clone, Default)]
pub struct UnitReport {
    pub label: String,
    /// Go package name, when any file declared one.
    pub package: Option<String>,
    pub files_scanned: usize,
    pub files_failed: usize,
    /// Diagnostics forwarded to the sink.
    pub reported: usize,
    pub suppressed: Vec<SuppressedDiagnostic>,
    /// Symbols with usages whose introduction could not be determined.
    pub unresolved: Vec<String>,
}

/// Results of a complete audit run.
#[derive(Debug, Clone, Default)]
pub struct AuditResult {
    pub diagnostics: Vec<Diagnostic>,
    pub suppressed: Vec<SuppressedDiagnostic>,
    pub cutoff_days: i64,
    /// Number of units analyzed.
    pub units: usize,
    pub files_scanned: usize,
    pub files_failed: usize,
    /// Number of (unit, symbol) pairs left unresolved.
    pub unresolved: usize,
}

impl AuditResult {
    pub fn new(cutoff_days: i64) -> Self {
        Self {
            cutoff_days,
            ..Self::default()
        }
    }

    /// Fold a unit's counters into the totals.
    pub fn add_unit(&mut self, report: UnitReport) {
        self.units += 1;
        self.files_scanned += report.files_scanned;
        self.files_failed += report.files_failed;
        self.unresolved += report.unresolved.len();
        self.suppressed.extend(report.suppressed);
    }

    /// Sort diagnostics and suppressed entries by position, then symbol.
    pub fn sort(&mut self) {
        self.diagnostics
            .sort_by(|a, b| (&a.position, &a.symbol).cmp(&(&b.position, &b.symbol)));
        self.suppressed.sort_by(|a, b| {
            (&a.diagnostic.position, &a.diagnostic.symbol)
                .cmp(&(&b.diagnostic.position, &b.diagnostic.symbol))
        });
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn suppressed_count(&self) -> usize {
        self.suppressed.len()
    }

    /// Distinct stale symbols, sorted.
    pub fn stale_symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.diagnostics.iter().map(|d| d.symbol.as_str()).collect();
        symbols.sort_unstable();
        symbols.dedup();
        symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn pos(file: &str, line: usize) -> Position {
        Position {
            file: PathBuf::from(file),
            line,
            column: 1,
        }
    }

    #[test]
    fn test_message_format() {
        let t = Utc.with_ymd_and_hms(2023, 1, 1, 9, 30, 0).unwrap();
        assert_eq!(
            format_message("NewCheckout", t, 30),
            "Flag 'NewCheckout', added on 2023-01-01, is more than 30 days old"
        );
    }

    #[test]
    fn test_sort_by_position() {
        let t = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let mut result = AuditResult::new(30);
        result.diagnostics.push(Diagnostic::new(pos("/r/b.go", 1), "X", t, 30));
        result.diagnostics.push(Diagnostic::new(pos("/r/a.go", 9), "Y", t, 30));
        result.diagnostics.push(Diagnostic::new(pos("/r/a.go", 2), "X", t, 30));
        result.sort();

        let order: Vec<_> = result
            .diagnostics
            .iter()
            .map(|d| d.position.to_string())
            .collect();
        assert_eq!(order, vec!["/r/a.go:2:1", "/r/a.go:9:1", "/r/b.go:1:1"]);
        assert_eq!(result.stale_symbols(), vec!["X", "Y"]);
    }

    #[test]
    fn test_add_unit_accumulates() {
        let mut result = AuditResult::new(30);
        result.add_unit(UnitReport {
            files_scanned: 3,
            unresolved: vec!["Gone".to_string()],
            ..UnitReport::default()
        });
        result.add_unit(UnitReport {
            files_scanned: 2,
            files_failed: 1,
            ..UnitReport::default()
        });

        assert_eq!(result.units, 2);
        assert_eq!(result.files_scanned, 5);
        assert_eq!(result.files_failed, 1);
        assert_eq!(result.unresolved, 1);
        assert!(!result.has_diagnostics());
    }
}

//! Audit runner that orchestrates scanning, history and policy.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use crate::analysis::{AnalysisUnit, Occurrence, Scanner, UnitScan};
use crate::config::AuditSettings;
use crate::history::{
    HistoryResolver, HistorySource, Introduction, IntroductionCache, IntroductionKey,
};

use super::{
    filter_suppressed, parse_suppressions, Diagnostic, DiagnosticSink, StalenessPolicy,
    SuppressedDiagnostic, UnitReport,
};

/// Runs the audit over analysis units.
///
/// One runner serves a whole run: "now" is fixed at construction and the
/// introduction cache is shared by every unit, so a symbol declared in a
/// given file costs at most one history walk. Declarations are looked up
/// across all units of the run.
pub struct Runner {
    scanner: Scanner,
    policy: StalenessPolicy,
    resolver: HistoryResolver,
    cache: IntroductionCache,
}

impl Runner {
    pub fn new(settings: &AuditSettings, history: Arc<dyn HistorySource>) -> Self {
        Self::with_now(settings, history, Utc::now())
    }

    /// Create a runner that measures ages from `now`.
    pub fn with_now(
        settings: &AuditSettings,
        history: Arc<dyn HistorySource>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            scanner: Scanner::new(settings.symbols.iter().cloned()),
            policy: StalenessPolicy::new(settings.cutoff, now),
            resolver: HistoryResolver::new(history, settings.limits),
            cache: IntroductionCache::new(),
        }
    }

    pub fn policy(&self) -> &StalenessPolicy {
        &self.policy
    }

    pub fn cache(&self) -> &IntroductionCache {
        &self.cache
    }

    /// Analyze one unit on its own, forwarding its unsuppressed
    /// diagnostics to `sink`.
    ///
    /// Only declarations inside `unit` count; use `analyze_units` when
    /// flags are declared in one package and read from others.
    pub fn analyze_unit(&self, unit: &AnalysisUnit, sink: &dyn DiagnosticSink) -> UnitReport {
        let scan = self.scanner.scan_unit(unit);
        let declarations = index_declarations(scan.occurrences());
        self.evaluate(unit, &scan, &declarations, sink)
    }

    /// Analyze the units of one run in parallel. Reports come back in input
    /// order.
    ///
    /// Every unit is scanned first so that a usage in one unit resolves to a
    /// declaration in any other.
    pub fn analyze_units(
        &self,
        units: &[AnalysisUnit],
        sink: &dyn DiagnosticSink,
    ) -> Vec<UnitReport> {
        let scans: Vec<UnitScan> = units
            .par_iter()
            .map(|unit| self.scanner.scan_unit(unit))
            .collect();
        let declarations = index_declarations(scans.iter().flat_map(|scan| scan.occurrences()));
        log::debug!(
            "{} symbol(s) declared across {} unit(s)",
            declarations.len(),
            units.len()
        );

        units
            .par_iter()
            .zip(scans.par_iter())
            .map(|(unit, scan)| self.evaluate(unit, scan, &declarations, sink))
            .collect()
    }

    fn evaluate(
        &self,
        unit: &AnalysisUnit,
        scan: &UnitScan,
        declarations: &BTreeMap<String, Occurrence>,
        sink: &dyn DiagnosticSink,
    ) -> UnitReport {
        let mut report = UnitReport {
            label: unit.label(),
            package: scan.package().map(str::to_string),
            files_scanned: scan.files.len(),
            files_failed: scan.failed,
            ..UnitReport::default()
        };

        let usages = collect_usages(scan.occurrences());

        // Only symbols that are both declared and used need history.
        let mut introductions = BTreeMap::new();
        for symbol in usages.keys() {
            let declaration = match declarations.get(symbol) {
                Some(d) => d,
                None => {
                    log::debug!("'{}' used in {} but never declared", symbol, report.label);
                    continue;
                }
            };

            let introduction = self.introduction_of(declaration);
            if !introduction.is_found() {
                report.unresolved.push(symbol.clone());
            }
            introductions.insert(symbol.clone(), introduction);
        }

        let diagnostics = self.policy.evaluate(&introductions, &usages);
        let (active, suppressed) = apply_suppressions(scan, diagnostics);

        log::debug!(
            "{}: {} file(s), {} diagnostic(s), {} suppressed",
            report.label,
            report.files_scanned,
            active.len(),
            suppressed.len()
        );

        report.reported = active.len();
        report.suppressed = suppressed;
        for diagnostic in active {
            sink.report(diagnostic);
        }

        report
    }

    fn introduction_of(&self, declaration: &Occurrence) -> Introduction {
        let symbol = declaration.symbol.as_str();
        let path = match self.resolver.relative_path(&declaration.position.file) {
            Some(path) => path,
            None => {
                log::warn!(
                    "{} is outside the repository at {}",
                    declaration.position.file.display(),
                    self.resolver.root().display()
                );
                return Introduction::NotFound;
            }
        };

        self.cache
            .get_or_resolve(IntroductionKey::new(symbol, path.as_str()), || {
                self.resolver.resolve_introduction(symbol, &path)
            })
    }
}

/// First declaration of each symbol: lowest file path, then source order.
fn index_declarations<'a>(
    occurrences: impl Iterator<Item = &'a Occurrence>,
) -> BTreeMap<String, Occurrence> {
    let mut declarations: BTreeMap<String, Occurrence> = BTreeMap::new();

    for occurrence in occurrences.filter(|o| o.is_declaration()) {
        match declarations.get_mut(&occurrence.symbol) {
            None => {
                declarations.insert(occurrence.symbol.clone(), occurrence.clone());
            }
            Some(first) => {
                let ignored = if occurrence.position < first.position {
                    std::mem::replace(first, occurrence.clone())
                } else {
                    occurrence.clone()
                };
                log::debug!(
                    "ignoring declaration of '{}' at {}; first declared at {}",
                    ignored.symbol,
                    ignored.position,
                    first.position
                );
            }
        }
    }

    declarations
}

/// Usages grouped by symbol, in traversal order.
fn collect_usages<'a>(
    occurrences: impl Iterator<Item = &'a Occurrence>,
) -> BTreeMap<String, Vec<Occurrence>> {
    let mut usages: BTreeMap<String, Vec<Occurrence>> = BTreeMap::new();
    for occurrence in occurrences.filter(|o| o.is_usage()) {
        usages
            .entry(occurrence.symbol.clone())
            .or_default()
            .push(occurrence.clone());
    }
    usages
}

fn apply_suppressions(
    scan: &UnitScan,
    diagnostics: Vec<Diagnostic>,
) -> (Vec<Diagnostic>, Vec<SuppressedDiagnostic>) {
    if diagnostics.is_empty() {
        return (diagnostics, Vec::new());
    }

    let flagged: HashSet<&Path> = diagnostics
        .iter()
        .map(|d| d.position.file.as_path())
        .collect();
    let suppressions: Vec<_> = scan
        .files
        .iter()
        .filter(|f| flagged.contains(f.path.as_path()))
        .flat_map(|f| parse_suppressions(&f.path, &f.source))
        .collect();

    filter_suppressed(diagnostics, &suppressions)
}

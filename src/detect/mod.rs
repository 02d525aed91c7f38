//! Stale flag detection.
//!
//! `Runner` drives each analysis unit through the scanner, asks history
//! when each used symbol was introduced, and applies `StalenessPolicy`.
//! Surviving diagnostics go to a `DiagnosticSink`.

mod runner;
mod sink;
mod staleness;
mod suppress;
mod types;

pub use runner::Runner;
pub use sink::{CollectingSink, DiagnosticSink};
pub use staleness::{Cutoff, StalenessPolicy};
pub use suppress::{
    filter_suppressed, matches_suppression, parse_suppressions, Suppression, SuppressionType,
};
pub use types::{
    format_message, AuditResult, Diagnostic, SuppressedDiagnostic, UnitReport, RULE_ID,
};

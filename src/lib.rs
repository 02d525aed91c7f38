//! Flagexorcist - stale feature flag auditor.
//!
//! Feature flags are meant to be temporary. Flagexorcist takes a list of flag
//! symbol names and a cutoff age, finds where each flag is declared and used
//! in a Go codebase, asks git when the flag first appeared in its declaring
//! file, and reports every usage of a flag older than the cutoff.
//!
//! # Architecture
//!
//! Data flows one way:
//!
//! ```text
//! Scanner ──▶ (declarations, usages) ──▶ HistoryResolver ──▶ StalenessPolicy ──▶ DiagnosticSink
//!                                              │
//!                                      IntroductionCache
//! ```
//!
//! - `analysis`: tree-sitter parsing, binding resolution and the occurrence scanner
//! - `history`: git history mining and the run-wide introduction cache
//! - `detect`: staleness policy, suppressions and the `Runner` orchestrator
//! - `config`: YAML config schema and validation into `AuditSettings`
//! - `report`: output formatting (pretty, JSON, SARIF)
//! - `cli`: argument parsing, file collection and exit codes
//! - `logging`: `env_logger` setup

pub mod analysis;
pub mod cli;
pub mod config;
pub mod detect;
pub mod history;
pub mod logging;
pub mod report;

pub use analysis::{register_analyzers, AnalysisUnit, Occurrence, OccurrenceKind, Position, Scanner};
pub use config::{AuditSettings, Config, ConfigError};
pub use detect::{
    AuditResult, CollectingSink, Cutoff, Diagnostic, DiagnosticSink, Runner, StalenessPolicy,
};
pub use history::{GitHistory, HistoryError, HistoryLimits, HistorySource, Introduction};

/// Initialize all subsystems.
///
/// Call this once at startup.
pub fn init() {
    register_analyzers();
}

//! AST-backed occurrence analysis.
//!
//! This module turns source files into occurrences of tracked symbols:
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ Source Files    │────▶│ Analyzer     │────▶│ ParsedFile    │
//! └─────────────────┘     │ (Go)         │     └───────────────┘
//!                         └──────────────┘             │
//!                                                      ▼
//!                         ┌──────────────┐     ┌───────────────┐
//!                         │ Scanner      │◀────│ BindingTable  │
//!                         └──────────────┘     └───────────────┘
//!                                │
//!                                ▼
//!                         Vec<Occurrence>
//! ```
//!
//! # Adding a New Language
//!
//! 1. Create a new module in `src/analysis/languages/`
//! 2. Implement `LanguageAnalyzer`, including its binding pass
//! 3. Register the analyzer in `languages/mod.rs`

mod bindings;
mod facts;
mod languages;
mod scanner;
mod traits;
mod unit;

pub use bindings::{BindingTable, DeclarationSite};
pub use facts::{Occurrence, OccurrenceKind, Position};
pub use languages::{get_analyzer, register_analyzers, supported_extensions, GoAnalyzer};
pub use scanner::{ScannedFile, Scanner, UnitScan};
pub use traits::{LanguageAnalyzer, ParsedFile};
pub use unit::AnalysisUnit;

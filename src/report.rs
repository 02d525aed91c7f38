//! Output formatting for audit results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration
//!
//! File paths are reported relative to the analyzed path.

use colored::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::detect::{AuditResult, Diagnostic, SuppressedDiagnostic, SuppressionType, RULE_ID};

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub cutoff_days: i64,
    pub passed: bool,
    pub units: usize,
    pub files_scanned: usize,
    pub files_failed: usize,
    /// Symbols whose introduction could not be determined.
    pub unresolved: usize,
    pub diagnostics: Vec<JsonDiagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<JsonSuppressedDiagnostic>,
    pub suppressed_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub rule: String,
    pub symbol: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    /// YYYY-MM-DD
    pub introduced_at: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSuppressedDiagnostic {
    pub diagnostic: JsonDiagnostic,
    pub suppression: JsonSuppression,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSuppression {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    pub file: String,
    pub line: usize,
    #[serde(rename = "type")]
    pub suppression_type: String,
}

/// Build the JSON report for `result`.
pub fn build_json_report(path: &str, base_path: &Path, result: &AuditResult) -> JsonReport {
    let diagnostics = result
        .diagnostics
        .iter()
        .map(|d| diagnostic_to_json(d, base_path))
        .collect();

    let suppressed = result
        .suppressed
        .iter()
        .map(|sd| JsonSuppressedDiagnostic {
            diagnostic: diagnostic_to_json(&sd.diagnostic, base_path),
            suppression: JsonSuppression {
                symbol: sd.suppression.symbol.clone(),
                reason: sd.suppression.reason.clone(),
                file: make_relative_path(&sd.suppression.file, base_path),
                line: sd.suppression.line,
                suppression_type: suppression_type_name(sd.suppression.suppression_type)
                    .to_string(),
            },
        })
        .collect();

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        cutoff_days: result.cutoff_days,
        passed: !result.has_diagnostics(),
        units: result.units,
        files_scanned: result.files_scanned,
        files_failed: result.files_failed,
        unresolved: result.unresolved,
        diagnostics,
        suppressed,
        suppressed_count: result.suppressed_count(),
    }
}

/// Write results in JSON format.
pub fn write_json(path: &str, base_path: &Path, result: &AuditResult) -> anyhow::Result<()> {
    let report = build_json_report(path, base_path, result);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn diagnostic_to_json(d: &Diagnostic, base_path: &Path) -> JsonDiagnostic {
    JsonDiagnostic {
        rule: RULE_ID.to_string(),
        symbol: d.symbol.clone(),
        file: make_relative_path(&d.position.file, base_path),
        line: d.position.line,
        column: d.position.column,
        introduced_at: d.introduced_at.format("%Y-%m-%d").to_string(),
        message: d.message.clone(),
    }
}

fn suppression_type_name(t: SuppressionType) -> &'static str {
    match t {
        SuppressionType::Line => "line",
        SuppressionType::NextLine => "nextline",
        SuppressionType::File => "file",
    }
}

// =============================================================================
// SARIF Format
// =============================================================================

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "flagexorcist";

#[derive(Serialize, Deserialize)]
struct SarifReport {
    version: String,
    #[serde(rename = "$schema")]
    schema: String,
    runs: Vec<SarifRun>,
}

#[derive(Serialize, Deserialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize, Deserialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize, Deserialize)]
struct SarifDriver {
    name: String,
    version: String,
    rules: Vec<SarifRule>,
}

#[derive(Serialize, Deserialize)]
struct SarifRule {
    id: String,
    name: String,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "fullDescription")]
    full_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    default_config: SarifRuleConfig,
}

#[derive(Serialize, Deserialize)]
struct SarifRuleConfig {
    level: String,
}

#[derive(Serialize, Deserialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize, Deserialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize, Deserialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize, Deserialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifact,
    region: SarifRegion,
}

#[derive(Serialize, Deserialize)]
struct SarifArtifact {
    uri: String,
}

#[derive(Serialize, Deserialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
    #[serde(rename = "startColumn")]
    start_column: usize,
}

fn stale_flag_rule(cutoff_days: i64) -> SarifRule {
    SarifRule {
        id: RULE_ID.to_string(),
        name: "StaleFlag".to_string(),
        short_description: SarifMessage {
            text: "Feature flag is older than the configured cutoff".to_string(),
        },
        full_description: SarifMessage {
            text: format!(
                "Reports every usage of a feature flag whose declaration was added to its file more than {} days ago. Old flags are usually fully rolled out and can be removed.",
                cutoff_days
            ),
        },
        default_config: SarifRuleConfig {
            level: "warning".to_string(),
        },
    }
}

/// Render results as a SARIF document.
pub fn sarif_string(base_path: &Path, result: &AuditResult) -> anyhow::Result<String> {
    let results = result
        .diagnostics
        .iter()
        .map(|d| SarifResult {
            rule_id: RULE_ID.to_string(),
            level: "warning".to_string(),
            message: SarifMessage {
                text: d.message.clone(),
            },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifact {
                        uri: make_relative_path(&d.position.file, base_path),
                    },
                    region: SarifRegion {
                        start_line: d.position.line.max(1),
                        start_column: d.position.column.max(1),
                    },
                },
            }],
        })
        .collect();

    let report = SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SARIF_SCHEMA.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    rules: vec![stale_flag_rule(result.cutoff_days)],
                },
            },
            results,
        }],
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write results in SARIF format.
pub fn write_sarif(base_path: &Path, result: &AuditResult) -> anyhow::Result<()> {
    println!("{}", sarif_string(base_path, result)?);
    Ok(())
}

/// Path of `file` relative to `base_path`, `/`-separated.
///
/// A single-file scan reports just the file name.
pub fn make_relative_path(file: &Path, base_path: &Path) -> String {
    if base_path.as_os_str().is_empty() {
        return file.to_string_lossy().to_string();
    }

    if file == base_path {
        return file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.to_string_lossy().to_string());
    }

    file.strip_prefix(base_path)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| file.to_string_lossy().to_string())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(
    path: &str,
    base_path: &Path,
    config_path: Option<&str>,
    result: &AuditResult,
    show_suppressed: bool,
) {
    println!();
    print!("  ");
    print!("{}", "flagexorcist".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", path);
    if let Some(config) = config_path {
        print!("  {}", "Config:   ".dimmed());
        println!("{}", config);
    }
    print!("  {}", "Cutoff:   ".dimmed());
    println!("{} days", result.cutoff_days);
    println!();

    write_result_summary(result);
    println!();

    if result.has_diagnostics() {
        write_diagnostics(&result.diagnostics, base_path);
        println!();
    }

    if !result.suppressed.is_empty() {
        write_suppressed_summary(&result.suppressed, base_path, show_suppressed);
        println!();
    }

    write_totals(result);
    println!();
}

fn write_result_summary(result: &AuditResult) {
    if result.has_diagnostics() {
        print!("  {}", "✗ FAIL".red());
        let flags = result.stale_symbols().len();
        print!(
            "  {} stale usage{} of {} flag{}",
            result.diagnostics.len().to_string().red().bold(),
            plural(result.diagnostics.len()),
            flags,
            plural(flags)
        );
    } else {
        print!("  {}", "✓ PASS".green());
        print!("  no stale flags");
    }

    if !result.suppressed.is_empty() {
        print!(
            "  {}",
            format!("({} suppressed)", result.suppressed.len()).dimmed()
        );
    }
    println!();
}

fn write_diagnostics(diagnostics: &[Diagnostic], base_path: &Path) {
    println!("  {} ({}):", "Stale flags".bold(), diagnostics.len());
    println!();

    for d in diagnostics {
        print!("    {} ", "STALE".yellow());
        print!("  {:<20}", d.symbol.dimmed());
        print!("{}", make_relative_path(&d.position.file, base_path).blue());
        print!(
            "{}",
            format!(":{}:{}", d.position.line, d.position.column).dimmed()
        );
        println!();
        println!("            {}", d.message);
        println!();
    }
}

fn write_suppressed_summary(suppressed: &[SuppressedDiagnostic], base_path: &Path, show_details: bool) {
    println!("  {} ({}):", "Suppressed".dimmed(), suppressed.len());

    if !show_details {
        println!("    {}", "(use --show-suppressed to see details)".dimmed());
        return;
    }

    println!();
    for sd in suppressed {
        let d = &sd.diagnostic;
        let s = &sd.suppression;

        print!("    {:<20}", d.symbol.dimmed());
        print!("{}", make_relative_path(&d.position.file, base_path).blue());
        if s.suppression_type == SuppressionType::File {
            print!("{}", ":* (file)".dimmed());
        } else {
            print!("{}", format!(":{}", d.position.line).dimmed());
        }
        println!();

        if !s.reason.is_empty() {
            println!("            {}", format!("reason: {:?}", s.reason).dimmed());
        }
    }
}

fn write_totals(result: &AuditResult) {
    print!(
        "  {}",
        format!(
            "Units: {}  Files: {}",
            result.units, result.files_scanned
        )
        .dimmed()
    );
    if result.files_failed > 0 {
        print!("  {}", format!("Unreadable: {}", result.files_failed).yellow());
    }
    if result.unresolved > 0 {
        print!(
            "  {}",
            format!("Unknown introduction: {}", result.unresolved).dimmed()
        );
    }
    println!();
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

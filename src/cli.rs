//! Command-line interface for flagexorcist.

use clap::{Parser, Subcommand};
use globset::GlobSet;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::analysis::{supported_extensions, AnalysisUnit};
use crate::config::{Config, UnitGranularity, DEFAULT_CONFIG_NAMES};
use crate::detect::{AuditResult, CollectingSink, Runner};
use crate::history::GitHistory;
use crate::logging;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Starter config written by `init`.
const CONFIG_TEMPLATE: &str = include_str!("templates/flagexorcist.yaml");

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["vendor", "testdata", "node_modules"];

/// Find usages of stale feature flags.
///
/// Flagexorcist scans Go sources for the configured flag symbols, asks git
/// when each flag was added to the file that declares it, and reports every
/// usage of a flag older than the cutoff.
#[derive(Parser)]
#[command(name = "flagexorcist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report usages of flags older than the cutoff
    #[command(visible_alias = "check")]
    Audit(AuditArgs),
    /// Write a starter config file
    Init(InitArgs),
}

/// Arguments for the audit command.
#[derive(Parser)]
pub struct AuditArgs {
    /// Path to audit (file or directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Flag symbol to audit; repeat or separate with commas
    #[arg(short, long = "symbol", env = "FLAG_SYMBOLS", value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Maximum flag age: days (30, 30d), weeks (6w) or a date (YYYY-MM-DD)
    #[arg(long, env = "CUTOFF")]
    pub cutoff: Option<String>,

    /// Repository root (default: discovered from the audited path)
    #[arg(long, env = "REPO_PATH")]
    pub repo: Option<PathBuf>,

    /// Output format: pretty, json, or sarif
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Log level: off, error, warn, info, debug, trace (default: RUST_LOG, else warn)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// How files are grouped for analysis
    #[arg(long, value_enum)]
    pub unit: Option<UnitGranularity>,

    /// Examine at most this many recent commits per flag
    #[arg(long)]
    pub max_commits: Option<usize>,

    /// Give up on a flag's history after this many seconds
    #[arg(long)]
    pub history_timeout: Option<u64>,

    /// Also scan _test.go files
    #[arg(long)]
    pub include_tests: bool,

    /// Show suppressed diagnostics in output
    #[arg(long)]
    pub show_suppressed: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "flagexorcist.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl AuditArgs {
    /// Override config values with those given on the command line or in
    /// the environment.
    fn apply_to(&self, config: &mut Config) {
        if !self.symbols.is_empty() {
            config.symbols = self.symbols.clone();
        }
        if let Some(cutoff) = &self.cutoff {
            config.cutoff = Some(cutoff.clone());
        }
        if let Some(repo) = &self.repo {
            config.repository = Some(repo.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level = Some(level.clone());
        }
        if let Some(unit) = self.unit {
            config.unit = Some(unit);
        }
        if let Some(max) = self.max_commits {
            config.history.max_commits = Some(max);
        }
        if let Some(secs) = self.history_timeout {
            config.history.timeout_secs = Some(secs);
        }
        if self.include_tests {
            config.include_test_files = Some(true);
        }
    }
}

/// Locate the config file: explicit path, then the audited path and its
/// ancestors, then the working directory.
fn discover_config(args: &AuditArgs, abs_path: &Path) -> Option<PathBuf> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }
    let start = if abs_path.is_dir() {
        abs_path
    } else {
        abs_path.parent().unwrap_or(abs_path)
    };
    Config::discover(start).or_else(|| {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
    })
}

/// Collect Go source files under `root`.
pub fn collect_files(
    root: &Path,
    include_test_files: bool,
    exclusions: &GlobSet,
) -> anyhow::Result<Vec<PathBuf>> {
    let extensions = supported_extensions();
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && !name.starts_with('_') && !SKIPPED_DIRS.contains(&&*name)
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !extensions.contains(&ext) {
            continue;
        }

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !include_test_files && name.ends_with("_test.go") {
            continue;
        }

        let rel = report::make_relative_path(path, root);
        if exclusions.is_match(&rel) {
            log::debug!("excluded {}", rel);
            continue;
        }

        files.push(path.to_path_buf());
    }

    Ok(files)
}

/// Group files into analysis units.
pub fn group_units(root: &Path, files: Vec<PathBuf>, unit: UnitGranularity) -> Vec<AnalysisUnit> {
    match unit {
        UnitGranularity::Tree => {
            if files.is_empty() {
                Vec::new()
            } else {
                vec![AnalysisUnit::new(root, files)]
            }
        }
        UnitGranularity::Package => {
            let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
            for file in files {
                let dir = file.parent().unwrap_or(root).to_path_buf();
                by_dir.entry(dir).or_default().push(file);
            }
            by_dir
                .into_iter()
                .map(|(dir, files)| AnalysisUnit::new(dir, files))
                .collect()
        }
    }
}

/// Run the audit command.
pub fn run_audit(args: &AuditArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" && args.format != "sarif" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'sarif'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let config_path = discover_config(args, &abs_path);
    let mut config = match &config_path {
        Some(path) => match Config::parse_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                return Ok(EXIT_ERROR);
            }
        },
        None => Config::default(),
    };
    args.apply_to(&mut config);

    match config.log_level() {
        Ok(Some(level)) => logging::init_with_level(level),
        Ok(None) => logging::init_from_env(),
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    }
    if let Some(path) = &config_path {
        log::info!("using config {}", path.display());
    }

    let settings = match config.settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            if config_path.is_none() {
                eprintln!("Run 'flagexorcist init' to create a config file");
            }
            return Ok(EXIT_ERROR);
        }
    };
    let exclusions = match config.exclusions() {
        Ok(set) => set,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let history = match &config.repository {
        Some(repo) => GitHistory::open(repo),
        None => GitHistory::discover(&abs_path),
    };
    let history = match history {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let (root, files) = if abs_path.is_dir() {
        let files = collect_files(&abs_path, config.should_include_test_files(), &exclusions)?;
        (abs_path.clone(), files)
    } else {
        let parent = abs_path.parent().unwrap_or(&abs_path).to_path_buf();
        (parent, vec![abs_path.clone()])
    };

    if files.is_empty() {
        eprintln!("Warning: no files to scan");
        return Ok(EXIT_SUCCESS);
    }

    let units = group_units(&root, files, config.unit());
    log::info!(
        "auditing {} symbol(s) across {} unit(s)",
        settings.symbols.len(),
        units.len()
    );

    let runner = Runner::new(&settings, Arc::new(history));
    let sink = CollectingSink::new();
    let reports = runner.analyze_units(&units, &sink);

    let mut result = AuditResult::new(runner.policy().cutoff_days());
    for unit_report in reports {
        result.add_unit(unit_report);
    }
    result.diagnostics = sink.into_diagnostics();
    result.sort();

    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&path_str, &root, &result)?,
        "sarif" => report::write_sarif(&root, &result)?,
        _ => {
            let config_str = config_path.as_ref().map(|p| p.to_string_lossy().to_string());
            report::write_pretty(
                &path_str,
                &root,
                config_str.as_deref(),
                &result,
                args.show_suppressed,
            );
        }
    }

    if result.has_diagnostics() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Use --force to overwrite it or --output to choose another path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, CONFIG_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. List your flag symbols and pick a cutoff in {}", args.output.display());
    println!("  2. Run: flagexorcist audit . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

//! Configuration file schema and validation.
//!
//! The config file names the flags to audit and the cutoff. Command-line
//! flags and environment variables override it field by field; the merged
//! result is validated once into `AuditSettings`.

use globset::{Glob, GlobSet, GlobSetBuilder};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::detect::Cutoff;
use crate::history::HistoryLimits;

/// Config file names searched for, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["flagexorcist.yaml", ".flagexorcist.yaml"];

/// History search timeout when none is configured. Zero disables it.
pub const DEFAULT_HISTORY_TIMEOUT_SECS: u64 = 60;

/// Errors in the configuration. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("no symbols configured (use `symbols` in the config file, --symbol or FLAG_SYMBOLS)")]
    NoSymbols,
    #[error("invalid symbol name {0:?}")]
    InvalidSymbol(String),
    #[error("no cutoff configured (use `cutoff` in the config file, --cutoff or CUTOFF)")]
    MissingCutoff,
    #[error("{0}")]
    InvalidCutoff(String),
    #[error("invalid log level {0:?}, must be off, error, warn, info, debug or trace")]
    InvalidLogLevel(String),
    #[error("invalid excluded path pattern {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },
}

/// How source files are grouped into analysis units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnitGranularity {
    /// One unit per directory, i.e. per Go package.
    #[default]
    Package,
    /// The whole tree as a single unit.
    Tree,
}

/// Top-level config file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Flag symbol names to audit.
    #[serde(default)]
    pub symbols: Vec<String>,
    /// `30`, `30d`, `6w` or `2023-01-01`.
    #[serde(default)]
    pub cutoff: Option<String>,
    /// Repository root (default: discovered from the analyzed path).
    /// Relative paths are taken from the config file's directory.
    #[serde(default)]
    pub repository: Option<PathBuf>,
    #[serde(default)]
    pub log_level: Option<String>,
    /// Whether to scan `_test.go` files (default: false)
    #[serde(default)]
    pub include_test_files: Option<bool>,
    /// Glob patterns for paths to exclude from analysis (e.g., "**/generated/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    #[serde(default)]
    pub unit: Option<UnitGranularity>,
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Bounds on each history search.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub max_commits: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Validated settings for one audit run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSettings {
    pub symbols: Vec<String>,
    pub cutoff: Cutoff,
    pub limits: HistoryLimits,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let (Some(repo), Some(dir)) = (config.repository.as_mut(), path.parent()) {
            if repo.is_relative() {
                *repo = dir.join(&*repo);
            }
        }
        Ok(config)
    }

    /// Find a config file in `start` or one of its ancestors.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start.ancestors().find_map(|dir| {
            DEFAULT_CONFIG_NAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
    }

    /// Returns whether to include test files (defaults to false).
    pub fn should_include_test_files(&self) -> bool {
        self.include_test_files.unwrap_or(false)
    }

    pub fn unit(&self) -> UnitGranularity {
        self.unit.unwrap_or_default()
    }

    /// Configured log level; `None` leaves it to `RUST_LOG`.
    pub fn log_level(&self) -> Result<Option<LevelFilter>, ConfigError> {
        match self.log_level.as_deref() {
            None => Ok(None),
            Some(level) => level
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidLogLevel(level.to_string())),
        }
    }

    /// Compile `excluded_paths` into one matcher.
    pub fn exclusions(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|source| ConfigError::InvalidGlob {
            pattern: self.excluded_paths.join(", "),
            source,
        })
    }

    /// History bounds. The timeout defaults to
    /// `DEFAULT_HISTORY_TIMEOUT_SECS`; `timeout_secs: 0` turns it off.
    pub fn history_limits(&self) -> HistoryLimits {
        let secs = self
            .history
            .timeout_secs
            .unwrap_or(DEFAULT_HISTORY_TIMEOUT_SECS);
        HistoryLimits {
            max_commits: self.history.max_commits,
            timeout: (secs > 0).then(|| Duration::from_secs(secs)),
        }
    }

    /// Validate the config into settings for a run.
    pub fn settings(&self) -> Result<AuditSettings, ConfigError> {
        let mut symbols: Vec<String> = Vec::new();
        for raw in &self.symbols {
            let name = raw.trim();
            if name.is_empty() {
                continue;
            }
            if !is_identifier(name) {
                return Err(ConfigError::InvalidSymbol(name.to_string()));
            }
            if !symbols.iter().any(|s| s == name) {
                symbols.push(name.to_string());
            }
        }
        if symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }

        let cutoff = match self.cutoff.as_deref() {
            None => return Err(ConfigError::MissingCutoff),
            Some(raw) if raw.trim().is_empty() => return Err(ConfigError::MissingCutoff),
            Some(raw) => raw.parse::<Cutoff>().map_err(ConfigError::InvalidCutoff)?,
        };

        Ok(AuditSettings {
            symbols,
            cutoff,
            limits: self.history_limits(),
        })
    }
}

/// Go identifier: a letter or underscore followed by letters, digits or underscores.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
symbols:
  - NewCheckout
  - BetaSearch
cutoff: 6w
log_level: debug
excluded_paths:
  - "**/generated/**"
unit: tree
history:
  max_commits: 500
  timeout_secs: 20
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.symbols, vec!["NewCheckout", "BetaSearch"]);
        assert_eq!(config.unit(), UnitGranularity::Tree);
        assert_eq!(config.log_level().unwrap(), Some(LevelFilter::Debug));
        assert!(!config.should_include_test_files());

        let settings = config.settings().unwrap();
        assert_eq!(settings.cutoff, Cutoff::Days(42));
        assert_eq!(settings.limits.max_commits, Some(500));
        assert_eq!(settings.limits.timeout, Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.unit(), UnitGranularity::Package);
        assert_eq!(config.log_level().unwrap(), None);
        assert_eq!(
            config.history_limits(),
            HistoryLimits {
                max_commits: None,
                timeout: Some(Duration::from_secs(DEFAULT_HISTORY_TIMEOUT_SECS)),
            }
        );
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let mut config = Config::default();
        config.history.timeout_secs = Some(0);
        assert_eq!(config.history_limits().timeout, None);
    }

    #[test]
    fn test_relative_repository_follows_config_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("svc");
        fs::create_dir_all(&dir).unwrap();

        let relative = dir.join("flagexorcist.yaml");
        fs::write(&relative, "symbols: [X]\nrepository: ..\n").unwrap();
        assert_eq!(
            Config::parse_file(&relative).unwrap().repository,
            Some(dir.join(".."))
        );

        let absolute = dir.join(".flagexorcist.yaml");
        fs::write(&absolute, "symbols: [X]\nrepository: /srv/repo\n").unwrap();
        assert_eq!(
            Config::parse_file(&absolute).unwrap().repository,
            Some(PathBuf::from("/srv/repo"))
        );
    }

    #[test]
    fn test_symbols_required() {
        let config = Config {
            symbols: vec!["  ".to_string()],
            cutoff: Some("30".to_string()),
            ..Config::default()
        };
        assert!(matches!(config.settings(), Err(ConfigError::NoSymbols)));
    }

    #[test]
    fn test_symbols_trimmed_and_deduplicated() {
        let config = Config {
            symbols: vec![" A ".to_string(), "B".to_string(), "A".to_string()],
            cutoff: Some("30".to_string()),
            ..Config::default()
        };
        assert_eq!(config.settings().unwrap().symbols, vec!["A", "B"]);
    }

    #[test]
    fn test_invalid_symbol_rejected() {
        let config = Config {
            symbols: vec!["flags.NewCheckout".to_string()],
            cutoff: Some("30".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.settings(),
            Err(ConfigError::InvalidSymbol(name)) if name == "flags.NewCheckout"
        ));
    }

    #[test]
    fn test_cutoff_required_and_validated() {
        let mut config = Config {
            symbols: vec!["Flag".to_string()],
            ..Config::default()
        };
        assert!(matches!(config.settings(), Err(ConfigError::MissingCutoff)));

        config.cutoff = Some("a while".to_string());
        assert!(matches!(config.settings(), Err(ConfigError::InvalidCutoff(_))));
    }

    #[test]
    fn test_invalid_log_level() {
        let config = Config {
            log_level: Some("loud".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.log_level(),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_exclusions() {
        let config = Config {
            excluded_paths: vec!["**/generated/**".to_string(), "legacy/*.go".to_string()],
            ..Config::default()
        };
        let set = config.exclusions().unwrap();
        assert!(set.is_match("api/generated/flags.go"));
        assert!(set.is_match("legacy/old.go"));
        assert!(!set.is_match("api/flags.go"));

        let bad = Config {
            excluded_paths: vec!["[".to_string()],
            ..Config::default()
        };
        assert!(bad.exclusions().is_err());
    }

    #[test]
    fn test_discover_searches_ancestors() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("svc/api");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join(".flagexorcist.yaml"), "symbols: [X]\n").unwrap();

        let found = Config::discover(&nested).unwrap();
        assert_eq!(found, temp.path().join(".flagexorcist.yaml"));
    }

    #[test]
    fn test_parse_file_errors() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");
        assert!(matches!(
            Config::parse_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        let broken = temp.path().join("broken.yaml");
        fs::write(&broken, "symbols: [unclosed\n").unwrap();
        assert!(matches!(
            Config::parse_file(&broken),
            Err(ConfigError::Parse { .. })
        ));
    }
}

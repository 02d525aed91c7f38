//! Tests for the JSON and SARIF report structure.
//!
//! Runs a real audit over the shop fixture and checks the serialized field
//! names and values consumers depend on.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use git2::{Repository, Signature, Time};
use serde_json::Value;
use tempfile::TempDir;

use flagexorcist::report::{build_json_report, sarif_string, JsonReport};
use flagexorcist::{
    AnalysisUnit, AuditResult, AuditSettings, CollectingSink, Cutoff, GitHistory, HistoryLimits,
    Runner,
};

const FIXTURES: &[&str] = &["checkout.go", "flags.go", "search.go"];

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata/shop")
        .join(name);
    fs::read_to_string(path).expect("fixture should exist")
}

fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
}

/// Commit every fixture in one commit dated `when`.
fn fixture_repository(when: DateTime<Utc>) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let repo = Repository::init(&root).unwrap();

    let mut index = repo.index().unwrap();
    for name in FIXTURES {
        let rel = format!("shop/{}", name);
        let path = root.join(&rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, fixture(name)).unwrap();
        index.add_path(Path::new(&rel)).unwrap();
    }
    index.write().unwrap();

    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::new("Dev", "dev@example.com", &Time::new(when.timestamp(), 0)).unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "import shop", &tree, &[])
        .unwrap();

    (temp, root)
}

fn run_audit(root: &Path) -> AuditResult {
    let settings = AuditSettings {
        symbols: vec![
            "NewCheckout".to_string(),
            "BetaSearch".to_string(),
            "LegacyPricing".to_string(),
        ],
        cutoff: Cutoff::Days(30),
        limits: HistoryLimits::default(),
    };
    let history = GitHistory::open(root).unwrap();
    let runner = Runner::with_now(&settings, Arc::new(history), date(2022, 6, 1));

    let shop = root.join("shop");
    let unit = AnalysisUnit::new(&shop, FIXTURES.iter().map(|f| shop.join(f)).collect());

    let sink = CollectingSink::new();
    let mut result = AuditResult::new(runner.policy().cutoff_days());
    result.add_unit(runner.analyze_unit(&unit, &sink));
    result.diagnostics = sink.into_diagnostics();
    result.sort();
    result
}

#[test]
fn test_json_report_structure() {
    let (_temp, root) = fixture_repository(date(2022, 1, 10));
    let result = run_audit(&root);

    let report = build_json_report(".", &root, &result);
    let json: Value = serde_json::to_value(&report).unwrap();

    for key in [
        "version",
        "path",
        "cutoff_days",
        "passed",
        "units",
        "files_scanned",
        "files_failed",
        "unresolved",
        "diagnostics",
        "suppressed",
        "suppressed_count",
    ] {
        assert!(json.get(key).is_some(), "missing key {}", key);
    }

    assert_eq!(json["passed"], false);
    assert_eq!(json["cutoff_days"], 30);
    assert_eq!(json["units"], 1);
    assert_eq!(json["files_scanned"], 3);
    assert_eq!(json["suppressed_count"], 1);

    let diagnostics = json["diagnostics"].as_array().unwrap();
    assert_eq!(diagnostics.len(), 2);

    // Sorted by file: checkout.go before search.go.
    assert_eq!(diagnostics[0]["symbol"], "NewCheckout");
    assert_eq!(diagnostics[0]["file"], "shop/checkout.go");
    assert_eq!(diagnostics[0]["line"], 4);
    assert_eq!(diagnostics[0]["introduced_at"], "2022-01-10");
    assert_eq!(diagnostics[0]["rule"], "stale_flag");
    assert_eq!(diagnostics[1]["symbol"], "BetaSearch");
    assert_eq!(diagnostics[1]["file"], "shop/search.go");

    let suppressed = &json["suppressed"][0];
    assert_eq!(suppressed["diagnostic"]["symbol"], "LegacyPricing");
    assert_eq!(suppressed["suppression"]["type"], "line");
    assert_eq!(suppressed["suppression"]["reason"], "pricing migration pending");
}

#[test]
fn test_json_report_round_trips() {
    let (_temp, root) = fixture_repository(date(2022, 1, 10));
    let result = run_audit(&root);

    let text = serde_json::to_string_pretty(&build_json_report(".", &root, &result)).unwrap();
    let parsed: JsonReport = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.diagnostics.len(), result.diagnostics.len());
}

#[test]
fn test_clean_run_passes() {
    let (_temp, root) = fixture_repository(date(2022, 5, 20));
    let result = run_audit(&root);

    let json: Value = serde_json::to_value(build_json_report(".", &root, &result)).unwrap();
    assert_eq!(json["passed"], true);
    assert!(json["diagnostics"].as_array().unwrap().is_empty());
    // Nothing stale, so nothing to suppress either.
    assert!(json.get("suppressed").is_none());
}

#[test]
fn test_sarif_output() {
    let (_temp, root) = fixture_repository(date(2022, 1, 10));
    let result = run_audit(&root);

    let sarif: Value = serde_json::from_str(&sarif_string(&root, &result).unwrap()).unwrap();
    assert_eq!(sarif["version"], "2.1.0");
    assert!(sarif["$schema"].as_str().unwrap().contains("sarif-schema-2.1.0"));

    let run = &sarif["runs"][0];
    assert_eq!(run["tool"]["driver"]["name"], "flagexorcist");
    let results = run["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["ruleId"], "stale_flag");
    assert_eq!(
        results[0]["locations"][0]["physicalLocation"]["artifactLocation"]["uri"],
        "shop/checkout.go"
    );
    assert!(results[0]["message"]["text"]
        .as_str()
        .unwrap()
        .starts_with("Flag 'NewCheckout', added on 2022-01-10"));
}

use std::fs;
use std::path::Path;
use std::sync::Arc;

use repcheck_core::config::EngineConfig;
use repcheck_core::engine::Engine;
use repcheck_core::repo::budget::{CancellationToken, ReadBudget};
use repcheck_core::repo::local::LocalRepository;
use repcheck_core::report::model::{AnalysisResult, Provenance};
use repcheck_core::rules::catalog::RuleCatalog;
use repcheck_core::rules::eval::Evidence;
use repcheck_core::scoring::rating::Rating;
use repcheck_core::scoring::recommend::RemediationTable;
use tempfile::TempDir;

const SINGLE_RULE: &str = r#"{
  "version": "scenario",
  "categories": [
    {"name": "environment", "weight": 1.0, "rules": [
      {"id": "requirements", "points": 10,
       "predicate": {"kind": "file_exists", "candidates": ["requirements.txt"]}}
    ]}
  ]
}"#;

const HALF_AND_HALF: &str = r#"{
  "categories": [
    {"name": "documentation", "weight": 0.5, "rules": [
      {"id": "readme", "points": 5,
       "predicate": {"kind": "file_exists", "candidates": ["README.md"]}}
    ]},
    {"name": "testing", "weight": 0.5, "rules": [
      {"id": "tests_dir", "points": 8,
       "predicate": {"kind": "directory_exists", "candidates": ["tests/"]}}
    ]}
  ]
}"#;

const SEED_SCAN: &str = r#"{
  "categories": [
    {"name": "randomness", "weight": 1.0, "rules": [
      {"id": "seed", "points": 10,
       "predicate": {"kind": "pattern_match",
                     "patterns": ["random\\.seed"], "file_globs": ["*.py"]}}
    ]}
  ]
}"#;

const PINNING: &str = r#"{
  "categories": [
    {"name": "environment", "weight": 1.0, "rules": [
      {"id": "pinned", "points": 10,
       "predicate": {"kind": "dependency_pin_ratio",
                     "manifest_globs": ["requirements.txt"], "threshold": 0.9}}
    ]}
  ]
}"#;

const WELL_KEPT_README: &str = "# Study

## Installation
pip install -r requirements.txt

## Usage
python train.py

## Expected Results
Accuracy 91%.

Data availability: https://doi.org/10.5281/zenodo.1
All runs use seed=42 for reproducibility.
";

/// Writes `files` under a fresh temp dir.
fn repo(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    for (path, content) in files {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    dir
}

fn engine_for(catalog: &str, workers: usize) -> Engine {
    let catalog = RuleCatalog::from_json_str(catalog).expect("catalog should load");
    let config = EngineConfig {
        workers,
        ..EngineConfig::default()
    };
    Engine::new(Arc::new(catalog), Arc::new(RemediationTable::default()), config)
        .expect("engine should build")
}

fn analyze_with(engine: &Engine, root: &Path, budget: ReadBudget) -> AnalysisResult {
    let view = LocalRepository::open(root, budget).expect("open repo");
    engine
        .analyze(&view, Provenance::new("test-repo", "2024-06-01T00:00:00Z"))
        .expect("analysis should succeed")
}

fn analyze(catalog: &str, root: &Path) -> AnalysisResult {
    analyze_with(&engine_for(catalog, 1), root, ReadBudget::unlimited())
}

#[test]
fn present_requirements_file_scores_one_hundred() {
    let dir = repo(&[("requirements.txt", "numpy==1.24.3\n")]);
    let result = analyze(SINGLE_RULE, dir.path());

    assert_eq!(result.overall_score, 100.0);
    assert_eq!(result.rating, Rating::Excellent);
    assert!(result.recommendations.is_empty());
    assert!(!result.truncated);
    assert_eq!(result.source_identifier, "test-repo");
    assert_eq!(result.catalog.version, "scenario");
}

#[test]
fn missing_requirements_file_scores_zero_with_one_recommendation() {
    let dir = repo(&[("main.py", "print('hi')\n")]);
    let result = analyze(SINGLE_RULE, dir.path());

    assert_eq!(result.overall_score, 0.0);
    assert_eq!(result.rating, Rating::Critical);
    assert_eq!(result.recommendations.len(), 1);
    assert_eq!(result.recommendations[0].rule_id.as_str(), "requirements");
    assert_eq!(result.recommendations[0].points_impact, 10);
}

#[test]
fn one_passing_and_one_failing_category_scores_fifty() {
    let dir = repo(&[("README.md", "# Paper\n")]);
    let result = analyze(HALF_AND_HALF, dir.path());

    assert_eq!(result.overall_score, 50.0);
    // 50 falls in the [40, 60) band.
    assert_eq!(result.rating, Rating::Poor);
    assert_eq!(result.category_results[0].normalized_score, 100.0);
    assert_eq!(result.category_results[1].normalized_score, 0.0);
}

#[test]
fn one_byte_budget_truncates_pattern_scan() {
    let dir = repo(&[(
        "train.py",
        "import random\n\nrandom.seed(1234)\nprint(random.random())\n",
    )]);
    let budget = ReadBudget::new(1, None, CancellationToken::new());
    let result = analyze_with(&engine_for(SEED_SCAN, 1), dir.path(), budget);

    assert!(result.truncated);
    assert_eq!(result.check_results[0].evidence, Some(Evidence::BudgetExceeded));
    assert!(!result.check_results[0].passed);
}

#[test]
fn three_of_four_pinned_earns_proportional_credit() {
    let dir = repo(&[(
        "requirements.txt",
        "numpy==1.24.3\npandas==2.0.3\nscikit-learn==1.3.0\nmatplotlib\n",
    )]);
    let result = analyze(PINNING, dir.path());
    let check = &result.check_results[0];

    assert!(!check.passed);
    assert_eq!(check.points_earned, (10.0_f64 * 0.75).round() as u32);
    assert_eq!(result.overall_score, 80.0);
}

#[test]
fn repeated_analyses_are_identical() {
    let dir = repo(&[
        ("README.md", "## Installation\npip install -r requirements.txt\n"),
        ("requirements.txt", "numpy>=1.0\ntorch==2.1.0\n"),
        ("src/train.py", "import torch\ntorch.manual_seed(0)\n"),
        ("tests/test_train.py", "def test_x():\n    pass\n"),
    ]);
    let catalog = repcheck_core::default_catalog().unwrap();
    let remediation = repcheck_core::default_remediation().unwrap();
    let engine = Engine::new(
        Arc::new(catalog),
        Arc::new(remediation),
        EngineConfig {
            workers: 4,
            ..EngineConfig::default()
        },
    )
    .unwrap();

    let first = analyze_with(&engine, dir.path(), ReadBudget::unlimited());
    let second = analyze_with(&engine, dir.path(), ReadBudget::unlimited());

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn adding_a_file_never_lowers_the_score() {
    let before = repo(&[("README.md", "# Paper\n")]);
    let after = repo(&[("README.md", "# Paper\n"), ("tests/test_a.py", "")]);

    let low = analyze(HALF_AND_HALF, before.path());
    let high = analyze(HALF_AND_HALF, after.path());

    assert!(high.overall_score >= low.overall_score);
    assert_eq!(high.overall_score, 100.0);
}

#[test]
fn empty_repository_scores_zero_without_nan() {
    let dir = repo(&[]);
    let catalog = repcheck_core::default_catalog().unwrap();
    let engine = Engine::new(
        Arc::new(catalog),
        Arc::new(RemediationTable::default()),
        EngineConfig::default(),
    )
    .unwrap();

    let result = analyze_with(&engine, dir.path(), ReadBudget::unlimited());

    assert_eq!(result.overall_score, 0.0);
    assert!(result.category_results.iter().all(|c| c.normalized_score.is_finite()));
    assert_eq!(result.recommendations.len(), 16);
    assert_eq!(result.recommendations[0].fix, "No specific recommendation available");
}

#[test]
fn default_catalog_covers_every_rule_with_remediation() {
    let catalog = repcheck_core::default_catalog().expect("bundled catalog is valid");
    let remediation = repcheck_core::default_remediation().expect("bundled table parses");

    assert_eq!(catalog.categories().len(), 5);
    assert_eq!(catalog.rule_count(), 16);
    assert_eq!(catalog.info().fingerprint.len(), 64);
    for (_, rule) in catalog.rules() {
        assert!(remediation.get(&rule.id).is_some(), "no remediation for {}", rule.id);
    }
}

#[test]
fn default_catalog_on_a_well_kept_repository() {
    let dir = repo(&[
        ("README.md", WELL_KEPT_README),
        ("requirements.txt", "numpy==1.24.3\ntorch==2.1.0\n"),
        (".python-version", "3.10.12\n"),
        (
            "train.py",
            "import torch\ntorch.manual_seed(42)\ntorch.backends.cudnn.deterministic = True\n",
        ),
        ("download_data.py", "pass\n"),
        ("data/sample.csv", "a,b\n1,2\n"),
        ("tests/test_train.py", "def test_ok():\n    assert True\n"),
        (".github/workflows/ci.yml", "run: pytest --cov=src\n"),
    ]);
    let catalog = repcheck_core::default_catalog().unwrap();
    let engine = Engine::new(
        Arc::new(catalog),
        Arc::new(RemediationTable::default()),
        EngineConfig::default(),
    )
    .unwrap();

    let result = analyze_with(&engine, dir.path(), ReadBudget::unlimited());

    let failed: Vec<&str> = result
        .check_results
        .iter()
        .filter(|c| !c.passed)
        .map(|c| c.rule_id.as_str())
        .collect();
    assert!(failed.is_empty(), "unexpected failures: {failed:?}");
    assert!((result.overall_score - 100.0).abs() < 1e-9);
    assert_eq!(result.rating, Rating::Excellent);
}

#[test]
fn root_level_test_module_counts_as_tests() {
    let dir = repo(&[
        ("model.py", "def fit():\n    pass\n"),
        ("test_model.py", "def test_fit():\n    assert True\n"),
    ]);
    let catalog = repcheck_core::default_catalog().unwrap();
    let engine = Engine::new(
        Arc::new(catalog),
        Arc::new(RemediationTable::default()),
        EngineConfig::default(),
    )
    .unwrap();

    let result = analyze_with(&engine, dir.path(), ReadBudget::unlimited());

    let check = result
        .check_results
        .iter()
        .find(|c| c.rule_id.as_str() == "tests_exist")
        .expect("bundled catalog has tests_exist");
    assert!(check.passed);
    assert_eq!(check.points_earned, 8);
    assert_eq!(
        check.evidence,
        Some(Evidence::PathFound {
            path: "test_model.py".into(),
            candidate: "test_*.py".into(),
        })
    );
}

#[test]
fn git_metadata_is_never_scanned() {
    let dir = repo(&[(".git/hooks/train.py", "random.seed(1)\n")]);
    let result = analyze(SEED_SCAN, dir.path());

    assert!(!result.check_results[0].passed);
    assert_eq!(
        result.check_results[0].evidence,
        Some(Evidence::NoPatternMatch {
            files_scanned: 0,
            files_skipped: 0,
            files_truncated: 0,
        })
    );
}

#[test]
fn analyze_path_opens_and_scores_a_directory() {
    let dir = repo(&[("requirements.txt", "")]);
    let engine = engine_for(SINGLE_RULE, 1);

    let result = repcheck_core::analyze_path(
        dir.path(),
        &engine,
        CancellationToken::new(),
        Provenance::default(),
    )
    .unwrap();
    assert_eq!(result.overall_score, 100.0);

    let missing = dir.path().join("nope");
    let err = repcheck_core::analyze_path(
        &missing,
        &engine,
        CancellationToken::new(),
        Provenance::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("failed to open repository"));
}

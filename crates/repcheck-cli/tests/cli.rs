#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{NamedTempFile, TempDir};

fn repcheck_cmd() -> Command {
    Command::cargo_bin("repcheck").expect("binary should be built")
}

fn repo(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    for (path, content) in files {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    dir
}

const README: &str = "# Study

## Installation
pip install -r requirements.txt

## Usage
python train.py
";

fn well_kept_repo() -> TempDir {
    repo(&[
        ("README.md", README),
        ("requirements.txt", "numpy==1.24.3\n"),
        ("train.py", "import random\nrandom.seed(42)\n"),
        ("tests/test_train.py", "def test_ok():\n    pass\n"),
    ])
}

const SINGLE_RULE: &str = r#"{
  "version": "cli-test",
  "categories": [
    {"name": "environment", "weight": 1.0, "rules": [
      {"id": "requirements", "points": 10,
       "predicate": {"kind": "file_exists", "candidates": ["requirements.txt"]}}
    ]}
  ]
}"#;

fn write_temp(content: &str) -> NamedTempFile {
    let tmp = NamedTempFile::new().expect("create temp file");
    fs::write(tmp.path(), content).expect("write temp file");
    tmp
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let output = repcheck_cmd().args(args).output().expect("command should run");
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

#[test]
fn json_output_has_result_fields() {
    let dir = well_kept_repo();
    let parsed = run_json(&[dir.path().to_str().unwrap()]);

    for field in [
        "schema_version",
        "tool",
        "catalog",
        "overall_score",
        "rating",
        "truncated",
        "category_results",
        "check_results",
        "recommendations",
        "evaluated_at",
    ] {
        assert!(parsed.get(field).is_some(), "missing `{field}`");
    }
    assert_eq!(parsed["check_results"].as_array().unwrap().len(), 16);
    assert_eq!(parsed["category_results"].as_array().unwrap().len(), 5);
    assert_eq!(parsed["tool"]["name"], "repcheck-cli");
    assert_eq!(parsed["truncated"], false);
}

#[test]
fn custom_catalog_scores_one_hundred() {
    let dir = repo(&[("requirements.txt", "")]);
    let catalog = write_temp(SINGLE_RULE);

    let parsed = run_json(&[
        dir.path().to_str().unwrap(),
        "--catalog",
        catalog.path().to_str().unwrap(),
    ]);

    assert_eq!(parsed["overall_score"], 100.0);
    assert_eq!(parsed["rating"], "excellent");
    assert_eq!(parsed["catalog"]["version"], "cli-test");
    assert!(parsed["recommendations"].as_array().unwrap().is_empty());
}

#[test]
fn custom_catalog_failure_uses_custom_remediation() {
    let dir = repo(&[("main.py", "")]);
    let catalog = write_temp(SINGLE_RULE);
    let remediation = write_temp(
        r#"{"requirements": {"fix": "Add requirements.txt", "example": "pip freeze"}}"#,
    );

    let parsed = run_json(&[
        dir.path().to_str().unwrap(),
        "--catalog",
        catalog.path().to_str().unwrap(),
        "--remediation",
        remediation.path().to_str().unwrap(),
    ]);

    assert_eq!(parsed["overall_score"], 0.0);
    assert_eq!(parsed["rating"], "critical");
    let recs = parsed["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0]["fix"], "Add requirements.txt");
    assert_eq!(recs[0]["severity"], "medium");
}

#[test]
fn invalid_catalog_reports_every_violation() {
    let dir = repo(&[]);
    let catalog = write_temp(
        r#"{"categories": [
             {"name": "a", "weight": 0.7, "rules": [
               {"id": "x", "points": 0, "predicate": {"kind": "file_exists", "candidates": []}}
             ]}
           ]}"#,
    );

    repcheck_cmd()
        .arg(dir.path())
        .arg("--catalog")
        .arg(catalog.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid catalog"))
        .stderr(predicate::str::contains("3 violation(s)"));
}

#[test]
fn source_id_is_recorded() {
    let dir = repo(&[]);
    let parsed = run_json(&[dir.path().to_str().unwrap(), "--source-id", "abc123"]);
    assert_eq!(parsed["source_identifier"], "abc123");
}

#[test]
fn text_output_shows_score_and_recommendations() {
    let dir = repo(&[("README.md", "# Title\n")]);

    repcheck_cmd()
        .arg(dir.path())
        .arg("--format")
        .arg("text")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Score:"))
        .stdout(predicate::str::contains("Recommendations:"))
        .stdout(predicate::str::contains("env_file_exists"));
}

#[test]
fn badge_output_is_one_line() {
    let dir = repo(&[("requirements.txt", "")]);
    let catalog = write_temp(SINGLE_RULE);

    repcheck_cmd()
        .arg(dir.path())
        .arg("--catalog")
        .arg(catalog.path())
        .arg("--format")
        .arg("badge")
        .assert()
        .code(0)
        .stdout("reproducibility: 100/100 (Excellent, #44cc11)\n");
}

#[test]
fn fail_under_sets_exit_code() {
    let dir = repo(&[]);

    repcheck_cmd()
        .arg(dir.path())
        .arg("--fail-under")
        .arg("50")
        .assert()
        .code(1);

    repcheck_cmd()
        .arg(dir.path())
        .arg("--fail-under")
        .arg("0")
        .assert()
        .code(0);
}

#[test]
fn out_flag_writes_to_file() {
    let dir = well_kept_repo();
    let tmp = NamedTempFile::new().expect("create temp file");

    repcheck_cmd()
        .arg(dir.path())
        .arg("--out")
        .arg(tmp.path())
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());

    let contents = fs::read_to_string(tmp.path()).expect("read output file");
    let parsed: serde_json::Value = serde_json::from_str(&contents).expect("file should be JSON");
    assert!(parsed["overall_score"].as_f64().unwrap() > 0.0);
}

#[test]
fn tiny_byte_budget_marks_result_truncated() {
    let dir = well_kept_repo();
    let parsed = run_json(&[dir.path().to_str().unwrap(), "--max-total-bytes", "1"]);
    assert_eq!(parsed["truncated"], true);
}

#[test]
fn budget_flags_fall_back_to_environment() {
    let dir = well_kept_repo();
    let output = repcheck_cmd()
        .arg(dir.path())
        .env("REPCHECK_MAX_TOTAL_BYTES", "1")
        .output()
        .expect("command should run");

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["truncated"], true);
}

#[test]
fn deterministic_json_across_runs() {
    let dir = well_kept_repo();
    let path = dir.path().to_str().unwrap();

    let a = run_json(&[path, "--workers", "4"]);
    let b = run_json(&[path, "--workers", "1"]);

    assert_eq!(a["overall_score"], b["overall_score"]);
    assert_eq!(a["check_results"], b["check_results"]);
    assert_eq!(a["recommendations"], b["recommendations"]);
    assert_eq!(a["category_results"], b["category_results"]);
}

#[test]
fn missing_repository_fails() {
    repcheck_cmd()
        .arg("/tmp/does_not_exist_repcheck_test")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open repository"));
}

#[test]
fn missing_path_arg_fails() {
    repcheck_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn invalid_format_flag_fails() {
    let dir = repo(&[]);
    repcheck_cmd()
        .arg(dir.path())
        .arg("--format")
        .arg("xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn help_flag_prints_usage() {
    repcheck_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reproducibility scoring"));
}

//! Command-line tests
//!
//! Each test writes a batch to a temporary file and runs the binary on it.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

const BATCH: &str = r#"{
    "input_files": ["run1.mzML"],
    "software": [{"name": "Sage", "version": "0.14"}, {"name": "Percolator", "version": "3.6"}],
    "processing_steps": [
        {"software": 0, "input_files": [0], "actions": ["identification"]},
        {"software": 1, "actions": ["filtering"]}
    ],
    "score_types": [
        {"name": "hyperscore", "higher_better": true, "step": 0},
        {"name": "q-value", "higher_better": false, "step": 1}
    ],
    "parent_molecules": [
        {"accession": "P1", "sequence": "MPEPTIDEKAAAAK"},
        {"accession": "P2", "sequence": "GGGGGGGGGG"}
    ],
    "parent_groups": [{"members": [0, 1]}],
    "peptides": [
        {"sequence": "PEPTIDEK", "parent_matches": [{"parent": 0, "start": 1, "end": 8}]},
        {"sequence": "AAAAK", "parent_matches": [{"parent": 0, "start": 9, "end": 13}]},
        {"sequence": "GGGG", "parent_matches": [{"parent": 1, "start": 0, "end": 3}]}
    ],
    "data_queries": [
        {"data_id": "scan=1", "input_file": 0},
        {"data_id": "scan=2", "input_file": 0}
    ],
    "query_matches": [
        {"peptide": 0, "query": 0, "charge": 2, "scores": [{"score_type": 0, "value": 30.0}, {"score_type": 1, "value": 0.01}]},
        {"peptide": 2, "query": 1, "charge": 2, "scores": [{"score_type": 0, "value": 12.0}, {"score_type": 1, "value": 0.2}]},
        {"peptide": 1, "query": 0, "charge": 3, "scores": [{"score_type": 0, "value": 18.0}, {"score_type": 1, "value": 0.05}]}
    ],
    "match_groups": [{"members": [0, 2]}]
}"#;

fn batch_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".json").unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn ident_graph() -> Command {
    Command::cargo_bin("ident-graph").unwrap()
}

#[test]
fn test_summary_json() {
    let file = batch_file(BATCH);
    let output = ident_graph()
        .args(["summary", "--format", "json"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let counts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(counts["peptides"], 3);
    assert_eq!(counts["query_matches"], 3);
    assert_eq!(counts["score_types"], 2);
}

#[test]
fn test_summary_text() {
    let file = batch_file(BATCH);
    ident_graph()
        .arg("summary")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("parent_molecules"))
        .stdout(predicate::str::contains("match_groups"));
}

#[test]
fn test_best_match_tsv() {
    let file = batch_file(BATCH);
    ident_graph()
        .args(["best-match", "--score", "q-value", "--format", "tsv"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("scan=1\tprotein\tPEPTIDEK\t2\t0.01"))
        .stdout(predicate::str::contains("scan=2\tprotein\tGGGG\t2\t0.2"));
}

#[test]
fn test_best_match_by_software() {
    let file = batch_file(BATCH);
    ident_graph()
        .args(["best-match", "--score", "hyperscore", "--software", "Sage", "--format", "tsv"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("PEPTIDEK"));

    ident_graph()
        .args(["best-match", "--score", "hyperscore", "--software", "Percolator"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown score type"));
}

#[test]
fn test_unknown_score_type() {
    let file = batch_file(BATCH);
    ident_graph()
        .args(["best-match", "--score", "E-value"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown score type 'E-value'"));
}

#[test]
fn test_coverage_tsv() {
    let file = batch_file(BATCH);
    ident_graph()
        .args(["coverage", "--format", "tsv"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("P1\tprotein\t14\t0.9286"))
        .stdout(predicate::str::contains("P2\tprotein\t10\t0.4000"));
}

#[test]
fn test_cleanup_with_match_groups() {
    let file = batch_file(BATCH);
    let output = ident_graph()
        .args(["cleanup", "--require-match-group", "--format", "json"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["report"]["query_matches_removed"], 1);
    assert_eq!(result["report"]["parent_molecules_removed"], 1);
    assert_eq!(result["report"]["parent_groups_degraded"], true);
    assert_eq!(result["remaining"]["peptides"], 2);
    assert_eq!(result["config"]["require_match_group"], true);
}

#[test]
fn test_cleanup_keeps_connected_batch() {
    let file = batch_file(BATCH);
    ident_graph()
        .arg("cleanup")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 entities"));
}

#[test]
fn test_rejected_batch() {
    let file = batch_file(
        r#"{"parent_molecules": [{"accession": "R1", "molecule_type": "rna"}],
            "peptides": [{"sequence": "PEPTIDE", "parent_matches": [{"parent": 0, "start": 0, "end": 6}]}]}"#,
    );
    ident_graph()
        .arg("summary")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("peptides[0] was rejected"));
}

#[test]
fn test_missing_batch_file() {
    ident_graph()
        .args(["summary", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read batch"));
}

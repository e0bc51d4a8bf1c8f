//! Integration tests for the CLI application
//!
//! These run the built binary against temporary CSV files and generated
//! datasets.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

/// Two separated groups labeled 0 and 1, with a header row
fn labeled_csv() -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::with_suffix(".csv")?;
    writeln!(file, "x,y,label")?;
    for (x, y) in [(1.0, 1.2), (1.5, 0.8), (0.8, 1.6), (1.2, 1.1), (0.9, 0.7)] {
        writeln!(file, "{x},{y},0")?;
    }
    for (x, y) in [(5.0, 5.2), (5.5, 4.8), (4.8, 5.6), (5.2, 5.1), (4.9, 4.7)] {
        writeln!(file, "{x},{y},1")?;
    }
    file.flush()?;
    Ok(file)
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scratchml"))
        .args(args)
        .output()
        .expect("Failed to run CLI")
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let mut all = args.to_vec();
    all.push("--json");
    let output = run(&all);
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_cli_tree_on_csv() {
    let file = labeled_csv().expect("Failed to create test data");
    let report = run_json(&["tree", "--data", file.path().to_str().unwrap()]);

    assert_eq!(report["points"], 10);
    assert_eq!(report["accuracy"], 1.0);
    assert_eq!(report["stats"]["leaf_count"], 2);
}

#[test]
fn test_cli_logistic_on_csv() {
    let file = labeled_csv().expect("Failed to create test data");
    let report = run_json(&[
        "logistic",
        "--data",
        file.path().to_str().unwrap(),
        "--learning-rate",
        "0.1",
        "--epochs",
        "2000",
    ]);
    assert_eq!(report["accuracy"], 1.0);
    assert_eq!(report["weights"].as_array().unwrap().len(), 3);
}

#[test]
fn test_cli_svm_generated() {
    let report = run_json(&["svm", "--generate", "--seed", "3", "-C", "1.0"]);
    assert!(report["accuracy"].as_f64().unwrap() >= 0.95);
    assert_eq!(report["info"]["kernel"], "linear");
    assert!(report["info"]["n_support_vectors"].as_u64().unwrap() > 0);
}

#[test]
fn test_cli_svm_minimal_cache() {
    let report = run_json(&["svm", "--generate", "--seed", "3", "--cache-size", "0"]);
    assert!(report["accuracy"].as_f64().unwrap() >= 0.95);
}

#[test]
fn test_cli_svm_rbf_on_csv() {
    let file = labeled_csv().expect("Failed to create test data");
    let report = run_json(&[
        "svm",
        "--data",
        file.path().to_str().unwrap(),
        "--kernel",
        "rbf",
    ]);
    assert_eq!(report["info"]["kernel"], "rbf");
    assert_eq!(report["points"], 10);
}

#[test]
fn test_cli_kmeans_generated() {
    let report = run_json(&["kmeans", "--generate", "-k", "3", "--seed", "11"]);
    assert_eq!(report["centroids"].as_array().unwrap().len(), 3);
    assert_eq!(report["points"], 150);
}

#[test]
fn test_cli_pca_generated() {
    let report = run_json(&["pca", "--generate"]);
    let ratio = report["explained_variance_ratio"].as_f64().unwrap();
    assert!(ratio > 0.5 && ratio <= 1.0);
}

#[test]
fn test_cli_regress_generated() {
    let report = run_json(&["regress", "--generate", "--degree", "2", "--learning-rate", "0.1"]);
    assert_eq!(report["weights"].as_array().unwrap().len(), 3);
    assert!(report["final_loss"].as_f64().unwrap() < 1.0);
}

#[test]
fn test_cli_knn_query() {
    let file = labeled_csv().expect("Failed to create test data");
    let report = run_json(&[
        "knn",
        "--data",
        file.path().to_str().unwrap(),
        "--query",
        "5",
        "5",
    ]);
    assert_eq!(report["query"]["class"], "B");
    assert_eq!(report["accuracy"], 1.0);
}

#[test]
fn test_cli_plain_text_output() {
    let output = run(&["tree", "--generate", "--max-depth", "3"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== Decision Tree ==="));
    assert!(stdout.contains("Training accuracy"));
}

#[test]
fn test_cli_requires_a_source() {
    let output = run(&["tree"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_missing_file() {
    let output = run(&["pca", "--data", "/nonexistent/points.csv"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_invalid_parameter() {
    let file = labeled_csv().expect("Failed to create test data");
    let output = run(&["knn", "--data", file.path().to_str().unwrap(), "-k", "0"]);
    assert!(!output.status.success());
}

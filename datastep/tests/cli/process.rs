//! Tests for the `process` subcommand.

use cli_test_dir::*;
use std::fs;

use super::datastep;

/// The output we expect from `fixtures/example.csv`.
const EXAMPLE_PROCESSED_CSV: &str = include_str!("../../fixtures/example_processed.csv");

#[test]
fn process_help_flag() {
    let testdir = TestDir::new("datastep", "process_help_flag");
    let output = datastep(&testdir)
        .args(["process", "--help"])
        .expect_success();
    assert!(output.stdout_str().contains("--processed_dataset"));
    assert!(output.stdout_str().contains("EXAMPLE INPUT LOCATORS:"));
}

#[test]
fn process_example_csv() {
    let testdir = TestDir::new("datastep", "process_example_csv");
    let src = testdir.src_path("fixtures/example.csv");
    let output = datastep(&testdir)
        .args(["process", "--processed_dataset", "out/processed"])
        .arg(format!("--input=uploaded_data={}", src.display()))
        .expect_success();
    assert!(output.stdout_str().contains("processed_dataset.csv"));
    testdir.expect_file_contents(
        "out/processed/processed_dataset.csv",
        EXAMPLE_PROCESSED_CSV,
    );
}

#[test]
fn process_input_from_environment() {
    let testdir = TestDir::new("datastep", "process_input_from_environment");
    let src = testdir.src_path("fixtures/example.csv");
    datastep(&testdir)
        .env("DATASTEP_INPUT_UPLOADED_DATA", &src)
        .args(["process", "--processed_dataset", "out"])
        .expect_success();
    testdir.expect_file_contents("out/processed_dataset.csv", EXAMPLE_PROCESSED_CSV);
}

#[test]
fn process_input_from_config() {
    let testdir = TestDir::new("datastep", "process_input_from_config");
    let src = testdir.src_path("fixtures/example.csv");
    datastep(&testdir)
        .args(["config", "set", "inputs.uploaded_data"])
        .arg(&src)
        .expect_success();
    datastep(&testdir)
        .args(["process", "--processed_dataset", "out"])
        .expect_success();
    testdir.expect_file_contents("out/processed_dataset.csv", EXAMPLE_PROCESSED_CSV);
}

#[test]
fn process_rerun_is_byte_identical() {
    let testdir = TestDir::new("datastep", "process_rerun_is_byte_identical");
    let src = testdir.src_path("fixtures/example.csv");
    for _ in 0..2 {
        datastep(&testdir)
            .args(["process", "--processed_dataset", "out"])
            .arg(format!("--input=uploaded_data={}", src.display()))
            .expect_success();
        testdir
            .expect_file_contents("out/processed_dataset.csv", EXAMPLE_PROCESSED_CSV);
    }
    let entries = fs::read_dir(testdir.path("out")).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn process_missing_argument_does_no_io() {
    let testdir = TestDir::new("datastep", "process_missing_argument_does_no_io");
    let src = testdir.src_path("fixtures/example.csv");
    let output = datastep(&testdir)
        .arg("process")
        .arg(format!("--input=uploaded_data={}", src.display()))
        .expect_failure();
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stderr_str().contains("--processed_dataset"));
    testdir.expect_no_such_path("config");
    testdir.expect_no_such_path("tmp");
}

#[test]
fn process_missing_input_dataset() {
    let testdir = TestDir::new("datastep", "process_missing_input_dataset");
    let output = datastep(&testdir)
        .args(["process", "--processed_dataset", "out"])
        .expect_failure();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stderr_str().contains("uploaded_data"));
    testdir.expect_no_such_path("out");
}

#[test]
fn process_ignores_platform_args() {
    let testdir = TestDir::new("datastep", "process_ignores_platform_args");
    let src = testdir.src_path("fixtures/example.csv");
    datastep(&testdir)
        .args(["process", "--processed_dataset", "out"])
        .arg(format!("--input=uploaded_data={}", src.display()))
        .args(["--", "--AZUREML_RUN_ID", "abc"])
        .expect_success();
    testdir.expect_file_contents("out/processed_dataset.csv", EXAMPLE_PROCESSED_CSV);
}

#[test]
fn process_ignores_trailing_unknown_flags() {
    let testdir = TestDir::new("datastep", "process_ignores_trailing_unknown_flags");
    let src = testdir.src_path("fixtures/example.csv");
    datastep(&testdir)
        .args(["process", "--processed_dataset", "out"])
        .arg(format!("--input=uploaded_data={}", src.display()))
        .args(["--AZUREML_RUN_ID", "abc", "--AZUREML_RUN_TOKEN=xyz", "-v"])
        .expect_success();
    testdir.expect_file_contents("out/processed_dataset.csv", EXAMPLE_PROCESSED_CSV);
}

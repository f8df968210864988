//! Tests for the `register` subcommand.

use cli_test_dir::*;
use std::fs;

use super::datastep;

/// The uploaded CSV file in `fixtures/upload`.
const UPLOADED_CSV: &str = include_str!("../../fixtures/upload/uploads/run1/b.csv");

#[test]
fn register_help_flag() {
    let testdir = TestDir::new("datastep", "register_help_flag");
    let output = datastep(&testdir)
        .args(["register", "--help"])
        .expect_success();
    assert!(output.stdout_str().contains("--uploaded_file_path_param"));
    assert!(output.stdout_str().contains("EXAMPLE DATASTORE LOCATORS:"));
}

#[test]
fn register_from_file_datastore() {
    let testdir = TestDir::new("datastep", "register_from_file_datastore");
    let store = testdir.src_path("fixtures/upload");
    let output = datastep(&testdir)
        .arg("register")
        .arg(format!("--datastore=file:{}", store.display()))
        .args(["--uploaded_file_path_param", "uploads/run1/"])
        .args(["--uploaded_file_dataset", "out"])
        .expect_success();
    let stdout = output.stdout_str();
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("uploads/run1/b.csv"));
    assert!(lines.next().unwrap().ends_with("uploaded_file_data.csv"));
    assert!(output.stderr_str().contains("b.csv"));
    testdir.expect_file_contents("out/uploaded_file_data.csv", UPLOADED_CSV);

    // Our scratch directory is gone.
    let leftovers = fs::read_dir(testdir.path("tmp")).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[test]
fn register_from_default_datastore() {
    let testdir = TestDir::new("datastep", "register_from_default_datastore");
    let store = testdir.src_path("fixtures/upload");
    datastep(&testdir)
        .args(["config", "set", "default_datastore"])
        .arg(format!("file:{}", store.display()))
        .expect_success();
    for _ in 0..2 {
        datastep(&testdir)
            .args(["register", "--uploaded_file_path_param", "uploads/run1"])
            .args(["--uploaded_file_dataset", "out"])
            .expect_success();
        testdir.expect_file_contents("out/uploaded_file_data.csv", UPLOADED_CSV);
    }
}

#[test]
fn register_without_csv_fails_clearly() {
    let testdir = TestDir::new("datastep", "register_without_csv_fails_clearly");
    let store = testdir.path("store");
    fs::create_dir_all(store.join("uploads")).unwrap();
    fs::write(store.join("uploads/a.txt"), "not a table\n").unwrap();
    let output = datastep(&testdir)
        .arg("register")
        .arg(format!("--datastore=file:{}", store.display()))
        .args(["--uploaded_file_path_param", "uploads/"])
        .args(["--uploaded_file_dataset", "out"])
        .expect_failure();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stderr_str().contains("no file ending in \".csv\""));
    testdir.expect_no_such_path("out");
}

#[test]
fn register_rejects_empty_csv() {
    let testdir = TestDir::new("datastep", "register_rejects_empty_csv");
    let store = testdir.path("store");
    fs::create_dir_all(store.join("uploads")).unwrap();
    fs::write(store.join("uploads/b.csv"), "").unwrap();
    let output = datastep(&testdir)
        .arg("register")
        .arg(format!("--datastore=file:{}", store.display()))
        .args(["--uploaded_file_path_param", "uploads/"])
        .args(["--uploaded_file_dataset", "out"])
        .expect_failure();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stderr_str().contains("expected a header row"));
    testdir.expect_no_such_path("out");
}

#[test]
fn register_require_unique() {
    let testdir = TestDir::new("datastep", "register_require_unique");
    let store = testdir.path("store");
    fs::create_dir_all(store.join("uploads")).unwrap();
    fs::write(store.join("uploads/a.csv"), "id\n1\n").unwrap();
    fs::write(store.join("uploads/b.csv"), "id\n2\n").unwrap();
    let output = datastep(&testdir)
        .arg("register")
        .arg(format!("--datastore=file:{}", store.display()))
        .args(["--uploaded_file_path_param", "uploads/"])
        .args(["--uploaded_file_dataset", "out"])
        .arg("--require-unique")
        .expect_failure();
    assert!(output.stderr_str().contains("a.csv"));
    assert!(output.stderr_str().contains("b.csv"));
    testdir.expect_no_such_path("out");
}

#[test]
fn register_missing_argument_does_no_io() {
    let testdir = TestDir::new("datastep", "register_missing_argument_does_no_io");
    let store = testdir.src_path("fixtures/upload");
    let output = datastep(&testdir)
        .arg("register")
        .arg(format!("--datastore=file:{}", store.display()))
        .args(["--uploaded_file_dataset", "out"])
        .expect_failure();
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stderr_str().contains("--uploaded_file_path_param"));
    testdir.expect_no_such_path("out");
    testdir.expect_no_such_path("tmp");
    testdir.expect_no_such_path("config");
}

#[test]
fn register_rejects_unknown_datastore() {
    let testdir = TestDir::new("datastep", "register_rejects_unknown_datastore");
    let output = datastep(&testdir)
        .arg("register")
        .arg("--datastore=azure://container/")
        .args(["--uploaded_file_path_param", "uploads/"])
        .args(["--uploaded_file_dataset", "out"])
        .expect_failure();
    assert!(output.stderr_str().contains("unsupported datastore"));
}

#[test]
fn register_ignores_trailing_unknown_flags() {
    let testdir = TestDir::new("datastep", "register_ignores_trailing_unknown_flags");
    let store = testdir.src_path("fixtures/upload");
    datastep(&testdir)
        .arg("register")
        .arg(format!("--datastore=file:{}", store.display()))
        .args(["--uploaded_file_path_param", "uploads/run1/"])
        .args(["--uploaded_file_dataset", "out"])
        .args(["--AZUREML_RUN_ID", "abc"])
        .expect_success();
    testdir.expect_file_contents("out/uploaded_file_data.csv", UPLOADED_CSV);
}

//! Tests for the `config` subcommand.

use cli_test_dir::*;
use std::fs;

use super::datastep;

#[test]
fn config_set_and_unset() {
    let testdir = TestDir::new("datastep", "config_set_and_unset");
    fs::create_dir_all(testdir.path("config")).unwrap();
    fs::write(
        testdir.path("config/datastep.toml"),
        "# Where uploads land.\nscratch_dir = \"/var/tmp\"\n",
    )
    .unwrap();

    datastep(&testdir)
        .args(["config", "set", "default_datastore", "gs://bucket/root"])
        .expect_success();
    datastep(&testdir)
        .args(["config", "set", "inputs.uploaded_data", "/data/in.csv"])
        .expect_success();
    datastep(&testdir)
        .args(["config", "unset", "scratch_dir"])
        .expect_success();

    let config = fs::read_to_string(testdir.path("config/datastep.toml")).unwrap();
    assert!(config.contains("default_datastore = \"gs://bucket/root\""));
    assert!(config.contains("[inputs]"));
    assert!(config.contains("uploaded_data = \"/data/in.csv\""));
    assert!(!config.contains("scratch_dir"));
}

#[test]
fn config_rejects_unknown_key() {
    let testdir = TestDir::new("datastep", "config_rejects_unknown_key");
    let output = datastep(&testdir)
        .args(["config", "set", "temporary", "gs://bucket/"])
        .expect_failure();
    assert!(output.stderr_str().contains("temporary"));
    testdir.expect_no_such_path("config/datastep.toml");
}

#[test]
fn config_rejects_bad_datastore() {
    let testdir = TestDir::new("datastep", "config_rejects_bad_datastore");
    let output = datastep(&testdir)
        .args(["config", "set", "default_datastore", "ftp://host/"])
        .expect_failure();
    assert!(output.stderr_str().contains("unsupported datastore"));
    testdir.expect_no_such_path("config/datastep.toml");
}

//! Integration tests for the `datastep` binary.

use cli_test_dir::*;
use std::process::Command;

mod config;
mod process;
mod register;

/// Build a command which runs `datastep` inside `testdir`, isolated from the
/// user's configuration and environment.
pub(crate) fn datastep(testdir: &TestDir) -> Command {
    let mut cmd = testdir.cmd();
    cmd.env("DATASTEP_CONFIG_DIR", testdir.path("config"))
        .env("TMPDIR", testdir.path("tmp"))
        .env("RUST_LOG", "warn,datastep=debug")
        .env_remove("DATASTEP_DEFAULT_DATASTORE")
        .env_remove("DATASTEP_INPUT_UPLOADED_DATA")
        .env_remove("DATASTEP_RUN_ID")
        .env_remove("DATASTEP_LOG_FORMAT");
    cmd
}

#[test]
fn help_flag() {
    let testdir = TestDir::new("datastep", "help_flag");
    let output = datastep(&testdir).arg("--help").expect_success();
    assert!(output.stdout_str().contains("datastep"));
    assert!(output.stdout_str().contains("register"));
    assert!(output.stdout_str().contains("process"));
}

#[test]
fn version_flag() {
    let testdir = TestDir::new("datastep", "version_flag");
    let output = datastep(&testdir).arg("--version").expect_success();
    assert!(output.stdout_str().contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn json_log_format() {
    let testdir = TestDir::new("datastep", "json_log_format");
    let src = testdir.src_path("fixtures/example.csv");
    let output = datastep(&testdir)
        .env("DATASTEP_LOG_FORMAT", "json")
        .args(["process", "--processed_dataset", "out"])
        .arg(format!("--input=uploaded_data={}", src.display()))
        .expect_success();
    let first_line = output.stderr_str().lines().next().unwrap_or("");
    assert!(first_line.starts_with('{'), "not JSON: {:?}", first_line);
}

#[test]
fn unknown_log_format_fails() {
    let testdir = TestDir::new("datastep", "unknown_log_format_fails");
    let output = datastep(&testdir)
        .env("DATASTEP_LOG_FORMAT", "xml")
        .args(["config", "set", "scratch_dir", "/tmp"])
        .expect_failure();
    assert!(output.stderr_str().contains("xml"));
}

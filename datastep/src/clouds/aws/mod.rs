//! Wrappers for `aws` CLI commands.
//!
//! We rely on the `aws` tool's own credential chain (environment variables,
//! profiles, instance roles).

use std::{ffi::OsString, path::Path, process::Stdio};
use tokio::process::Command;

use crate::common::*;

/// Create a new `tokio::process::Command` that invokes `aws s3`.
fn aws_s3_command() -> Command {
    let mut command = Command::new("aws");
    command.arg("s3");
    command
}

/// Build the `aws s3 cp` arguments that copy every object under `root` whose
/// relative name starts with `prefix` into `dest`.
///
/// `aws` filters are globs, so a `prefix` containing `*`, `?` or `[` matches
/// more than a plain prefix would.
fn cp_prefix_args(root: &Url, prefix: &str, dest: &Path) -> Vec<OsString> {
    vec![
        "cp".into(),
        root.as_str().into(),
        dest.as_os_str().to_owned(),
        "--recursive".into(),
        "--only-show-errors".into(),
        "--exclude".into(),
        "*".into(),
        "--include".into(),
        format!("{}*", prefix).into(),
    ]
}

/// Copy every object under the `s3://` URL `root` whose name relative to
/// `root` starts with `prefix` into `dest`, keeping relative paths.
#[instrument(level = "trace", skip(dest), fields(dest = %dest.display()))]
pub(crate) async fn download_prefix(root: &Url, prefix: &str, dest: &Path) -> Result<()> {
    debug!("downloading {}{} using `aws s3 cp`", root, prefix);
    let status = aws_s3_command()
        .args(cp_prefix_args(root, prefix, dest))
        .stdin(Stdio::null())
        .status()
        .await
        .context("error running `aws s3 cp`")?;
    if status.success() {
        Ok(())
    } else {
        Err(format_err!(
            "`aws s3 cp {}` failed with {}",
            root,
            status,
        ))
    }
}

#[test]
fn cp_prefix_args_filter_by_prefix() {
    let root = "s3://bucket/data/".parse::<Url>().unwrap();
    let args = cp_prefix_args(&root, "uploads/run1", Path::new("/tmp/scratch"));
    let args = args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(
        args,
        vec![
            "cp",
            "s3://bucket/data/",
            "/tmp/scratch",
            "--recursive",
            "--only-show-errors",
            "--exclude",
            "*",
            "--include",
            "uploads/run1*",
        ],
    );
}

//! Command parsing.

use clap::Parser;
use std::path::{Path, PathBuf};

use crate::common::*;
use crate::config::Configuration;
use crate::table::Table;

pub(crate) mod config;
pub(crate) mod process;
pub(crate) mod register;

/// Command-line options, parsed using `clap`.
#[derive(Debug, Parser)]
#[clap(
    name = "datastep",
    version,
    about = "Pipeline steps for registering and processing uploaded tabular data."
)]
pub(crate) struct Opt {
    /// An identifier for this pipeline run, used in logs.
    #[clap(long = "run-id", env = "DATASTEP_RUN_ID", global = true)]
    pub(crate) run_id: Option<String>,

    /// The command to run.
    #[clap(subcommand)]
    pub(crate) cmd: Command,
}

/// The command to run.
#[derive(Debug, Parser)]
pub(crate) enum Command {
    /// Update configuration.
    #[clap(name = "config")]
    Config {
        #[clap(flatten)]
        command: config::Opt,
    },

    /// Add a derived column to the `uploaded_data` input dataset.
    #[clap(name = "process")]
    #[clap(after_help = r#"EXAMPLE INPUT LOCATORS:
    /mnt/inputs/uploaded_data.csv
    /mnt/inputs/uploaded_data/
    gs://bucket/datasets/uploaded_data/
"#)]
    Process {
        #[clap(flatten)]
        command: process::Opt,
    },

    /// Download an uploaded file and re-write it as a normalized CSV.
    #[clap(name = "register")]
    #[clap(after_help = r#"EXAMPLE DATASTORE LOCATORS:
    gs://bucket/
    s3://bucket/workspace/
    file:/mnt/datastore
"#)]
    Register {
        #[clap(flatten)]
        command: register::Opt,
    },
}

/// Run the command specified by `opt`.
pub(crate) fn run(config: Configuration, opt: Opt) -> BoxFuture<()> {
    let Opt { run_id, cmd } = opt;
    match cmd {
        Command::Config { command } => config::run(config, command).boxed(),
        Command::Process { command } => async move {
            let ctx = RunContext::from_config(&config, run_id)?;
            process::run(ctx, command).await
        }
        .boxed(),
        Command::Register { command } => async move {
            let ctx = RunContext::from_config(&config, run_id)?;
            register::run(ctx, command).await
        }
        .boxed(),
    }
}

/// Write `table` to `dir/file_name`, creating `dir` if needed, and return the
/// path we wrote.
pub(crate) async fn write_output(
    table: Table,
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    let dir = dir.to_owned();
    let path = dir.join(file_name);
    let out_path = path.clone();
    spawn_blocking(move || {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("cannot create output directory {}", dir.display()))?;
        table.write_csv_path(&path)
    })
    .await?;
    info!("wrote {}", out_path.display());
    Ok(out_path)
}

/// Log any extra arguments the pipeline platform passed us.
pub(crate) fn ignore_platform_args(args: &[String]) {
    if !args.is_empty() {
        debug!("ignoring platform arguments {:?}", args);
    }
}

#[test]
fn opt_definition_is_valid() {
    use clap::CommandFactory;
    Opt::command().debug_assert();
}

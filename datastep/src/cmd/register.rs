//! The `register` subcommand.

use clap::Parser;
use std::path::{Path, PathBuf};

use super::{ignore_platform_args, write_output};
use crate::common::*;
use crate::datastore::DatastoreLocator;
use crate::locate::{locate_csv, LocatePolicy};
use crate::table::Table;

/// The file we write to the output directory.
pub(crate) const OUTPUT_FILE_NAME: &str = "uploaded_file_data.csv";

/// Registration arguments.
#[derive(Debug, Parser)]
pub(crate) struct Opt {
    /// The path prefix of the uploaded file in the datastore. May also be a
    /// full `gs://` or `s3://` URL.
    #[clap(long = "uploaded_file_path_param", value_name = "PREFIX")]
    uploaded_file_path_param: String,

    /// The directory to write `uploaded_file_data.csv` to.
    #[clap(long = "uploaded_file_dataset", value_name = "DIR")]
    uploaded_file_dataset: PathBuf,

    /// The datastore to download from, overriding the run context.
    #[clap(long = "datastore", value_name = "LOCATOR")]
    datastore: Option<DatastoreLocator>,

    /// Fail if more than one CSV file is found, instead of using the first.
    #[clap(long = "require-unique")]
    require_unique: bool,

    /// Extra arguments supplied by the pipeline platform. Anything we don't
    /// recognize, from the first unknown flag onwards, ends up here.
    #[clap(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 1..,
        hide = true
    )]
    platform_args: Vec<String>,
}

/// Run the registration step.
pub(crate) async fn run(mut ctx: RunContext, opt: Opt) -> Result<()> {
    ignore_platform_args(&opt.platform_args);
    if let Some(datastore) = opt.datastore {
        ctx.set_default_datastore(datastore);
    }
    let policy = if opt.require_unique {
        LocatePolicy::RequireUnique
    } else {
        LocatePolicy::FirstMatch
    };
    let registered = register(
        &ctx,
        &opt.uploaded_file_path_param,
        &opt.uploaded_file_dataset,
        policy,
    )
    .await?;
    println!("{}", registered.uploaded_file.display());
    println!("{}", registered.output.display());
    Ok(())
}

/// What [`register`] found and wrote.
#[derive(Debug)]
pub(crate) struct Registered {
    /// The CSV file we used, relative to the datastore root.
    pub(crate) uploaded_file: PathBuf,
    /// The file we wrote.
    pub(crate) output: PathBuf,
}

/// Download everything under `prefix`, find the uploaded CSV file, and write
/// it to `output_dir`.
#[instrument(level = "debug", skip(ctx), fields(run_id = %ctx.run_id()))]
pub(crate) async fn register(
    ctx: &RunContext,
    prefix: &str,
    output_dir: &Path,
    policy: LocatePolicy,
) -> Result<Registered> {
    let (datastore, prefix) = match DatastoreLocator::split_object_url(prefix)? {
        Some((datastore, prefix)) => (datastore, prefix),
        None => (ctx.default_datastore()?.clone(), prefix.to_owned()),
    };

    // Dropping `scratch` deletes it, even if we fail below.
    let scratch = ctx.scratch_dir()?;
    let store = datastore.connect().await?;
    let downloaded = store
        .download_prefix(&prefix, scratch.path())
        .await
        .with_context(|| format!("could not download {:?} from {}", prefix, datastore))?;
    info!(
        "downloaded {} files under {:?} from {}",
        downloaded.len(),
        prefix,
        datastore,
    );

    let root = scratch.path().to_owned();
    let (uploaded_file, table) = spawn_blocking(move || {
        let csv_path = locate_csv(&root, policy)?;
        let rel_path = csv_path
            .strip_prefix(&root)
            .unwrap_or(csv_path.as_path())
            .to_owned();
        info!("found uploaded file {}", rel_path.display());
        let table = Table::read_csv_path(&csv_path)?;
        Ok((rel_path, table))
    })
    .await?;

    let output = write_output(table, output_dir, OUTPUT_FILE_NAME).await?;
    scratch.close()?;
    Ok(Registered {
        uploaded_file,
        output,
    })
}

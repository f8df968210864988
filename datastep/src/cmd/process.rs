//! The `process` subcommand.

use clap::Parser;
use std::path::{Path, PathBuf};

use super::{ignore_platform_args, write_output};
use crate::common::*;
use crate::table::Table;

/// The input dataset we process.
pub(crate) const INPUT_DATASET: &str = "uploaded_data";

/// The file we write to the output directory.
pub(crate) const OUTPUT_FILE_NAME: &str = "processed_dataset.csv";

/// The name of the column we derive.
pub(crate) const NEW_COLUMN: &str = "NewColumn";

/// The value of every cell in [`NEW_COLUMN`].
pub(crate) const NEW_COLUMN_VALUE: &str = "Hello world";

/// Processing arguments.
#[derive(Debug, Parser)]
pub(crate) struct Opt {
    /// The directory to write `processed_dataset.csv` to.
    #[clap(long = "processed_dataset", value_name = "DIR")]
    processed_dataset: PathBuf,

    /// Point an input dataset at a locator, overriding the run context.
    #[clap(long = "input", value_name = "NAME=LOCATOR", value_parser = parse_named_input)]
    inputs: Vec<(String, String)>,

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

/// Parse a `NAME=LOCATOR` pair.
fn parse_named_input(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((name, locator)) if !name.is_empty() && !locator.is_empty() => {
            Ok((name.to_owned(), locator.to_owned()))
        }
        _ => Err(format_err!("expected NAME=LOCATOR, found {:?}", s)),
    }
}

/// Run the processing step.
pub(crate) async fn run(mut ctx: RunContext, opt: Opt) -> Result<()> {
    ignore_platform_args(&opt.platform_args);
    for (name, locator) in &opt.inputs {
        ctx.set_input(name, locator);
    }
    let path = process(&ctx, &opt.processed_dataset).await?;
    println!("{}", path.display());
    Ok(())
}

/// Load our input dataset, derive our new column, and write the result to
/// `output_dir`. Returns the path of the file we wrote.
#[instrument(level = "debug", skip(ctx), fields(run_id = %ctx.run_id()))]
pub(crate) async fn process(ctx: &RunContext, output_dir: &Path) -> Result<PathBuf> {
    let mut table = ctx.load_input(INPUT_DATASET).await?;
    add_derived_column(&mut table);
    write_output(table, output_dir, OUTPUT_FILE_NAME).await
}

/// Add our derived column to `table`.
pub(crate) fn add_derived_column(table: &mut Table) {
    table.set_constant_column(NEW_COLUMN, NEW_COLUMN_VALUE);
}

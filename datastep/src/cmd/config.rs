//! The `config` subcommand.

use clap::Parser;

use crate::common::*;
use crate::config::{Configuration, Key};

/// Configuration-editing arguments.
#[derive(Debug, Parser)]
pub(crate) struct Opt {
    /// The command to perform on the configuration key.
    #[clap(subcommand)]
    command: Command,
}

/// Shared options that specify a key.
#[derive(Debug, Parser)]
pub(crate) struct KeyOpt {
    /// The configuration key to operate on [values: default_datastore,
    /// scratch_dir, inputs.NAME].
    key: Key,
}

/// A command that we can perform on a config key.
#[derive(Debug, Parser)]
pub(crate) enum Command {
    /// Set the configuration key to the specified value.
    #[clap(name = "set")]
    Set {
        #[clap(flatten)]
        key: KeyOpt,

        /// The new value.
        value: String,
    },

    /// Remove the configuration key, if present.
    #[clap(name = "unset")]
    Unset {
        #[clap(flatten)]
        key: KeyOpt,
    },
}

/// Edit our config file.
pub(crate) async fn run(mut config: Configuration, opt: Opt) -> Result<()> {
    match &opt.command {
        Command::Set { key, value } => {
            if key.key == Key::DefaultDatastore {
                // Catch typos now, not when the pipeline runs.
                value.parse::<crate::datastore::DatastoreLocator>()?;
            }
            config.set_string(&key.key, value)?;
        }
        Command::Unset { key } => {
            config.remove(&key.key)?;
        }
    }
    spawn_blocking(move || config.write()).await
}

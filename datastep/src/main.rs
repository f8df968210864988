//! Pipeline steps for registering and processing uploaded tabular data.

#![warn(rust_2018_idioms, unused_extern_crates, clippy::all)]

use clap::Parser;
use std::process;

use crate::common::*;

mod clouds;
mod cmd;
mod config;
mod datastore;
mod locate;
mod logging;
mod run_context;
mod scratch;
mod table;
mod tokio_glue;
mod wait;

/// Definitions included by all the files in this crate.
///
/// This forms the dialect of Rust we use for implementing our steps and
/// datastores, with an emphasis on `tokio` and structured logging.
#[allow(unused_imports)]
pub(crate) mod common {
    pub(crate) use anyhow::{format_err, Context as _, Error, Result};
    pub(crate) use futures::{Future, FutureExt, Stream, StreamExt, TryStreamExt};
    pub(crate) use tracing::{
        debug, debug_span, error, info, instrument, trace, trace_span, warn,
        Instrument,
    };
    pub(crate) use url::Url;

    pub(crate) use crate::{
        run_context::RunContext,
        tokio_glue::{spawn_blocking, BoxFuture},
    };
}

#[tokio::main]
async fn main() {
    // Parse our arguments before doing anything else, so that a missing
    // argument never touches the network or the file system.
    let opt = cmd::Opt::parse();

    if let Err(err) = logging::init_from_env() {
        eprintln!("could not set up logging: {:?}", err);
        process::exit(1);
    }

    // Our `reqwest` build leaves the choice of crypto provider to us.
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        debug!("a rustls crypto provider was already installed");
    }

    debug!("{:?}", opt);
    let result = match config::Configuration::try_default() {
        Ok(config) => cmd::run(config, opt).await,
        Err(err) => Err(err),
    };
    if let Err(err) = result {
        eprintln!("ERROR: {:?}", err);
        process::exit(1);
    }
}

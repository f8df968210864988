//! Support for structured logging.

use std::{
    env,
    io::{self, IsTerminal},
    str::FromStr,
};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::common::*;

/// The filter we use when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "warn,datastep=info";

/// What log format we should use.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub(crate) enum LogFormat {
    /// Human-readable logs.
    #[default]
    Pretty,
    /// JSON records, one per line. Handy for pipeline log collectors.
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format_err!("unknown log format: {}", s)),
        }
    }
}

/// Install a global `tracing` subscriber writing to standard error, configured
/// by `RUST_LOG` and `DATASTEP_LOG_FORMAT`.
pub(crate) fn init_from_env() -> Result<()> {
    let format = match env::var("DATASTEP_LOG_FORMAT") {
        Ok(s) => s.parse::<LogFormat>()?,
        Err(_) => LogFormat::default(),
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);
    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|err| format_err!("could not install tracing subscriber: {}", err))
}

#[test]
fn parse_log_format() {
    assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
    assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert!("indented".parse::<LogFormat>().is_err());
}

//! Logging initialization

use std::fs::File;
use std::path::Path;

use ferry_core::FerryError;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "ferry=info,ferry_core=info";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging(log_file: Option<&Path>) -> Result<(), FerryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|e| FerryError::Config(format!("failed to create log filter: {e}")))?;

    match log_file {
        Some(path) => init_file_logging(path, env_filter),
        None => {
            init_stderr_logging(env_filter);
            Ok(())
        }
    }
}

fn init_stderr_logging(env_filter: EnvFilter) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// JSON lines, one object per event, no colours.
fn init_file_logging(log_path: &Path, env_filter: EnvFilter) -> Result<(), FerryError> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| FerryError::Config(format!("cannot open log file {}: {e}", log_path.display())))?;

    let fmt_layer = fmt::layer()
        .with_writer(file)
        .with_target(true)
        .with_ansi(false)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}

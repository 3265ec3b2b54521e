use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a poll cycle.
///
/// Everything here is fatal: the process must exit so an operator looks at
/// it. Recoverable conditions (log not written yet, copy tool exited
/// non-zero, tracked file vanished) are outcomes, not errors.
#[derive(Debug, Error)]
pub enum FerryError {
    #[error("queue file {path} exists but cannot be read: {source}")]
    QueueUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("queue file {path} is not a valid queue: {source}")]
    QueueCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("queue file {path} cannot be written: {source}")]
    QueueUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("copy tool `{tool}` cannot be started: {detail}")]
    ToolUnavailable { tool: String, detail: String },

    #[error("unknown instrument `{0}`")]
    UnknownInstrument(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

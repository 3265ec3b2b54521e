//! Transport port - moves a closed raw file to the remote archive.

use std::path::Path;

use async_trait::async_trait;

/// Result of one transfer attempt.
///
/// The executor's retry/terminal logic depends only on this, not on the
/// tool behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The file is on the remote side.
    Delivered,

    /// The tool ran and failed (network, remote disk, auth). Retry next cycle.
    RemoteFailure { detail: String },

    /// The tool could not be started at all. Deployment defect; fatal.
    ToolUnavailable { detail: String },
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Name used in diagnostics (e.g. the tool path).
    fn name(&self) -> &str;

    async fn transfer(&self, local_path: &Path) -> TransferOutcome;
}

//! TransferExecutor - closed entries → remote archive.
//!
//! # Outcomes per `Closed` entry
//! - local file gone → `Done`, `transfer_ok = false` (never retried)
//! - tool cannot start → abort the cycle with `FerryError::ToolUnavailable`
//! - tool exits non-zero → stays `Closed`, retried next cycle
//! - tool succeeds → `Done`, `transfer_ok = true`, `transferred_at = now`

use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{error, info, warn};

use crate::error::FerryError;
use crate::observability::TransferReport;
use crate::ports::{TransferOutcome, Transport};
use crate::queue::{EntryStatus, Queue, Transition};

pub struct TransferExecutor<'a> {
    transport: &'a dyn Transport,
}

impl<'a> TransferExecutor<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Attempt every `Closed` entry once.
    pub async fn run(&self, queue: &mut Queue, now: NaiveDateTime) -> Result<TransferReport, FerryError> {
        let mut report = TransferReport::default();

        for key in queue.keys_in(EntryStatus::Closed) {
            let Some(file) = queue.get(&key).map(|e| e.file_path().to_string()) else {
                continue;
            };

            if !Path::new(&file).exists() {
                // renamed or deleted by the user before we got to it
                warn!(key = %key, file = %file, "closed file not found on local disk; giving up on it");
                if let Err(e) = queue.apply(&key, Transition::Vanished { at: now }) {
                    warn!(error = %e, "could not mark entry as vanished");
                }
                report.vanished += 1;
                continue;
            }

            match self.transport.transfer(Path::new(&file)).await {
                TransferOutcome::Delivered => {
                    if let Err(e) = queue.apply(&key, Transition::Delivered { at: now }) {
                        warn!(error = %e, "could not mark entry as delivered");
                    }
                    info!(key = %key, file = %file, "file copied to remote server");
                    report.delivered += 1;
                }
                TransferOutcome::RemoteFailure { detail } => {
                    warn!(key = %key, file = %file, %detail, "secure copy failed; will retry next cycle");
                    report.failed += 1;
                }
                TransferOutcome::ToolUnavailable { detail } => {
                    error!(tool = self.transport.name(), %detail, "copy tool cannot be started");
                    return Err(FerryError::ToolUnavailable {
                        tool: self.transport.name().to_string(),
                        detail,
                    });
                }
            }
        }

        if report == TransferReport::default() {
            info!("no files currently ready for transfer");
        }
        Ok(report)
    }
}

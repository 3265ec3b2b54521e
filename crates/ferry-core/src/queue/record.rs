//! Queue entry: one tracked raw file.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{EntryStatus, Transition};

/// Rejected state change (the transition table has no such edge).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal transition `{transition}` from status `{from}`")]
pub struct TransitionError {
    pub from: EntryStatus,
    pub transition: Transition,
}

/// Durable record of one raw file's lifecycle.
///
/// Design:
/// - Fields are private; status only changes through `apply`, which
///   consults `EntryStatus::next`. A regressing update cannot be written.
/// - The serialized shape is the on-disk queue format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    #[serde(rename = "file")]
    file_path: String,

    status: EntryStatus,

    #[serde(rename = "opened")]
    opened_at: NaiveDateTime,

    #[serde(rename = "closed", default, skip_serializing_if = "Option::is_none")]
    closed_at: Option<NaiveDateTime>,

    #[serde(rename = "transferred", default, skip_serializing_if = "Option::is_none")]
    transferred_at: Option<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    transfer_ok: Option<bool>,
}

impl QueueEntry {
    /// New entry in `Open`.
    pub fn opened(file_path: impl Into<String>, opened_at: NaiveDateTime) -> Self {
        Self {
            file_path: file_path.into(),
            status: EntryStatus::Open,
            opened_at,
            closed_at: None,
            transferred_at: None,
            transfer_ok: None,
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn opened_at(&self) -> NaiveDateTime {
        self.opened_at
    }

    pub fn closed_at(&self) -> Option<NaiveDateTime> {
        self.closed_at
    }

    pub fn transferred_at(&self) -> Option<NaiveDateTime> {
        self.transferred_at
    }

    pub fn transfer_ok(&self) -> Option<bool> {
        self.transfer_ok
    }

    /// Advance the entry through the transition table.
    pub fn apply(&mut self, transition: Transition) -> Result<EntryStatus, TransitionError> {
        let next = self.status.next(&transition).ok_or_else(|| TransitionError {
            from: self.status,
            transition: transition.clone(),
        })?;

        match transition {
            Transition::StopAcquisition => {}
            Transition::Close { at } => self.closed_at = Some(at),
            Transition::Delivered { at } => {
                self.transferred_at = Some(at);
                self.transfer_ok = Some(true);
            }
            Transition::Vanished { at } => {
                // 転送はしていないが、retention の起点として時刻を残す
                self.transferred_at = Some(at);
                self.transfer_ok = Some(false);
            }
        }
        self.status = next;
        Ok(next)
    }
}

//! Entry state machine for the transfer queue.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a tracked raw file.
///
/// State transitions:
/// - Open -> AcquisitionStopped -> Closed -> Done
/// - Open -> Closed -> Done (instruments without a stop marker)
///
/// Status only moves forward. The wire names match the queue file written by
/// earlier deployments ("open", "acquisition stop", "closed", "done").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntryStatus {
    /// The instrument is writing the file.
    #[serde(rename = "open")]
    Open,

    /// Acquisition stopped; the file is not closed yet.
    #[serde(rename = "acquisition stop")]
    AcquisitionStopped,

    /// Closed and waiting for transfer.
    #[serde(rename = "closed")]
    Closed,

    /// Transferred, or abandoned because the file vanished.
    #[serde(rename = "done")]
    Done,
}

impl EntryStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, EntryStatus::Done)
    }

    /// Is the instrument still (possibly) writing this file?
    pub fn is_active(self) -> bool {
        matches!(self, EntryStatus::Open | EntryStatus::AcquisitionStopped)
    }

    /// Is this entry a candidate for the transfer executor?
    pub fn is_transferable(self) -> bool {
        matches!(self, EntryStatus::Closed)
    }

    /// Transition table.
    ///
    /// Returns the next status, or `None` when `transition` is not allowed
    /// from `self`. Every allowed pair moves strictly forward.
    pub fn next(self, transition: &Transition) -> Option<EntryStatus> {
        use EntryStatus::*;
        match (self, transition) {
            (Open, Transition::StopAcquisition) => Some(AcquisitionStopped),
            (Open | AcquisitionStopped, Transition::Close { .. }) => Some(Closed),
            (Closed, Transition::Delivered { .. } | Transition::Vanished { .. }) => Some(Done),
            _ => None,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryStatus::Open => "open",
            EntryStatus::AcquisitionStopped => "acquisition stop",
            EntryStatus::Closed => "closed",
            EntryStatus::Done => "done",
        };
        f.write_str(s)
    }
}

/// An input to the entry state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Acquisition stopped marker seen.
    StopAcquisition,

    /// Closed marker seen at `at`.
    Close { at: NaiveDateTime },

    /// Secure copy succeeded at `at`.
    Delivered { at: NaiveDateTime },

    /// The local file disappeared before it could be copied.
    Vanished { at: NaiveDateTime },
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Transition::StopAcquisition => "stop acquisition",
            Transition::Close { .. } => "close",
            Transition::Delivered { .. } => "delivered",
            Transition::Vanished { .. } => "vanished",
        };
        f.write_str(s)
    }
}

//! Lifecycle events: what the Log Reader hands to the state machine.

use std::fmt;

use chrono::NaiveDateTime;

/// Kind of a raw-file lifecycle event.
///
/// Which log text maps to which kind is instrument configuration
/// (see `crate::logs::MarkerTable`), not hardcoded here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The instrument created (opened) a raw file.
    Opened,

    /// Acquisition into the current raw file stopped.
    AcquisitionStopped,

    /// The raw file was closed and is safe to copy.
    Closed,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Opened => "opened",
            EventKind::AcquisitionStopped => "acquisition stopped",
            EventKind::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// One timestamped event parsed from an instrument log line.
///
/// Immutable once produced. `payload` is the log text after the timestamp,
/// which is where the filename of an `Opened` event is extracted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    timestamp: NaiveDateTime,
    kind: EventKind,
    payload: String,
}

impl LifecycleEvent {
    pub fn new(timestamp: NaiveDateTime, kind: EventKind, payload: impl Into<String>) -> Self {
        Self {
            timestamp,
            kind,
            payload: payload.into(),
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }
}

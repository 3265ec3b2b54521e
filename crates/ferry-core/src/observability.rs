use serde::{Deserialize, Serialize};

/// Queue size per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub open: usize,
    pub acquisition_stopped: usize,
    pub closed: usize,
    pub done: usize,
}

/// What the state machine did with one batch of events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceReport {
    pub opened: usize,
    pub stopped: usize,
    pub closed: usize,
    pub ignored: usize,
}

/// What the transfer executor did in one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    pub delivered: usize,
    pub failed: usize,
    pub vanished: usize,
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// `None` when no log was available and state advancement was skipped.
    pub advance: Option<AdvanceReport>,
    pub swept: usize,
    pub transfer: TransferReport,
    pub counts: QueueCounts,
}

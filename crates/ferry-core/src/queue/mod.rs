//! Queue module: entry state machine, durable store, retention sweep.

mod json_store;
mod record;
mod retention;
mod state;

pub use json_store::JsonQueueStore;
pub use record::{QueueEntry, TransitionError};
pub use retention::RetentionPolicy;
pub use state::{EntryStatus, Transition};

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::EntryKey;
use crate::error::FerryError;
use crate::observability::QueueCounts;

/// Failure to apply a transition to an addressed entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("no queue entry with key `{0}`")]
    UnknownKey(EntryKey),

    #[error("entry `{key}`: {source}")]
    Illegal {
        key: EntryKey,
        #[source]
        source: TransitionError,
    },
}

/// Mapping from key to entry: the whole persisted state of the system.
///
/// Design:
/// - `BTreeMap` keeps the file output stable (sorted keys), so saving the
///   same queue twice produces identical bytes.
/// - Entries are created with `insert_new` and mutated only with `apply`;
///   removal happens only through `RetentionPolicy::sweep`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Queue {
    entries: BTreeMap<EntryKey, QueueEntry>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &EntryKey) -> Option<&QueueEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &EntryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntryKey, &QueueEntry)> {
        self.entries.iter()
    }

    /// Insert a freshly opened entry. Returns `false` (and changes nothing)
    /// if the key is already tracked.
    pub fn insert_new(&mut self, key: EntryKey, entry: QueueEntry) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, entry);
        true
    }

    /// Apply a transition to the entry addressed by `key`.
    pub fn apply(&mut self, key: &EntryKey, transition: Transition) -> Result<EntryStatus, ApplyError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| ApplyError::UnknownKey(key.clone()))?;
        entry.apply(transition).map_err(|source| ApplyError::Illegal {
            key: key.clone(),
            source,
        })
    }

    /// Keys of all entries currently in `status`.
    pub fn keys_in(&self, status: EntryStatus) -> Vec<EntryKey> {
        self.entries
            .iter()
            .filter(|(_, e)| e.status() == status)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// The most recently opened entry (ties broken by key).
    pub fn last_opened(&self) -> Option<(&EntryKey, &QueueEntry)> {
        self.entries
            .iter()
            .max_by(|(ka, a), (kb, b)| a.opened_at().cmp(&b.opened_at()).then_with(|| ka.cmp(kb)))
    }

    /// Read watermark for the log reader: the latest open time on record.
    pub fn watermark(&self) -> Option<NaiveDateTime> {
        self.last_opened().map(|(_, e)| e.opened_at())
    }

    pub(crate) fn remove(&mut self, key: &EntryKey) -> Option<QueueEntry> {
        self.entries.remove(key)
    }

    pub fn counts(&self) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for entry in self.entries.values() {
            match entry.status() {
                EntryStatus::Open => counts.open += 1,
                EntryStatus::AcquisitionStopped => counts.acquisition_stopped += 1,
                EntryStatus::Closed => counts.closed += 1,
                EntryStatus::Done => counts.done += 1,
            }
        }
        counts
    }
}

/// Queue store port.
///
/// Load at the start of every cycle, save at the end. Both directions are
/// all-or-nothing: a failure is fatal and must not be papered over.
pub trait QueueStore: Send + Sync {
    /// Missing backing data is an empty queue; malformed data is an error.
    fn load(&self) -> Result<Queue, FerryError>;

    /// Replace the stored queue atomically.
    fn save(&self, queue: &Queue) -> Result<(), FerryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn insert_new_is_idempotent() {
        let mut q = Queue::new();
        let key = EntryKey::from_timestamp(ts(1));
        assert!(q.insert_new(key.clone(), QueueEntry::opened("a.raw", ts(1))));
        q.apply(&key, Transition::Close { at: ts(2) }).unwrap();

        assert!(!q.insert_new(key.clone(), QueueEntry::opened("other.raw", ts(1))));
        let e = q.get(&key).unwrap();
        assert_eq!(e.file_path(), "a.raw");
        assert_eq!(e.status(), EntryStatus::Closed);
    }

    #[test]
    fn apply_reports_unknown_key() {
        let mut q = Queue::new();
        let err = q
            .apply(&EntryKey::new("missing"), Transition::StopAcquisition)
            .unwrap_err();
        assert_eq!(err, ApplyError::UnknownKey(EntryKey::new("missing")));
    }

    #[test]
    fn apply_reports_illegal_transition() {
        let mut q = Queue::new();
        let key = EntryKey::new("a");
        q.insert_new(key.clone(), QueueEntry::opened("a.raw", ts(1)));
        let err = q.apply(&key, Transition::Delivered { at: ts(2) }).unwrap_err();
        assert!(matches!(err, ApplyError::Illegal { .. }));
        assert_eq!(q.get(&key).unwrap().status(), EntryStatus::Open);
    }

    #[test]
    fn watermark_is_latest_open_time() {
        let mut q = Queue::new();
        assert_eq!(q.watermark(), None);
        q.insert_new(EntryKey::new("b"), QueueEntry::opened("b.raw", ts(5)));
        q.insert_new(EntryKey::new("a"), QueueEntry::opened("a.raw", ts(2)));
        assert_eq!(q.watermark(), Some(ts(5)));
        assert_eq!(q.last_opened().unwrap().0, &EntryKey::new("b"));
    }

    #[test]
    fn counts_by_status() {
        let mut q = Queue::new();
        q.insert_new(EntryKey::new("a"), QueueEntry::opened("a.raw", ts(1)));
        q.insert_new(EntryKey::new("b"), QueueEntry::opened("b.raw", ts(2)));
        q.apply(&EntryKey::new("b"), Transition::Close { at: ts(3) }).unwrap();

        let c = q.counts();
        assert_eq!(c.open, 1);
        assert_eq!(c.closed, 1);
        assert_eq!(c.done, 0);
        assert_eq!(q.keys_in(EntryStatus::Closed), vec![EntryKey::new("b")]);
    }
}

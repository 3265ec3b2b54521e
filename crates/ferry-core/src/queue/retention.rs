//! Retention sweep: forget archived entries once they age out.

use chrono::{NaiveDateTime, TimeDelta};
use tracing::{debug, info};

use super::{EntryStatus, Queue, QueueEntry};
use crate::domain::EntryKey;

/// How long a `Done` entry is remembered after its transfer time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    window: TimeDelta,
}

impl RetentionPolicy {
    pub fn new(window: TimeDelta) -> Self {
        Self { window }
    }

    pub fn days(days: u32) -> Self {
        Self::new(TimeDelta::days(i64::from(days)))
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }

    /// `at` lies further back than the window.
    pub fn is_expired(&self, at: NaiveDateTime, now: NaiveDateTime) -> bool {
        now - at > self.window
    }

    /// Remove every `Done` entry whose transfer time is older than the window.
    ///
    /// Entries in any other status are never touched. A `Done` entry without
    /// a transfer time has no age and is kept.
    pub fn sweep(&self, queue: &mut Queue, now: NaiveDateTime) -> Vec<(EntryKey, QueueEntry)> {
        let expired: Vec<EntryKey> = queue
            .iter()
            .filter(|(_, e)| e.status() == EntryStatus::Done)
            .filter(|(key, e)| match e.transferred_at() {
                Some(at) => self.is_expired(at, now),
                None => {
                    debug!(key = %key, "done entry has no transfer time; keeping it");
                    false
                }
            })
            .map(|(k, _)| k.clone())
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for key in expired {
            if let Some(entry) = queue.remove(&key) {
                info!(
                    key = %key,
                    file = entry.file_path(),
                    transferred = ?entry.transferred_at(),
                    "removing aged-out entry from the done queue"
                );
                removed.push((key, entry));
            }
        }
        removed
    }
}

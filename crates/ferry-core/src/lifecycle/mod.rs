//! Lifecycle state machine - events → queue entry transitions.
//!
//! # フロー
//! 1. queue から「最後に open されたエントリ」を復元（まだ active なら追跡対象）
//! 2. イベントを timestamp 昇順に処理
//!    - Opened: 新しいエントリを Open で作成し、追跡対象を切り替える
//!    - AcquisitionStopped: 追跡対象を AcquisitionStopped へ
//!    - Closed: 追跡対象を Closed へ（closed_at を記録）、追跡を解除
//! 3. 対応するエントリが無いイベントは捨てる（エントリを捏造しない）

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::domain::{EntryKey, EventKind, LifecycleEvent};
use crate::logs::{InstrumentProfile, StagePolicy};
use crate::observability::AdvanceReport;
use crate::queue::{EntryStatus, Queue, QueueEntry, RetentionPolicy, Transition};

/// Applies one instrument's events to the queue.
pub struct LifecycleMachine<'a> {
    profile: &'a InstrumentProfile,
    retention: RetentionPolicy,
}

impl<'a> LifecycleMachine<'a> {
    /// `retention` also bounds how old an `Opened` event may be: anything
    /// older could belong to an entry the sweeper already forgot.
    pub fn new(profile: &'a InstrumentProfile, retention: RetentionPolicy) -> Self {
        Self { profile, retention }
    }

    /// The entry currently being written, if any: the last opened one,
    /// provided it has not been closed yet.
    pub fn active_entry(queue: &Queue) -> Option<EntryKey> {
        queue
            .last_opened()
            .filter(|(_, e)| e.status().is_active())
            .map(|(k, _)| k.clone())
    }

    /// Apply `events` (ascending by timestamp) to `queue`.
    pub fn advance(&self, queue: &mut Queue, events: &[LifecycleEvent], now: NaiveDateTime) -> AdvanceReport {
        let mut report = AdvanceReport::default();
        let mut active = Self::active_entry(queue);

        for event in events {
            let applied = match event.kind() {
                EventKind::Opened => self.on_opened(queue, &mut active, event, now),
                EventKind::AcquisitionStopped => self.on_stopped(queue, &active, event),
                EventKind::Closed => self.on_closed(queue, &mut active, event),
            };
            match (applied, event.kind()) {
                (false, _) => report.ignored += 1,
                (true, EventKind::Opened) => report.opened += 1,
                (true, EventKind::AcquisitionStopped) => report.stopped += 1,
                (true, EventKind::Closed) => report.closed += 1,
            }
        }
        report
    }

    fn on_opened(
        &self,
        queue: &mut Queue,
        active: &mut Option<EntryKey>,
        event: &LifecycleEvent,
        now: NaiveDateTime,
    ) -> bool {
        let ts = event.timestamp();
        if self.retention.is_expired(ts, now) {
            debug!(at = %ts, "ignoring open event older than the retention window");
            return false;
        }
        let Some(file) = self.profile.extract_filename(event) else {
            warn!(at = %ts, line = event.payload(), "open event without a file name; ignoring");
            return false;
        };
        let key = self.profile.key_for(ts, &file);

        if let Some(existing) = queue.get(&key) {
            // 同じキーの再 open は no-op。まだ書き込み中なら追跡だけ戻す
            debug!(key = %key, status = %existing.status(), "open event for a tracked entry");
            *active = existing.status().is_active().then(|| key.clone());
            return false;
        }

        if let Some(previous) = active.as_ref()
            && queue.get(previous).is_some_and(|e| e.status().is_active())
        {
            warn!(key = %previous, superseded_by = %key, "new file opened while previous one is still open");
        }

        queue.insert_new(key.clone(), QueueEntry::opened(file.clone(), ts));
        info!(key = %key, file = %file, "raw file opened");
        *active = Some(key);
        true
    }

    fn on_stopped(&self, queue: &mut Queue, active: &Option<EntryKey>, event: &LifecycleEvent) -> bool {
        let Some(key) = active else {
            debug!(at = %event.timestamp(), "acquisition stop without an open file; dropping");
            return false;
        };
        match queue.apply(key, Transition::StopAcquisition) {
            Ok(_) => {
                info!(key = %key, "acquisition stopped");
                true
            }
            Err(e) => {
                debug!(key = %key, error = %e, "acquisition stop ignored");
                false
            }
        }
    }

    fn on_closed(&self, queue: &mut Queue, active: &mut Option<EntryKey>, event: &LifecycleEvent) -> bool {
        let ts = event.timestamp();
        let Some(key) = active.clone() else {
            warn!(at = %ts, "close event without an open file; dropping");
            return false;
        };

        let status = queue.get(&key).map(QueueEntry::status);
        if self.profile.stages == StagePolicy::WithAcquisitionStop && status == Some(EntryStatus::Open) {
            warn!(key = %key, at = %ts, "close event before acquisition stop; ignoring");
            return false;
        }

        match queue.apply(&key, Transition::Close { at: ts }) {
            Ok(_) => {
                let file = queue.get(&key).map(|e| e.file_path().to_string()).unwrap_or_default();
                info!(key = %key, file = %file, "raw file closed");
                *active = None;
                true
            }
            Err(e) => {
                debug!(key = %key, error = %e, "close event ignored");
                *active = None;
                false
            }
        }
    }
}

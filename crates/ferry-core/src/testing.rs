//! Test doubles shared by unit tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::domain::LifecycleEvent;
use crate::logs::{LogRead, LogSource};
use crate::ports::{TransferOutcome, Transport};

/// Replays queued outcomes (then `Delivered`) and records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<TransferOutcome>>,
    calls: Mutex<Vec<PathBuf>>,
}

impl ScriptedTransport {
    pub fn new(outcomes: impl IntoIterator<Item = TransferOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn transfer(&self, local_path: &Path) -> TransferOutcome {
        self.calls.lock().unwrap().push(local_path.to_path_buf());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TransferOutcome::Delivered)
    }
}

/// Serves a fixed event list, honouring the watermark like a real source.
pub struct StaticLogSource {
    events: Option<Vec<LifecycleEvent>>,
}

impl StaticLogSource {
    pub fn events(events: Vec<LifecycleEvent>) -> Self {
        Self { events: Some(events) }
    }

    pub fn unavailable() -> Self {
        Self { events: None }
    }
}

#[async_trait]
impl LogSource for StaticLogSource {
    async fn read_after(&self, watermark: Option<NaiveDateTime>, _now: NaiveDateTime) -> LogRead {
        match &self.events {
            Some(events) => LogRead::Events(
                events
                    .iter()
                    .filter(|e| watermark.is_none_or(|w| e.timestamp() > w))
                    .cloned()
                    .collect(),
            ),
            None => LogRead::Unavailable {
                reason: "test source has no log".to_string(),
            },
        }
    }
}

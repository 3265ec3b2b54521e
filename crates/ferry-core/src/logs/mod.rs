//! Log Reader - instrument logs → ordered lifecycle events.
//!
//! # 構成
//! - **LogSource**: 読み取り戦略の port（watermark より新しいイベントを返す）
//! - **DailyLogSource**: 日次ローテーションのログ（昨日 + 今日を読む）
//! - **NewestLogSource**: パターンに一致するファイルのうち最新の 1 つを読む
//! - **InstrumentProfile**: マーカー表・ファイル名抽出・行フォーマット
//! - **OpenRetry**: ファイルが無いときの bounded retry

mod daily;
mod newest;
mod profile;
mod retry;

pub use daily::DailyLogSource;
pub use newest::NewestLogSource;
pub use profile::{
    FilenameRule, Instrument, InstrumentProfile, KeyScheme, LineFormat, LogLayout, MarkerTable,
    StagePolicy,
};
pub use retry::{Attempt, OpenRetry, RetryOutcome};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::domain::LifecycleEvent;

/// Result of reading a log source for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRead {
    /// Events strictly after the watermark, ascending by timestamp.
    Events(Vec<LifecycleEvent>),

    /// No log to read this cycle (not written yet, none found). Not fatal.
    Unavailable { reason: String },
}

/// Log reading strategy.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Read events with timestamp > `watermark` (all events if `None`).
    /// `now` decides what "today" is.
    async fn read_after(&self, watermark: Option<NaiveDateTime>, now: NaiveDateTime) -> LogRead;
}

/// Build the strategy named by the profile's layout.
pub fn source_for(
    profile: &InstrumentProfile,
    log_dir: impl Into<PathBuf>,
    retry: OpenRetry,
) -> Box<dyn LogSource> {
    let log_dir = log_dir.into();
    match &profile.layout {
        LogLayout::Daily { .. } => Box::new(DailyLogSource::new(profile.clone(), log_dir, retry)),
        LogLayout::Newest { .. } => Box::new(NewestLogSource::new(profile.clone(), log_dir, retry)),
    }
}

/// Probe used by the retry loop: read the whole file, or "not yet".
fn probe_file(path: &Path) -> Attempt<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Attempt::Ready(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Attempt::NotYet,
        Err(e) => {
            // e.g. the instrument holds the file locked
            warn!(path = %path.display(), error = %e, "cannot read log file");
            Attempt::NotYet
        }
    }
}

/// Parse raw bytes into events after the watermark.
///
/// Logs written on Windows are not guaranteed to be UTF-8; invalid bytes are
/// replaced rather than rejecting the whole file.
fn collect_events(
    profile: &InstrumentProfile,
    bytes: &[u8],
    file_date: Option<NaiveDate>,
    watermark: Option<NaiveDateTime>,
    out: &mut Vec<LifecycleEvent>,
) {
    let text = String::from_utf8_lossy(bytes);
    out.extend(
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| profile.parse_line(line, file_date))
            .filter(|event| watermark.is_none_or(|w| event.timestamp() > w)),
    );
}

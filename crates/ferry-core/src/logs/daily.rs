//! Strategy A: one log file per day.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use super::{
    InstrumentProfile, LogLayout, LogRead, LogSource, OpenRetry, RetryOutcome, collect_events,
    probe_file,
};

/// Reads yesterday's and today's log so a run spanning midnight is seen
/// whole.
///
/// - today missing after all retries → `Unavailable` (no log yet)
/// - yesterday missing after all retries → ignored (first day of running)
pub struct DailyLogSource {
    profile: InstrumentProfile,
    log_dir: PathBuf,
    retry: OpenRetry,
}

impl DailyLogSource {
    pub fn new(profile: InstrumentProfile, log_dir: impl Into<PathBuf>, retry: OpenRetry) -> Self {
        Self {
            profile,
            log_dir: log_dir.into(),
            retry,
        }
    }

    /// Path of the log written on `date`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        let name = match &self.profile.layout {
            LogLayout::Daily {
                file_name,
                date_format,
            } => file_name.replace("{date}", &date.format(date_format).to_string()),
            // newest-style names read one day at a time: `<prefix><date>`
            LogLayout::Newest { prefix, date_format } => {
                format!("{prefix}{}", date.format(date_format))
            }
        };
        self.log_dir.join(name)
    }
}

#[async_trait]
impl LogSource for DailyLogSource {
    async fn read_after(&self, watermark: Option<NaiveDateTime>, now: NaiveDateTime) -> LogRead {
        let today = now.date();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);

        let mut events = Vec::new();
        for date in [yesterday, today] {
            let path = self.path_for(date);
            let what = format!("log file {}", path.display());
            match self.retry.run(&what, || probe_file(&path)).await {
                RetryOutcome::Ready(bytes) => {
                    let before = events.len();
                    collect_events(&self.profile, &bytes, Some(date), watermark, &mut events);
                    info!(
                        path = %path.display(),
                        new_events = events.len() - before,
                        "read log file for {date}"
                    );
                }
                RetryOutcome::Exhausted { .. } if date == today => {
                    return LogRead::Unavailable {
                        reason: format!("no log file for {date} yet ({})", path.display()),
                    };
                }
                RetryOutcome::Exhausted { .. } => {
                    debug!(path = %path.display(), "no log file for yesterday; assuming first run");
                }
            }
        }

        events.sort_by_key(|e| e.timestamp());
        LogRead::Events(events)
    }
}

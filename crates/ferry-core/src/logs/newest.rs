//! Strategy B: the youngest of many log files matching a name pattern.

use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use super::{
    Attempt, InstrumentProfile, LogLayout, LogRead, LogSource, OpenRetry, RetryOutcome,
    collect_events,
};

/// Reads the log file with the smallest age in days among those named
/// `<prefix><date>...`.
///
/// The age comes from the date embedded in the file name; files whose name
/// carries no parsable date fall back to their modification time.
pub struct NewestLogSource {
    profile: InstrumentProfile,
    log_dir: PathBuf,
    prefix: String,
    date_format: String,
    retry: OpenRetry,
}

impl NewestLogSource {
    pub fn new(profile: InstrumentProfile, log_dir: impl Into<PathBuf>, retry: OpenRetry) -> Self {
        let (prefix, date_format) = match &profile.layout {
            LogLayout::Newest {
                prefix,
                date_format,
            } => (prefix.clone(), date_format.clone()),
            LogLayout::Daily {
                file_name,
                date_format,
            } => {
                let prefix = file_name.split("{date}").next().unwrap_or_default();
                (prefix.to_string(), date_format.clone())
            }
        };
        Self {
            profile,
            log_dir: log_dir.into(),
            prefix,
            date_format,
            retry,
        }
    }

    fn pattern(&self) -> String {
        let dir = glob::Pattern::escape(&self.log_dir.to_string_lossy());
        let prefix = glob::Pattern::escape(&self.prefix);
        format!("{dir}/{prefix}*")
    }

    fn candidates(&self) -> Vec<PathBuf> {
        match glob::glob(&self.pattern()) {
            Ok(paths) => paths.filter_map(Result::ok).filter(|p| p.is_file()).collect(),
            Err(e) => {
                warn!(pattern = %self.pattern(), error = %e, "invalid log file pattern");
                Vec::new()
            }
        }
    }

    /// Date a log file belongs to: embedded in the name, else its mtime.
    fn file_date(&self, path: &Path) -> Option<NaiveDate> {
        let name = path.file_name()?.to_string_lossy();
        if let Some(rest) = name.strip_prefix(self.prefix.as_str())
            && let Ok((date, _)) = NaiveDate::parse_and_remainder(rest, &self.date_format)
        {
            return Some(date);
        }
        let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
        Some(DateTime::<Local>::from(modified).date_naive())
    }

    /// Pick the youngest file; among equally old ones the last by name.
    pub fn select(&self, candidates: &[PathBuf], today: NaiveDate) -> Option<(PathBuf, i64)> {
        candidates
            .iter()
            .filter_map(|p| {
                let age = (today - self.file_date(p)?).num_days();
                Some((p.clone(), age))
            })
            .min_by_key(|(p, age)| (*age, Reverse(p.clone())))
    }
}

#[async_trait]
impl LogSource for NewestLogSource {
    async fn read_after(&self, watermark: Option<NaiveDateTime>, now: NaiveDateTime) -> LogRead {
        let what = format!("log file matching {}", self.pattern());
        let found = self
            .retry
            .run(&what, || {
                let found = self.candidates();
                if found.is_empty() { Attempt::NotYet } else { Attempt::Ready(found) }
            })
            .await;

        let candidates = match found {
            RetryOutcome::Ready(c) => c,
            RetryOutcome::Exhausted { .. } => {
                return LogRead::Unavailable {
                    reason: format!("no log file found matching {}", self.pattern()),
                };
            }
        };

        let Some((path, age)) = self.select(&candidates, now.date()) else {
            return LogRead::Unavailable {
                reason: format!("no datable log file among {} candidates", candidates.len()),
            };
        };
        info!(path = %path.display(), age_days = age, "newest log file selected");

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                return LogRead::Unavailable {
                    reason: format!("cannot read {}: {e}", path.display()),
                };
            }
        };

        let mut events = Vec::new();
        collect_events(&self.profile, &bytes, None, watermark, &mut events);
        events.sort_by_key(|e| e.timestamp());
        info!(path = %path.display(), new_events = events.len(), "read log file");
        LogRead::Events(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventKind;
    use std::time::Duration;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2012, 4, 25)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn source(dir: &TempDir) -> NewestLogSource {
        NewestLogSource::new(
            InstrumentProfile::q_exactive(),
            dir.path(),
            OpenRetry::new(2, Duration::ZERO),
        )
    }

    const TODAY_LOG: &str = "\
[Time=2012-04-25 09:00:00.100+02:00] Starting acquisition: Xcalibur will write D:\\data\\b.raw (and may add date/time to the name)
[Time=2012-04-25 09:30:00.000+02:00] Stopping acquisition
[Time=2012-04-25 09:30:05.500+02:00] Storing acquisition scan
[Time=2012-04-25 09:31:00.000+02:00] Instrument idle
";

    #[test]
    fn selects_youngest_by_embedded_date() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("Thermo Exactive--2012-04-20 08-00-00.log");
        let young = dir.path().join("Thermo Exactive--2012-04-24 07-00-00.log");
        fs::write(&old, "").unwrap();
        fs::write(&young, "").unwrap();

        let s = source(&dir);
        let (picked, age) = s.select(&[old, young.clone()], now().date()).unwrap();
        assert_eq!(picked, young);
        assert_eq!(age, 1);
    }

    #[test]
    fn undated_names_fall_back_to_mtime() {
        let dir = TempDir::new().unwrap();
        let undated = dir.path().join("Thermo Exactive--current.log");
        fs::write(&undated, "").unwrap();

        let s = source(&dir);
        let today = Local::now().date_naive();
        let (picked, age) = s.select(&[undated.clone()], today).unwrap();
        assert_eq!(picked, undated);
        assert_eq!(age, 0);
    }

    #[tokio::test]
    async fn reads_events_from_newest_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Thermo Exactive--2012-04-20 08-00-00.log"),
            "[Time=2012-04-20 08:00:00.000+02:00] Storing acquisition scan\n",
        )
        .unwrap();
        fs::write(dir.path().join("Thermo Exactive--2012-04-25 08-00-00.log"), TODAY_LOG).unwrap();
        fs::write(dir.path().join("unrelated.log"), "").unwrap();

        let LogRead::Events(events) = source(&dir).read_after(None, now()).await else {
            panic!("expected events");
        };
        let kinds: Vec<_> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Opened, EventKind::AcquisitionStopped, EventKind::Closed]
        );
    }

    #[tokio::test]
    async fn watermark_filters_old_lines() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Thermo Exactive--2012-04-25 08-00-00.log"), TODAY_LOG).unwrap();

        let watermark = NaiveDateTime::parse_from_str("2012-04-25 09:00:00.100", "%Y-%m-%d %H:%M:%S%.f").ok();
        let LogRead::Events(events) = source(&dir).read_after(watermark, now()).await else {
            panic!("expected events");
        };
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), EventKind::AcquisitionStopped);
    }

    #[tokio::test]
    async fn no_candidates_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let read = source(&dir).read_after(None, now()).await;
        assert!(matches!(read, LogRead::Unavailable { .. }));
    }
}

//! Instrument profiles: everything that differs between instrument types.
//!
//! Adding an instrument means supplying a profile (marker table, filename
//! rule, line format, log layout, stage policy), either as a built-in below
//! or as a `[profile]` table in the config file.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::{EntryKey, EventKind, LifecycleEvent};
use crate::error::FerryError;

/// Literal log text → event kind. First matching marker wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerTable {
    pub opened: String,

    /// Absent for instruments that never log an acquisition stop.
    #[serde(default)]
    pub acquisition_stopped: Option<String>,

    pub closed: String,
}

impl MarkerTable {
    pub fn classify(&self, text: &str) -> Option<EventKind> {
        if text.contains(self.opened.as_str()) {
            return Some(EventKind::Opened);
        }
        if let Some(stop) = &self.acquisition_stopped
            && text.contains(stop.as_str())
        {
            return Some(EventKind::AcquisitionStopped);
        }
        if text.contains(self.closed.as_str()) {
            return Some(EventKind::Closed);
        }
        None
    }
}

/// How to pull the raw file path out of an `Opened` event's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum FilenameRule {
    /// Everything after the first `delimiter`, trimmed.
    AfterDelimiter { delimiter: String },

    /// The text between `start` and the next `end`.
    Between { start: String, end: String },
}

impl FilenameRule {
    pub fn extract(&self, text: &str) -> Option<String> {
        let name = match self {
            FilenameRule::AfterDelimiter { delimiter } => text.split_once(delimiter.as_str())?.1,
            FilenameRule::Between { start, end } => {
                let from = text.find(start.as_str())? + start.len();
                let rest = &text[from..];
                &rest[..rest.find(end.as_str())?]
            }
        };
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// Where the timestamp sits in a log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "kebab-case")]
pub enum LineFormat {
    /// `<time><separator><text>`; the date comes from the log file name.
    TimeOfDay { separator: String, time_format: String },

    /// `[<field>=<datetime><offset>] <text>`; any UTC offset is ignored.
    Bracketed { timestamp_format: String },
}

impl LineFormat {
    /// Split a line into (timestamp, text). `None` for lines without one.
    pub fn parse(&self, line: &str, file_date: Option<NaiveDate>) -> Option<(NaiveDateTime, String)> {
        match self {
            LineFormat::TimeOfDay {
                separator,
                time_format,
            } => {
                let (time, text) = line.split_once(separator.as_str())?;
                let time = NaiveTime::parse_from_str(time.trim(), time_format).ok()?;
                Some((file_date?.and_time(time), text.trim().to_string()))
            }
            LineFormat::Bracketed { timestamp_format } => {
                let (stamp, text) = line.strip_prefix('[')?.split_once(']')?;
                let value = stamp.split_once('=').map_or(stamp, |(_, v)| v).trim();
                let (ts, _offset) = NaiveDateTime::parse_and_remainder(value, timestamp_format).ok()?;
                Some((ts, text.trim().to_string()))
            }
        }
    }
}

/// Which log file(s) to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "kebab-case")]
pub enum LogLayout {
    /// One file per day; `{date}` in `file_name` is replaced with the
    /// date rendered with `date_format`. Yesterday's and today's are read.
    Daily { file_name: String, date_format: String },

    /// Many files named `<prefix><date>...`; the youngest one is read.
    Newest { prefix: String, date_format: String },
}

/// Does the instrument log an acquisition stop before closing?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StagePolicy {
    /// Close only from `AcquisitionStopped`.
    WithAcquisitionStop,

    /// No stop marker; close straight from `Open`.
    Direct,
}

/// What identifies a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyScheme {
    #[default]
    Timestamp,
    Filename,
}

/// Complete description of one instrument type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentProfile {
    pub name: String,
    pub layout: LogLayout,
    pub line_format: LineFormat,
    pub markers: MarkerTable,
    pub filename: FilenameRule,
    pub stages: StagePolicy,
    #[serde(default)]
    pub key_scheme: KeyScheme,
    pub retention_days: u32,
}

impl InstrumentProfile {
    /// Thermo LTQ Orbitrap Velos: daily `LTQ_YYYYMMDD.LOG`, no stop marker.
    pub fn orbitrap_velos() -> Self {
        Self {
            name: "LTQ Orbitrap Velos".to_string(),
            layout: LogLayout::Daily {
                file_name: "LTQ_{date}.LOG".to_string(),
                date_format: "%Y%m%d".to_string(),
            },
            line_format: LineFormat::TimeOfDay {
                separator: ":  ".to_string(),
                time_format: "%H%M%S".to_string(),
            },
            markers: MarkerTable {
                opened: "Raw file created".to_string(),
                acquisition_stopped: None,
                closed: "Closed raw file".to_string(),
            },
            filename: FilenameRule::AfterDelimiter {
                delimiter: "=".to_string(),
            },
            stages: StagePolicy::Direct,
            key_scheme: KeyScheme::Timestamp,
            retention_days: 5,
        }
    }

    /// Thermo Q Exactive: `Thermo Exactive--YYYY-MM-DD...` files, newest wins.
    pub fn q_exactive() -> Self {
        Self {
            name: "Q Exactive".to_string(),
            layout: LogLayout::Newest {
                prefix: "Thermo Exactive--".to_string(),
                date_format: "%Y-%m-%d".to_string(),
            },
            line_format: LineFormat::Bracketed {
                timestamp_format: "%Y-%m-%d %H:%M:%S%.f".to_string(),
            },
            markers: MarkerTable {
                opened: "Starting acquisition".to_string(),
                acquisition_stopped: Some("Stopping acquisition".to_string()),
                closed: "Storing acquisition scan".to_string(),
            },
            filename: FilenameRule::Between {
                start: "Starting acquisition: Xcalibur will write ".to_string(),
                end: " (and may add date/time to the name)".to_string(),
            },
            stages: StagePolicy::WithAcquisitionStop,
            key_scheme: KeyScheme::Timestamp,
            retention_days: 14,
        }
    }

    /// Parse one raw log line. Lines without a timestamp or a marker are noise.
    pub fn parse_line(&self, line: &str, file_date: Option<NaiveDate>) -> Option<LifecycleEvent> {
        let (ts, text) = self.line_format.parse(line, file_date)?;
        let kind = self.markers.classify(&text)?;
        Some(LifecycleEvent::new(ts, kind, text))
    }

    /// Raw file path carried by an `Opened` event.
    pub fn extract_filename(&self, event: &LifecycleEvent) -> Option<String> {
        self.filename.extract(event.payload())
    }

    pub fn key_for(&self, opened_at: NaiveDateTime, file: &str) -> EntryKey {
        match self.key_scheme {
            KeyScheme::Timestamp => EntryKey::from_timestamp(opened_at),
            KeyScheme::Filename => EntryKey::new(file),
        }
    }
}

/// Built-in instrument types, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instrument {
    OrbitrapVelos,
    QExactive,
}

impl Instrument {
    pub fn profile(self) -> InstrumentProfile {
        match self {
            Instrument::OrbitrapVelos => InstrumentProfile::orbitrap_velos(),
            Instrument::QExactive => InstrumentProfile::q_exactive(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Instrument::OrbitrapVelos => "orbitrap-velos",
            Instrument::QExactive => "q-exactive",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Instrument {
    type Err = FerryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "orbitrap-velos" => Ok(Instrument::OrbitrapVelos),
            "q-exactive" => Ok(Instrument::QExactive),
            other => Err(FerryError::UnknownInstrument(other.to_string())),
        }
    }
}

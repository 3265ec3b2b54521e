//! Queue keys.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Rendering used when an entry is keyed by its open timestamp.
pub const TIMESTAMP_KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Unique identifier of a queue entry.
///
/// Either the raw file's open timestamp or its filename, depending on the
/// instrument's key scheme. Serialized transparently so it can be a JSON
/// object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryKey(String);

impl EntryKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn from_timestamp(ts: NaiveDateTime) -> Self {
        Self(ts.format(TIMESTAMP_KEY_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn timestamp_keys_keep_fractional_seconds() {
        let ts = NaiveDate::from_ymd_opt(2012, 4, 25)
            .unwrap()
            .and_hms_milli_opt(10, 11, 12, 345)
            .unwrap();
        assert_eq!(EntryKey::from_timestamp(ts).as_str(), "2012-04-25 10:11:12.345");
    }

    #[test]
    fn timestamp_keys_sort_chronologically() {
        let d = NaiveDate::from_ymd_opt(2012, 4, 25).unwrap();
        let early = EntryKey::from_timestamp(d.and_hms_opt(9, 0, 0).unwrap());
        let late = EntryKey::from_timestamp(d.and_hms_opt(10, 0, 0).unwrap());
        assert!(early < late);
    }

    #[test]
    fn key_serializes_as_plain_string() {
        let key = EntryKey::new("C:\\data\\a.raw");
        let s = serde_json::to_string(&key).unwrap();
        assert_eq!(s, "\"C:\\\\data\\\\a.raw\"");
    }
}

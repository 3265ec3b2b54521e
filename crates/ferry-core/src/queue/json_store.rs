//! JSON file queue store.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use super::{Queue, QueueStore};
use crate::error::FerryError;

/// Queue persisted as one JSON object in a file.
///
/// - load: missing file → empty queue; unreadable or malformed → fatal.
/// - save: write `<file>.tmp`, fsync, rename over the target. A crash
///   mid-save leaves the previous queue intact.
#[derive(Debug, Clone)]
pub struct JsonQueueStore {
    path: PathBuf,
}

impl JsonQueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_atomic(&self, data: &[u8]) -> io::Result<()> {
        let tmp = self.tmp_path();
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)
    }
}

impl QueueStore for JsonQueueStore {
    fn load(&self) -> Result<Queue, FerryError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no queue file yet; starting with an empty queue");
                return Ok(Queue::new());
            }
            Err(source) => {
                return Err(FerryError::QueueUnreadable {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let queue: Queue =
            serde_json::from_str(&contents).map_err(|source| FerryError::QueueCorrupt {
                path: self.path.clone(),
                source,
            })?;
        info!(path = %self.path.display(), entries = queue.len(), "loaded queue");
        Ok(queue)
    }

    fn save(&self, queue: &Queue) -> Result<(), FerryError> {
        let data = serde_json::to_vec_pretty(queue).map_err(|e| FerryError::QueueUnwritable {
            path: self.path.clone(),
            source: io::Error::other(e),
        })?;
        self.write_atomic(&data)
            .map_err(|source| FerryError::QueueUnwritable {
                path: self.path.clone(),
                source,
            })?;
        info!(path = %self.path.display(), entries = queue.len(), "queue written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntryKey;
    use crate::queue::{QueueEntry, Transition};
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::TempDir;

    fn ts(h: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 2)
            .unwrap()
            .and_hms_milli_opt(h, 0, 0, ms)
            .unwrap()
    }

    fn sample_queue() -> Queue {
        let mut q = Queue::new();
        q.insert_new(EntryKey::from_timestamp(ts(1, 0)), QueueEntry::opened("a.raw", ts(1, 0)));

        let key = EntryKey::from_timestamp(ts(2, 250));
        q.insert_new(key.clone(), QueueEntry::opened("b.raw", ts(2, 250)));
        q.apply(&key, Transition::StopAcquisition).unwrap();
        q.apply(&key, Transition::Close { at: ts(3, 0) }).unwrap();
        q.apply(&key, Transition::Delivered { at: ts(4, 0) }).unwrap();

        let key = EntryKey::new("c.raw");
        q.insert_new(key.clone(), QueueEntry::opened("c.raw", ts(5, 0)));
        q.apply(&key, Transition::Close { at: ts(6, 0) }).unwrap();
        q.apply(&key, Transition::Vanished { at: ts(7, 0) }).unwrap();
        q
    }

    #[test]
    fn missing_file_loads_empty_queue() {
        let dir = TempDir::new().unwrap();
        let store = JsonQueueStore::new(dir.path().join("filequeue.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_is_identity() {
        let dir = TempDir::new().unwrap();
        let store = JsonQueueStore::new(dir.path().join("filequeue.json"));
        let q = sample_queue();

        store.save(&q).unwrap();
        let first = fs::read(store.path()).unwrap();
        let back = store.load().unwrap();
        assert_eq!(back, q);

        store.save(&back).unwrap();
        assert_eq!(fs::read(store.path()).unwrap(), first);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn invalid_json_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("filequeue.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonQueueStore::new(&path).load().unwrap_err();
        assert!(matches!(err, FerryError::QueueCorrupt { .. }));
    }

    #[test]
    fn wrong_shape_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("filequeue.json");
        fs::write(&path, r#"{"k": {"file": "a.raw", "status": "lost"}}"#).unwrap();

        let err = JsonQueueStore::new(&path).load().unwrap_err();
        assert!(matches!(err, FerryError::QueueCorrupt { .. }));
    }

    #[test]
    fn reads_hand_written_queue_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("filequeue.json");
        fs::write(
            &path,
            r#"{
              "2024-06-02 01:00:00": {
                "file": "C:\\data\\a.raw",
                "status": "acquisition stop",
                "opened": "2024-06-02T01:00:00"
              }
            }"#,
        )
        .unwrap();

        let q = JsonQueueStore::new(&path).load().unwrap();
        let e = q.get(&EntryKey::new("2024-06-02 01:00:00")).unwrap();
        assert_eq!(e.file_path(), "C:\\data\\a.raw");
        assert_eq!(e.status(), crate::queue::EntryStatus::AcquisitionStopped);
    }

    #[test]
    fn unwritable_location_is_fatal() {
        let dir = TempDir::new().unwrap();
        let store = JsonQueueStore::new(dir.path().join("no-such-dir").join("filequeue.json"));
        let err = store.save(&sample_queue()).unwrap_err();
        assert!(matches!(err, FerryError::QueueUnwritable { .. }));
    }
}

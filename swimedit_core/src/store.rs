//! Snapshot persistence with file locking.
//!
//! An editing session keeps two snapshots: the workout as imported and the
//! workout after the latest edit. Stores only see JSON values; decoding into
//! a [`crate::Workout`] happens in the editing session.

use crate::{Error, Result};
use fs2::FileExt;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Which snapshot to read or write
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SnapshotKey {
    Original,
    Current,
}

impl SnapshotKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKey::Original => "original",
            SnapshotKey::Current => "current",
        }
    }
}

/// Key-value storage for workout snapshots
pub trait SnapshotStore {
    /// Read a snapshot; `None` when it was never written or cannot be read
    fn get(&self, key: SnapshotKey) -> Option<Value>;

    /// Replace a snapshot wholesale
    fn set(&mut self, key: SnapshotKey, value: &Value) -> Result<()>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<SnapshotKey, Value>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail with `StorageUnavailable`
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: SnapshotKey) -> Option<Value> {
        self.entries.get(&key).cloned()
    }

    fn set(&mut self, key: SnapshotKey, value: &Value) -> Result<()> {
        if self.fail_writes {
            return Err(Error::StorageUnavailable(format!(
                "memory store is read-only, cannot write {}",
                key.as_str()
            )));
        }
        self.entries.insert(key, value.clone());
        Ok(())
    }
}

/// One JSON file per snapshot in a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: SnapshotKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }

    /// Path of the edit journal kept next to the snapshots
    pub fn journal_path(&self) -> PathBuf {
        self.dir.join("edits.jsonl")
    }

    fn read(path: &Path) -> Option<Value> {
        if !path.exists() {
            return None;
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open snapshot {:?}: {}", path, e);
                return None;
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock snapshot {:?}: {}", path, e);
            return None;
        }

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        let _ = file.unlock();
        if let Err(e) = read {
            tracing::warn!("Failed to read snapshot {:?}: {}", path, e);
            return None;
        }

        match serde_json::from_str::<Value>(&contents) {
            Ok(value) => {
                tracing::debug!("Loaded snapshot from {:?}", path);
                Some(value)
            }
            Err(e) => {
                tracing::warn!("Failed to parse snapshot {:?}: {}", path, e);
                None
            }
        }
    }

    /// Write to a temp file in the same directory, sync, then rename over
    fn write(&self, path: &Path, value: &Value) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let temp = NamedTempFile::new_in(&self.dir)?;

        // Exclusive lock on the temp file serializes concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, value)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved snapshot to {:?}", path);
        Ok(())
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: SnapshotKey) -> Option<Value> {
        Self::read(&self.path_for(key))
    }

    fn set(&mut self, key: SnapshotKey, value: &Value) -> Result<()> {
        let path = self.path_for(key);
        self.write(&path, value)
            .map_err(|e| Error::StorageUnavailable(format!("{:?}: {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.get(SnapshotKey::Current).is_none());

        store.set(SnapshotKey::Current, &json!({"a": 1})).unwrap();
        assert_eq!(store.get(SnapshotKey::Current), Some(json!({"a": 1})));
        assert!(store.get(SnapshotKey::Original).is_none());
    }

    #[test]
    fn test_memory_store_failing_writes() {
        let mut store = MemoryStore::new();
        store.set_fail_writes(true);
        let err = store.set(SnapshotKey::Original, &json!({})).unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
        assert!(store.get(SnapshotKey::Original).is_none());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path().join("data"));

        store.set(SnapshotKey::Original, &json!({"lengthMesgs": []})).unwrap();
        store.set(SnapshotKey::Current, &json!({"lengthMesgs": [1]})).unwrap();

        assert_eq!(store.get(SnapshotKey::Original), Some(json!({"lengthMesgs": []})));
        assert_eq!(store.get(SnapshotKey::Current), Some(json!({"lengthMesgs": [1]})));
        assert!(store.path_for(SnapshotKey::Current).ends_with("current.json"));
    }

    #[test]
    fn test_file_store_missing_and_corrupt_read_as_absent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());
        assert!(store.get(SnapshotKey::Current).is_none());

        std::fs::write(store.path_for(SnapshotKey::Current), "{ invalid json }").unwrap();
        assert!(store.get(SnapshotKey::Current).is_none());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());
        store.set(SnapshotKey::Current, &json!({"x": true})).unwrap();
        store.set(SnapshotKey::Current, &json!({"x": false})).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "current.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only current.json, found extras: {:?}",
            extras
        );
    }

    #[test]
    fn test_file_store_unwritable_dir_is_storage_unavailable() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut store = FileStore::new(blocker.join("data"));
        let err = store.set(SnapshotKey::Current, &json!({})).unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
    }
}

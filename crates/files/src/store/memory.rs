use super::{DestinationStore, EntryStat};
use crate::{FilesError, FilesResult};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
struct MemoryEntry {
    bytes: Vec<u8>,
    modified: DateTime<Utc>,
}

/// A destination held entirely in memory.
///
/// Useful for exercising the engine without a filesystem. `discard_writes` makes every
/// write report success without storing anything, which is how a lost write looks to
/// the engine.
#[derive(Debug)]
pub struct MemoryStore {
    location: PathBuf,
    entries: Mutex<BTreeMap<String, MemoryEntry>>,
    discard_writes: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            location: PathBuf::from("/memory"),
            entries: Mutex::new(BTreeMap::new()),
            discard_writes: false,
        }
    }

    /// A store whose writes succeed but leave nothing behind.
    pub fn discarding_writes() -> Self {
        Self {
            discard_writes: true,
            ..Self::new()
        }
    }

    /// Seeds an entry directly, replacing any existing one.
    pub fn insert(&self, name: &str, bytes: Vec<u8>) {
        self.entries().insert(
            name.to_owned(),
            MemoryEntry {
                bytes,
                modified: Utc::now(),
            },
        );
    }

    /// Stored bytes for `name`, if any.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.entries().get(name).map(|entry| entry.bytes.clone())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, MemoryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store_new(&self, name: &str, bytes: Vec<u8>) -> FilesResult<()> {
        let mut entries = self.entries();
        if entries.contains_key(name) {
            return Err(FilesError::TargetTaken(name.to_owned()));
        }
        if !self.discard_writes {
            entries.insert(
                name.to_owned(),
                MemoryEntry {
                    bytes,
                    modified: Utc::now(),
                },
            );
        }
        Ok(())
    }

    fn not_found(name: &str) -> FilesError {
        FilesError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("No stored entry named {}", name),
        ))
    }
}

impl DestinationStore for MemoryStore {
    fn location(&self) -> &Path {
        &self.location
    }

    fn ensure_exists(&self) -> FilesResult<()> {
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.entries().contains_key(name)
    }

    fn list(&self) -> FilesResult<Vec<String>> {
        Ok(self.entries().keys().cloned().collect())
    }

    fn open(&self, name: &str) -> FilesResult<Box<dyn Read + '_>> {
        let bytes = self.get(name).ok_or_else(|| Self::not_found(name))?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn write_from_path(&self, source: &Path, name: &str) -> FilesResult<()> {
        let bytes = fs::read(source).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FilesError::SourceNotFound(source.to_path_buf()),
            _ => FilesError::Io(e),
        })?;
        self.store_new(name, bytes)
    }

    fn write_from_buffer(&self, bytes: &[u8], name: &str) -> FilesResult<()> {
        self.store_new(name, bytes.to_vec())
    }

    fn stat(&self, name: &str) -> FilesResult<EntryStat> {
        self.entries()
            .get(name)
            .map(|entry| EntryStat {
                size: entry.bytes.len() as u64,
                modified: Some(entry.modified),
            })
            .ok_or_else(|| Self::not_found(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_back() {
        let store = MemoryStore::new();
        store.write_from_buffer(b"abc", "a.txt").unwrap();

        assert!(store.exists("a.txt"));
        assert_eq!(store.get("a.txt").unwrap(), b"abc");
        assert_eq!(store.stat("a.txt").unwrap().size, 3);
        assert_eq!(store.path_of("a.txt"), PathBuf::from("/memory/a.txt"));
    }

    #[test]
    fn test_exclusive_create() {
        let store = MemoryStore::new();
        store.insert("a.txt", b"old".to_vec());

        let result = store.write_from_buffer(b"new", "a.txt");
        assert!(matches!(result, Err(FilesError::TargetTaken(_))));
        assert_eq!(store.get("a.txt").unwrap(), b"old");
    }

    #[test]
    fn test_discarding_writes_leave_nothing() {
        let store = MemoryStore::discarding_writes();
        store.write_from_buffer(b"abc", "a.txt").unwrap();

        assert!(!store.exists("a.txt"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_is_sorted() {
        let store = MemoryStore::new();
        store.insert("b", vec![]);
        store.insert("a", vec![]);
        assert_eq!(store.list().unwrap(), vec!["a", "b"]);
    }
}

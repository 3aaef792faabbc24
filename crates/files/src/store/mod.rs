//! Destination store capability.
//!
//! The ingestion engine never touches the managed directory directly. It goes through
//! [`DestinationStore`], which is implemented for the real filesystem ([`FsStore`]) and
//! for an in-memory map ([`MemoryStore`]).
//!
//! Entries are addressed by flat names inside the store's location. Writes use
//! exclusive-create semantics: writing to a name that already exists fails with
//! [`FilesError::TargetTaken`](crate::FilesError::TargetTaken) instead of overwriting.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use crate::FilesResult;
use chrono::{DateTime, Utc};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Size and modification time of a stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStat {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// The managed directory files are ingested into.
pub trait DestinationStore: Send + Sync {
    /// Directory that stored names are relative to.
    fn location(&self) -> &Path;

    /// Creates the destination if it does not exist yet. Idempotent.
    fn ensure_exists(&self) -> FilesResult<()>;

    /// Returns true if an entry called `name` exists.
    fn exists(&self, name: &str) -> bool;

    /// Names of the regular files currently stored, in ascending order.
    fn list(&self) -> FilesResult<Vec<String>>;

    /// Opens a stored entry for reading.
    fn open(&self, name: &str) -> FilesResult<Box<dyn Read + '_>>;

    /// Copies the file at `source` byte-for-byte into a new entry called `name`.
    fn write_from_path(&self, source: &Path, name: &str) -> FilesResult<()>;

    /// Writes `bytes` into a new entry called `name`.
    fn write_from_buffer(&self, bytes: &[u8], name: &str) -> FilesResult<()>;

    fn stat(&self, name: &str) -> FilesResult<EntryStat>;

    /// Full path an entry called `name` lives at.
    fn path_of(&self, name: &str) -> PathBuf {
        self.location().join(name)
    }
}

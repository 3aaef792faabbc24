//! filedock ingestion core
//!
//! This crate copies batches of client-submitted files into a single managed destination
//! directory while detecting byte-identical duplicates and resolving filename collisions.
//!
//! ## Design Principles
//!
//! - Content equality alone decides what a duplicate is (see [`hasher`])
//! - Existing entries are never overwritten; new names are derived instead (see [`names`])
//! - The destination is reached only through the [`DestinationStore`] capability, so an
//!   in-memory store can stand in for the filesystem
//! - One file's failure never aborts the batch; every descriptor gets exactly one result
//!
//! ## Components
//!
//! ```text
//! FileDescriptor ──► IngestionEngine ──► UploadResult (+ BatchSummary)
//!                     │   │    │
//!                     │   │    └── DestinationStore (exists / list / write / stat)
//!                     │   └─────── names (validate / sanitize / resolve_unique)
//!                     └─────────── hasher (MD5 over a path, a buffer or a stored entry)
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use filedock_files::{FileDescriptor, FsStore, IngestionEngine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = IngestionEngine::new(FsStore::new("uploads"));
//! let descriptor = FileDescriptor::from_buffer("1", "notes.txt", b"hello".to_vec());
//!
//! let outcome = engine.ingest_batch(vec![descriptor])?;
//! assert_eq!(outcome.summary.total, 1);
//! # Ok(())
//! # }
//! ```

pub mod folder;
pub mod hasher;
pub mod ingest;
pub mod media;
pub mod model;
pub mod names;
pub mod store;

use std::path::PathBuf;

pub use folder::list_folder;
pub use hasher::ContentDigest;
pub use ingest::{BatchOutcome, IngestionEngine, StoredFileStat, UploadStats};
pub use model::{BatchSummary, FileDescriptor, FileSource, UploadResult, UploadStatus};
pub use store::{DestinationStore, EntryStat, FsStore, MemoryStore};

/// Errors that can occur while ingesting or inspecting files
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// The descriptor's source file is missing
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The source could not be read while computing its digest
    #[error("Failed to hash {}: {source}", path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A filename contains characters or components that are not allowed
    #[error("Invalid file name: {0}")]
    NameInvalid(String),

    /// The write returned but the target does not exist afterwards
    #[error("File write verification failed: {0}")]
    WriteVerificationFailed(String),

    /// Another writer created the resolved target name first
    #[error("Target name already taken: {0}")]
    TargetTaken(String),

    /// A listed folder path exists but is not a directory
    #[error("Path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The destination directory cannot be created or accessed
    #[error("Destination directory unavailable ({}): {source}", path.display())]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ingestion operations.
pub type FilesResult<T> = Result<T, FilesError>;

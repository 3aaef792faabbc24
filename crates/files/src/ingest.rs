//! Batch ingestion engine.
//!
//! [`IngestionEngine::ingest_batch`] processes descriptors strictly in submission order.
//! For each one it:
//!
//! 1. derives the target name (requested name, sanitised, extension restored)
//! 2. hashes the source and scans every stored entry for identical content
//! 3. resolves a collision-free name against the current destination contents
//! 4. writes the bytes with exclusive-create semantics
//! 5. checks the entry exists afterwards, then stats it
//!
//! Any error in those steps becomes a `failed` result for that descriptor only. The
//! only batch-level failure is a destination that cannot be created.
//!
//! Nothing is cached between checks: every duplicate scan re-hashes the destination, so
//! files written earlier in the same batch are seen by later descriptors.

use crate::hasher::{self, ContentDigest};
use crate::model::{BatchSummary, FileDescriptor, FileSource, PendingUpload, UploadResult};
use crate::names;
use crate::store::DestinationStore;
use crate::{FilesError, FilesResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Results of one batch, in submission order, with their tally.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub summary: BatchSummary,
    pub results: Vec<UploadResult>,
}

/// One regular file in the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFileStat {
    pub name: String,
    pub size: u64,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Totals over the destination's top-level files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStats {
    pub total_files: usize,
    pub total_size: u64,
    pub files: Vec<StoredFileStat>,
}

/// How a descriptor was placed, before it is turned into a result.
enum Placement {
    Stored {
        name: String,
        path: PathBuf,
        size: u64,
    },
    Duplicate {
        message: String,
        existing_path: PathBuf,
    },
}

/// Copies batches of files into a [`DestinationStore`].
#[derive(Debug)]
pub struct IngestionEngine<S> {
    store: S,
}

impl<S: DestinationStore> IngestionEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ingests every descriptor and reports one result per descriptor, in order.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::DestinationUnavailable`] (or another store error) only when the
    /// destination cannot be prepared. Per-file problems never surface here.
    pub fn ingest_batch(&self, descriptors: Vec<FileDescriptor>) -> FilesResult<BatchOutcome> {
        self.store.ensure_exists().map_err(|e| {
            tracing::error!("destination {} unavailable: {}", self.store.location().display(), e);
            e
        })?;

        tracing::info!(
            files = descriptors.len(),
            destination = %self.store.location().display(),
            "starting batch ingestion"
        );

        let results: Vec<UploadResult> = descriptors
            .into_iter()
            .map(|descriptor| self.ingest_one(descriptor))
            .collect();
        let summary = BatchSummary::from_results(&results);

        tracing::info!(
            total = summary.total,
            done = summary.done,
            failed = summary.failed,
            duplicate = summary.duplicate,
            "batch ingestion finished"
        );

        Ok(BatchOutcome { summary, results })
    }

    fn ingest_one(&self, descriptor: FileDescriptor) -> UploadResult {
        let pending = PendingUpload::new(&descriptor);

        let result = match self.place(&descriptor) {
            Ok(Placement::Stored { name, path, size }) => pending.done(
                name,
                path,
                size,
                descriptor.extension().map(str::to_owned),
            ),
            Ok(Placement::Duplicate {
                message,
                existing_path,
            }) => pending.duplicate(message, existing_path),
            Err(e) => {
                tracing::warn!(
                    id = descriptor.id(),
                    "ingesting {} failed: {}",
                    descriptor.original_name(),
                    e
                );
                pending.failed(e.to_string())
            }
        };

        tracing::debug!(
            id = result.id(),
            name = result.new_name(),
            status = %result.status(),
            "file processed"
        );
        result
    }

    fn place(&self, descriptor: &FileDescriptor) -> FilesResult<Placement> {
        if let FileSource::Path(path) = descriptor.source() {
            if !path.exists() {
                return Err(FilesError::SourceNotFound(path.clone()));
            }
        }

        let target =
            names::prepare_target_name(descriptor.requested_name(), descriptor.extension());
        names::check_flat(&target)?;

        let digest = hasher::hash_source(descriptor.source())?;
        if let Some(existing) = self.find_duplicate(&digest)? {
            return Ok(Placement::Duplicate {
                message: format!("Duplicate of \"{}\" already exists as: {}", target, existing),
                existing_path: self.store.path_of(&existing),
            });
        }

        let final_name = names::resolve_unique(&target, &self.store);
        match descriptor.source() {
            FileSource::Path(path) => self.store.write_from_path(path, &final_name)?,
            FileSource::Buffer(bytes) => self.store.write_from_buffer(bytes, &final_name)?,
        }

        if !self.store.exists(&final_name) {
            return Err(FilesError::WriteVerificationFailed(final_name));
        }

        let stat = self.store.stat(&final_name)?;
        Ok(Placement::Stored {
            path: self.store.path_of(&final_name),
            name: final_name,
            size: stat.size,
        })
    }

    /// Returns the first stored entry whose content hashes to `digest`.
    ///
    /// Entries that cannot be read are skipped.
    pub fn find_duplicate(&self, digest: &ContentDigest) -> FilesResult<Option<String>> {
        for name in self.store.list()? {
            let existing = self
                .store
                .open(&name)
                .and_then(|reader| hasher::hash_reader(reader).map_err(FilesError::Io));

            match existing {
                Ok(existing) if existing == *digest => return Ok(Some(name)),
                Ok(_) => {}
                Err(e) => tracing::warn!("skipping unreadable stored file {}: {}", name, e),
            }
        }
        Ok(None)
    }

    /// Counts and sizes the destination's top-level files.
    ///
    /// # Errors
    ///
    /// Returns a store error if the destination cannot be listed.
    pub fn stats(&self) -> FilesResult<UploadStats> {
        let mut stats = UploadStats::default();

        for name in self.store.list()? {
            let entry = match self.store.stat(&name) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping {} in stats: {}", name, e);
                    continue;
                }
            };

            stats.total_size += entry.size;
            stats.files.push(StoredFileStat {
                name,
                size: entry.size,
                uploaded_at: entry.modified,
            });
        }

        stats.total_files = stats.files.len();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UploadStatus;
    use crate::store::{FsStore, MemoryStore};
    use std::fs;
    use tempfile::TempDir;

    fn buffer(id: &str, name: &str, content: &str) -> FileDescriptor {
        FileDescriptor::from_buffer(id, name, content.as_bytes().to_vec())
    }

    fn assert_summary_consistent(outcome: &BatchOutcome) {
        let s = outcome.summary;
        assert_eq!(s.total, s.done + s.failed + s.duplicate + s.pending);
        assert_eq!(s.total, outcome.results.len());
        assert_eq!(s.pending, 0);
    }

    #[test]
    fn test_identical_content_in_one_batch_is_duplicate() {
        let engine = IngestionEngine::new(MemoryStore::new());

        let outcome = engine
            .ingest_batch(vec![buffer("1", "a.txt", "hello"), buffer("2", "b.txt", "hello")])
            .unwrap();

        let a = &outcome.results[0];
        let b = &outcome.results[1];
        assert_eq!(a.status(), UploadStatus::Done);
        assert_eq!(a.new_name(), "a.txt");
        assert_eq!(b.status(), UploadStatus::Duplicate);
        assert!(b.error().unwrap().contains("a.txt"));
        assert_eq!(b.final_path(), Some(PathBuf::from("/memory/a.txt").as_path()));
        assert!(!engine.store().exists("b.txt"));
        assert_summary_consistent(&outcome);
    }

    #[test]
    fn test_duplicate_detected_across_batches_and_sources() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source.txt");
        fs::write(&source, "same bytes").unwrap();
        let engine = IngestionEngine::new(FsStore::new(temp.path().join("uploads")));

        engine
            .ingest_batch(vec![FileDescriptor::from_path("1", "first.txt", &source)])
            .unwrap();
        let outcome = engine
            .ingest_batch(vec![buffer("2", "second.txt", "same bytes")])
            .unwrap();

        assert_eq!(outcome.results[0].status(), UploadStatus::Duplicate);
        assert!(outcome.results[0].error().unwrap().contains("first.txt"));
        assert_eq!(outcome.summary.duplicate, 1);
    }

    #[test]
    fn test_name_collision_gets_timestamp_suffix() {
        let temp = TempDir::new().unwrap();
        let uploads = temp.path().join("uploads");
        fs::create_dir_all(&uploads).unwrap();
        fs::write(uploads.join("a.txt"), "original").unwrap();
        let engine = IngestionEngine::new(FsStore::new(&uploads));

        let first = engine
            .ingest_batch(vec![buffer("1", "a.txt", "second version")])
            .unwrap();
        let second = engine
            .ingest_batch(vec![buffer("2", "a.txt", "third version")])
            .unwrap();

        for outcome in [&first, &second] {
            let result = &outcome.results[0];
            assert_eq!(result.status(), UploadStatus::Done);
            let (base, ext) = names::split_extension(result.new_name());
            assert_eq!(ext, ".txt");
            let suffix = base.strip_prefix("a_").unwrap();
            assert!(suffix.split('_').all(|part| part.chars().all(|c| c.is_ascii_digit())));
        }
        assert_ne!(first.results[0].new_name(), second.results[0].new_name());
        assert_eq!(fs::read_to_string(uploads.join("a.txt")).unwrap(), "original");
        assert_eq!(
            fs::read_to_string(first.results[0].final_path().unwrap()).unwrap(),
            "second version"
        );
    }

    #[test]
    fn test_missing_source_fails_without_stopping_batch() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("present.txt");
        fs::write(&present, "here").unwrap();
        let engine = IngestionEngine::new(FsStore::new(temp.path().join("uploads")));

        let outcome = engine
            .ingest_batch(vec![
                FileDescriptor::from_path("1", "gone.txt", temp.path().join("gone.txt")),
                FileDescriptor::from_path("2", "present.txt", &present),
            ])
            .unwrap();

        let missing = &outcome.results[0];
        assert_eq!(missing.status(), UploadStatus::Failed);
        assert!(missing.error().unwrap().contains("Source file not found"));
        assert_eq!(outcome.results[1].status(), UploadStatus::Done);
        assert_eq!(outcome.summary.failed, 1);
        assert_eq!(outcome.summary.done, 1);
        assert_summary_consistent(&outcome);
    }

    #[test]
    fn test_empty_batch() {
        let engine = IngestionEngine::new(MemoryStore::new());
        let outcome = engine.ingest_batch(Vec::new()).unwrap();

        assert_eq!(outcome.summary, BatchSummary::default());
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_results_preserve_submission_order() {
        let engine = IngestionEngine::new(MemoryStore::new());
        let descriptors = (0..5)
            .map(|i| buffer(&i.to_string(), &format!("f{}.txt", i), &format!("content {}", i)))
            .collect();

        let outcome = engine.ingest_batch(descriptors).unwrap();

        let ids: Vec<&str> = outcome.results.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4"]);
        assert_eq!(outcome.summary.done, 5);
    }

    #[test]
    fn test_lost_write_is_reported_as_failed() {
        let engine = IngestionEngine::new(MemoryStore::discarding_writes());

        let outcome = engine
            .ingest_batch(vec![buffer("1", "a.txt", "vanishes")])
            .unwrap();

        let result = &outcome.results[0];
        assert_eq!(result.status(), UploadStatus::Failed);
        assert!(result.error().unwrap().contains("verification failed"));
        assert_eq!(result.final_path(), None);
    }

    #[test]
    fn test_unavailable_destination_fails_the_batch() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("uploads");
        fs::write(&blocker, "a file, not a directory").unwrap();
        let engine = IngestionEngine::new(FsStore::new(&blocker));

        let result = engine.ingest_batch(vec![buffer("1", "a.txt", "x")]);
        assert!(matches!(result, Err(FilesError::DestinationUnavailable { .. })));
    }

    #[test]
    fn test_requested_name_is_sanitised_and_keeps_extension() {
        let engine = IngestionEngine::new(MemoryStore::new());
        let descriptor = buffer("1", "photo.jpg", "pixels").with_new_name("summer: day?");

        let outcome = engine.ingest_batch(vec![descriptor]).unwrap();

        let result = &outcome.results[0];
        assert_eq!(result.status(), UploadStatus::Done);
        assert_eq!(result.new_name(), "summer_ day_.jpg");
        assert_eq!(result.original_name(), "photo.jpg");
        assert_eq!(result.extension(), Some("jpg"));
        assert_eq!(result.size(), Some(6));
        assert!(engine.store().exists("summer_ day_.jpg"));
    }

    #[test]
    fn test_path_components_in_names_are_rejected() {
        let engine = IngestionEngine::new(MemoryStore::new());
        let descriptor = buffer("1", "a.txt", "x").with_new_name("../escape.txt");

        let outcome = engine.ingest_batch(vec![descriptor]).unwrap();

        assert_eq!(outcome.results[0].status(), UploadStatus::Failed);
        assert!(engine.store().is_empty());
    }

    #[test]
    fn test_path_source_is_copied() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("report.bin");
        let content: Vec<u8> = (0..=255).collect();
        fs::write(&source, &content).unwrap();
        let engine = IngestionEngine::new(FsStore::new(temp.path().join("uploads")));

        let outcome = engine
            .ingest_batch(vec![FileDescriptor::from_path("1", "report.bin", &source)])
            .unwrap();

        let result = &outcome.results[0];
        assert_eq!(result.status(), UploadStatus::Done);
        assert_eq!(result.size(), Some(256));
        assert_eq!(fs::read(result.final_path().unwrap()).unwrap(), content);
        assert!(source.exists());
    }

    #[test]
    fn test_stats_cover_top_level_files() {
        let engine = IngestionEngine::new(MemoryStore::new());
        engine
            .ingest_batch(vec![buffer("1", "a.txt", "abc"), buffer("2", "b.txt", "de")])
            .unwrap();

        let stats = engine.stats().unwrap();
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size, 5);
        assert_eq!(stats.files[0].name, "a.txt");
        assert!(stats.files[0].uploaded_at.is_some());
    }

    #[test]
    fn test_hostile_extension_hint_never_reaches_stored_name() {
        let engine = IngestionEngine::new(MemoryStore::new());
        let descriptors = vec![
            buffer("1", "a.bin", "one")
                .with_new_name("report")
                .with_extension("p?n:g"),
            buffer("2", "a.t\nxt", "two").with_new_name("b"),
        ];

        let outcome = engine.ingest_batch(descriptors).unwrap();

        assert_eq!(outcome.results[0].status(), UploadStatus::Done);
        assert_eq!(outcome.results[0].new_name(), "report.p_n_g");
        assert_eq!(outcome.results[1].status(), UploadStatus::Done);
        assert_eq!(outcome.results[1].new_name(), "b.t_xt");
        for result in &outcome.results {
            assert!(names::validate(result.new_name()));
            assert!(engine.store().exists(result.new_name()));
        }
    }

    /// Reports every name as free, so the write is the first to see a taken name.
    struct RacingStore(MemoryStore);

    impl DestinationStore for RacingStore {
        fn location(&self) -> &std::path::Path {
            self.0.location()
        }

        fn ensure_exists(&self) -> FilesResult<()> {
            self.0.ensure_exists()
        }

        fn exists(&self, _name: &str) -> bool {
            false
        }

        fn list(&self) -> FilesResult<Vec<String>> {
            self.0.list()
        }

        fn open(&self, name: &str) -> FilesResult<Box<dyn std::io::Read + '_>> {
            self.0.open(name)
        }

        fn write_from_path(&self, source: &std::path::Path, name: &str) -> FilesResult<()> {
            self.0.write_from_path(source, name)
        }

        fn write_from_buffer(&self, bytes: &[u8], name: &str) -> FilesResult<()> {
            self.0.write_from_buffer(bytes, name)
        }

        fn stat(&self, name: &str) -> FilesResult<crate::store::EntryStat> {
            self.0.stat(name)
        }
    }

    #[test]
    fn test_lost_create_race_fails_without_overwriting() {
        let inner = MemoryStore::new();
        inner.insert("a.txt", b"written by someone else".to_vec());
        let engine = IngestionEngine::new(RacingStore(inner));

        let outcome = engine
            .ingest_batch(vec![buffer("1", "a.txt", "our bytes")])
            .unwrap();

        let result = &outcome.results[0];
        assert_eq!(result.status(), UploadStatus::Failed);
        assert!(result.error().unwrap().contains("already taken"));
        assert_eq!(result.final_path(), None);
        assert_eq!(
            engine.store().0.get("a.txt").unwrap(),
            b"written by someone else"
        );
        assert_eq!(outcome.summary.failed, 1);
        assert_summary_consistent(&outcome);
    }

    #[test]
    fn test_find_duplicate_skips_nothing_when_empty() {
        let engine = IngestionEngine::new(MemoryStore::new());
        let digest = hasher::hash_buffer(b"x");
        assert_eq!(engine.find_duplicate(&digest).unwrap(), None);
    }
}

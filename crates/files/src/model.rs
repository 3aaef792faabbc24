//! Descriptors submitted for ingestion and the results reported back.
//!
//! A [`FileDescriptor`] owns its [`FileSource`]; once the descriptor is handed to the
//! engine the source cannot change. Results move through a single transition:
//! a [`PendingUpload`] is consumed by exactly one of [`PendingUpload::done`],
//! [`PendingUpload::failed`] or [`PendingUpload::duplicate`], and the produced
//! [`UploadResult`] exposes no mutators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a descriptor's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// A readable file on the local filesystem
    Path(PathBuf),

    /// Bytes already held in memory (multipart uploads)
    Buffer(Vec<u8>),
}

/// One file submitted for ingestion.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    id: String,
    original_name: String,
    new_name: Option<String>,
    extension: Option<String>,
    size: u64,
    media_type: Option<String>,
    created_at: Option<DateTime<Utc>>,
    modified_at: Option<DateTime<Utc>>,
    source: FileSource,
}

impl FileDescriptor {
    /// Describes a file whose bytes are read from `path`.
    pub fn from_path(
        id: impl Into<String>,
        original_name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::with_source(id.into(), original_name.into(), FileSource::Path(path.into()))
    }

    /// Describes a file whose bytes are held in memory.
    pub fn from_buffer(
        id: impl Into<String>,
        original_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        let size = bytes.len() as u64;
        let mut descriptor =
            Self::with_source(id.into(), original_name.into(), FileSource::Buffer(bytes));
        descriptor.size = size;
        descriptor
    }

    fn with_source(id: String, original_name: String, source: FileSource) -> Self {
        let extension = Path::new(&original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_owned);

        Self {
            id,
            original_name,
            new_name: None,
            extension,
            size: 0,
            media_type: None,
            created_at: None,
            modified_at: None,
            source,
        }
    }

    /// Requests a different stored name. Blank names are ignored.
    #[must_use]
    pub fn with_new_name(mut self, new_name: impl Into<String>) -> Self {
        let new_name = new_name.into();
        self.new_name = if new_name.trim().is_empty() {
            None
        } else {
            Some(new_name)
        };
        self
    }

    /// Overrides the extension hint. A leading dot is accepted and dropped.
    #[must_use]
    pub fn with_extension(mut self, extension: impl AsRef<str>) -> Self {
        let trimmed = extension.as_ref().trim().trim_start_matches('.');
        self.extension = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        };
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    #[must_use]
    pub fn with_timestamps(
        mut self,
        created_at: Option<DateTime<Utc>>,
        modified_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_at = created_at;
        self.modified_at = modified_at;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn new_name(&self) -> Option<&str> {
        self.new_name.as_deref()
    }

    /// Extension hint without the leading dot.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified_at
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// The name the client asked for: the requested new name, else the original name.
    pub fn requested_name(&self) -> &str {
        self.new_name.as_deref().unwrap_or(&self.original_name)
    }
}

/// Lifecycle state of one file in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Done,
    Failed,
    Duplicate,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Done => "done",
            UploadStatus::Failed => "failed",
            UploadStatus::Duplicate => "duplicate",
        };
        f.write_str(label)
    }
}

/// Outcome for a single descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    id: String,
    original_name: String,
    new_name: String,
    status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extension: Option<String>,
}

impl UploadResult {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn new_name(&self) -> &str {
        &self.new_name
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn final_path(&self) -> Option<&Path> {
        self.final_path.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }
}

/// A result that has not reached a terminal status yet.
#[derive(Debug)]
pub struct PendingUpload {
    inner: UploadResult,
}

impl PendingUpload {
    pub fn new(descriptor: &FileDescriptor) -> Self {
        Self {
            inner: UploadResult {
                id: descriptor.id().to_owned(),
                original_name: descriptor.original_name().to_owned(),
                new_name: descriptor.requested_name().to_owned(),
                status: UploadStatus::Pending,
                final_path: None,
                error: None,
                size: None,
                extension: None,
            },
        }
    }

    /// A read-only view of the result while it is still pending.
    pub fn snapshot(&self) -> UploadResult {
        self.inner.clone()
    }

    pub fn done(
        mut self,
        stored_name: String,
        final_path: PathBuf,
        size: u64,
        extension: Option<String>,
    ) -> UploadResult {
        self.inner.status = UploadStatus::Done;
        self.inner.new_name = stored_name;
        self.inner.final_path = Some(final_path);
        self.inner.size = Some(size);
        self.inner.extension = extension;
        self.inner
    }

    pub fn failed(mut self, message: impl Into<String>) -> UploadResult {
        self.inner.status = UploadStatus::Failed;
        self.inner.error = Some(message.into());
        self.inner
    }

    pub fn duplicate(mut self, message: impl Into<String>, existing_path: PathBuf) -> UploadResult {
        self.inner.status = UploadStatus::Duplicate;
        self.inner.error = Some(message.into());
        self.inner.final_path = Some(existing_path);
        self.inner
    }
}

/// Per-status counts for a completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub done: usize,
    pub failed: usize,
    pub duplicate: usize,
    pub pending: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[UploadResult]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut summary, result| {
                summary.total += 1;
                match result.status() {
                    UploadStatus::Pending => summary.pending += 1,
                    UploadStatus::Done => summary.done += 1,
                    UploadStatus::Failed => summary.failed += 1,
                    UploadStatus::Duplicate => summary.duplicate += 1,
                }
                summary
            })
    }
}
